//! Server configuration read from the environment (and `.env` via dotenvy).
//!
//! | Env Var                   | Default                    |
//! |---------------------------|----------------------------|
//! | `HOST`                    | `0.0.0.0`                  |
//! | `PORT`                    | `5000`                     |
//! | `CORS_ORIGINS`            | `http://localhost:5173`    |
//! | `REQUEST_TIMEOUT_SECS`    | `30`                       |
//! | `UPLOAD_DIR`              | `./uploads`                |
//! | `MAX_FILE_SIZE`           | `52428800` (50 MiB)        |
//! | `LOG_FORMAT`              | `pretty` (or `json`)       |
//! | `JWT_SECRET`              | required                   |
//! | `JWT_ACCESS_EXPIRY_MINS`  | `60`                       |
//! | `JWT_REFRESH_EXPIRY_DAYS` | `7`                        |
//! | `ADMIN_EMAIL`             | unset (no bootstrap admin) |
//! | `ADMIN_PASSWORD`          | unset (no bootstrap admin) |
//! | `ADMIN_NAME`              | `Administrator`            |
//!
//! Invalid values panic at startup.

use std::fmt::Display;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Root of the on-disk asset store; files go under `project_<id>/`.
    pub upload_dir: PathBuf,
    /// Request body limit, which caps upload size.
    pub max_file_size: usize,
    pub log_format: LogFormat,
    /// Admin account created on startup when the users table is empty.
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub jwt: JwtConfig,
}

/// Signing secret and token lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

/// Credentials for the first admin account.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl ServerConfig {
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or any variable fails to parse.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 5000),
            cors_origins: split_list(&env_or(
                "CORS_ORIGINS",
                "http://localhost:5173".to_string(),
            )),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            upload_dir: env_or("UPLOAD_DIR", PathBuf::from("./uploads")),
            max_file_size: env_or("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE),
            log_format: env_or("LOG_FORMAT", LogFormat::Pretty),
            bootstrap_admin: BootstrapAdmin::from_env(),
            jwt: JwtConfig::from_env(),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl JwtConfig {
    fn from_env() -> Self {
        let secret = env_var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        Self {
            secret,
            access_token_expiry_mins: env_or("JWT_ACCESS_EXPIRY_MINS", 60),
            refresh_token_expiry_days: env_or("JWT_REFRESH_EXPIRY_DAYS", 7),
        }
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// Expiry of a refresh token issued at `now`.
    pub fn refresh_expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.refresh_token_expiry_days)
    }
}

impl BootstrapAdmin {
    fn from_env() -> Option<Self> {
        Some(Self {
            email: env_var("ADMIN_EMAIL")?,
            password: env_var("ADMIN_PASSWORD")?,
            name: env_or("ADMIN_NAME", "Administrator".to_string()),
        })
    }
}

/// A set, non-blank environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        None => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
