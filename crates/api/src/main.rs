use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use dreamlight_api::bootstrap;
use dreamlight_api::config::{LogFormat, ServerConfig};
use dreamlight_api::router::build_app_router;
use dreamlight_api::state::AppState;
use dreamlight_db::DbPool;

const DEFAULT_LOG_FILTER: &str = "dreamlight_api=debug,dreamlight_db=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();
    init_tracing(config.log_format);
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let pool = connect_database().await;

    if let Some(admin) = bootstrap::ensure_admin(&pool, config.bootstrap_admin.as_ref())
        .await
        .expect("Failed to create bootstrap admin")
    {
        tracing::info!(user_id = admin.id, "Seeded first admin account");
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");
    tracing::info!(upload_dir = %config.upload_dir.display(), "Upload directory ready");

    let addr = config.socket_addr().expect("HOST must be an IP address");
    let app = build_app_router(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Connect, verify the connection and apply pending migrations.
async fn connect_database() -> DbPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = dreamlight_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    dreamlight_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    dreamlight_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database ready");
    pool
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl-C received, shutting down"),
        () = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
