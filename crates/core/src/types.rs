/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (deadlines, transaction dates, airing dates).
pub type Date = chrono::NaiveDate;

/// Monetary amounts, stored as `NUMERIC(15,2)`.
pub type Money = rust_decimal::Decimal;
