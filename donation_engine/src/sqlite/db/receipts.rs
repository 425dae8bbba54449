use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

/// Allocates the next value of the `(prefix, year)` receipt sequence with a single atomic upsert. The first value of
/// every sequence is 1.
///
/// Call this inside the same transaction that completes the donation, so that a rollback also returns the value.
pub async fn next_receipt_value(
    prefix: &str,
    year: i32,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO receipt_sequences (prefix, year, last_value, updated_at) VALUES ($1, $2, 1, $3)
        ON CONFLICT (prefix, year) DO UPDATE SET
            last_value = last_value + 1,
            updated_at = excluded.updated_at
        RETURNING last_value;
        "#,
    )
    .bind(prefix)
    .bind(year)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(value)
}

/// The last receipt value handed out for the sequence, or zero if the sequence has not been used yet.
pub async fn last_receipt_value(prefix: &str, year: i32, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let value: Option<i64> = sqlx::query_scalar("SELECT last_value FROM receipt_sequences WHERE prefix = $1 AND year = $2")
        .bind(prefix)
        .bind(year)
        .fetch_optional(conn)
        .await?;
    Ok(value.unwrap_or(0))
}
