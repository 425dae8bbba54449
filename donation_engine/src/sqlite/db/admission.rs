use chrono::Utc;
use sqlx::SqliteConnection;

use crate::traits::AdmissionKey;

/// Increments the counter for the key, creating it if necessary, and returns the new count.
pub async fn record_attempt(key: &AdmissionKey, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let hits: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO admission_counters (address, operation, window_start, hits, updated_at) VALUES ($1, $2, $3, 1, $4)
        ON CONFLICT (address, operation, window_start) DO UPDATE SET
            hits = hits + 1,
            updated_at = excluded.updated_at
        RETURNING hits;
        "#,
    )
    .bind(key.address.as_str())
    .bind(key.operation.as_str())
    .bind(key.window_start)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(hits)
}

pub async fn release_attempt(key: &AdmissionKey, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE admission_counters SET hits = hits - 1, updated_at = $1
        WHERE address = $2 AND operation = $3 AND window_start = $4 AND hits > 0
        "#,
    )
    .bind(Utc::now())
    .bind(key.address.as_str())
    .bind(key.operation.as_str())
    .bind(key.window_start)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn purge_before(window_start: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM admission_counters WHERE window_start < $1").bind(window_start).execute(conn).await?;
    Ok(result.rows_affected())
}
