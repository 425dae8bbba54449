use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Donation, DonationStatus, NewDonation, OrderId, VerifiedPayment},
    traits::{DonationQuery, LedgerError, StatusSummary},
};

/// Inserts a new `pending` donation using the given connection. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_pending(donation: NewDonation, conn: &mut SqliteConnection) -> Result<Donation, LedgerError> {
    let order_id = donation.order_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO donations (
                order_id,
                name,
                email,
                phone,
                amount,
                currency,
                purpose,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $8)
            RETURNING *;
        "#,
    )
    .bind(donation.order_id)
    .bind(donation.donor.name)
    .bind(donation.donor.email)
    .bind(donation.donor.phone)
    .bind(donation.amount)
    .bind(donation.currency)
    .bind(donation.purpose)
    .bind(donation.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(donation) => Ok(donation),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(LedgerError::DuplicateOrder(order_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_by_order_id(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Donation>, sqlx::Error> {
    let donation = sqlx::query_as("SELECT * FROM donations WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(donation)
}

/// Returns the newest donation for `email` created at or after `since`, regardless of its status.
pub async fn fetch_recent_for_email(
    email: &str,
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, sqlx::Error> {
    let donation = sqlx::query_as(
        "SELECT * FROM donations WHERE email = $1 AND created_at >= $2 ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(email)
    .bind(since)
    .fetch_optional(conn)
    .await?;
    Ok(donation)
}

/// Records the verified payment details against the donation, but only if it is still `pending`. The status is left
/// untouched, so that the caller can allocate a receipt number inside the same transaction before marking the donation
/// as completed.
///
/// Returns `None` if no pending donation exists for the order.
pub async fn claim_pending_for_payment(
    payment: &VerifiedPayment,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, sqlx::Error> {
    let donation = sqlx::query_as(
        r#"
        UPDATE donations SET
            payment_id = $1,
            signature = $2,
            paid_at = $3,
            updated_at = $3
        WHERE order_id = $4 AND status = 'pending'
        RETURNING *;
        "#,
    )
    .bind(payment.payment_id.as_str())
    .bind(payment.signature.as_str())
    .bind(payment.paid_at)
    .bind(payment.order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(donation)
}

/// Marks a claimed donation as completed and stores its receipt number.
pub async fn mark_completed(
    id: i64,
    receipt_number: &str,
    note: &str,
    conn: &mut SqliteConnection,
) -> Result<Donation, sqlx::Error> {
    let donation = sqlx::query_as(
        r#"
        UPDATE donations SET
            status = 'completed',
            receipt_number = $1,
            notes = $2
        WHERE id = $3 AND status = 'pending'
        RETURNING *;
        "#,
    )
    .bind(receipt_number)
    .bind(note)
    .bind(id)
    .fetch_one(conn)
    .await?;
    trace!("💰️ Donation #{id} marked as completed with receipt {receipt_number}");
    Ok(donation)
}

/// Moves the donation to `failed`, if and only if it is still `pending`. Returns `None` if nothing was changed.
pub async fn mark_failed(
    order_id: &OrderId,
    note: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Donation>, sqlx::Error> {
    let donation = sqlx::query_as(
        r#"
        UPDATE donations SET
            status = 'failed',
            notes = $1,
            updated_at = $2
        WHERE order_id = $3 AND status = 'pending'
        RETURNING *;
        "#,
    )
    .bind(note)
    .bind(now)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(donation)
}

/// Moves every `pending` donation created before `created_before` to `failed`.
pub async fn expire_pending(
    created_before: DateTime<Utc>,
    note: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Donation>, sqlx::Error> {
    let donations: Vec<Donation> = sqlx::query_as(
        r#"
        UPDATE donations SET
            status = 'failed',
            notes = $1,
            updated_at = $2
        WHERE status = 'pending' AND created_at < $3
        RETURNING *;
        "#,
    )
    .bind(note)
    .bind(now)
    .bind(created_before)
    .fetch_all(conn)
    .await?;
    debug!("💰️ {} stale pending donations expired", donations.len());
    Ok(donations)
}

/// Fetches donations according to the query, newest first.
pub async fn search(query: DonationQuery, conn: &mut SqliteConnection) -> Result<Vec<Donation>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM donations ");
    if let Some(status) = query.status {
        builder.push("WHERE status = ");
        builder.push_bind(status.to_string());
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset);
    trace!("💰️ Executing query: {}", builder.sql());
    let donations = builder.build_query_as::<Donation>().fetch_all(conn).await?;
    Ok(donations)
}

pub async fn count(status: Option<DonationStatus>, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = match status {
        Some(s) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM donations WHERE status = $1")
                .bind(s.to_string())
                .fetch_one(conn)
                .await?
        },
        None => sqlx::query_scalar("SELECT COUNT(*) FROM donations").fetch_one(conn).await?,
    };
    Ok(count)
}

pub async fn status_breakdown(conn: &mut SqliteConnection) -> Result<Vec<StatusSummary>, sqlx::Error> {
    let summary = sqlx::query_as(
        r#"
        SELECT status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total_amount
        FROM donations
        GROUP BY status
        ORDER BY status
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(summary)
}

pub async fn fetch_recent_completed(
    since: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Donation>, sqlx::Error> {
    let donations = sqlx::query_as(
        r#"
        SELECT * FROM donations
        WHERE status = 'completed' AND paid_at >= $1
        ORDER BY paid_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(since)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(donations)
}
