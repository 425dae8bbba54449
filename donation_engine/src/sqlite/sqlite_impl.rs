//! `SqliteDatabase` is a concrete implementation of a donation engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the [`traits`]
//! module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::{DateTime, Datelike, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{admission, db_url, donations, new_pool, receipts};
use crate::{
    db_types::{Donation, DonationStatus, NewDonation, OrderId, VerifiedPayment},
    helpers::format_receipt_number,
    traits::{
        AdmissionError,
        AdmissionKey,
        AdmissionStore,
        CompletionOutcome,
        DonationLedger,
        DonationQueries,
        DonationQuery,
        FailureOutcome,
        LedgerError,
        StatusSummary,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl DonationLedger for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_pending_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError> {
        // Committed before returning, so the duplicate-submission check sees the row straight away
        let mut tx = self.pool.begin().await?;
        let donation = donations::insert_pending(donation, &mut tx).await?;
        tx.commit().await?;
        debug!("💰️ Donation #{} for order [{}] saved as pending", donation.id, donation.order_id);
        Ok(donation)
    }

    async fn fetch_donation_by_order_id(&self, order_id: &OrderId) -> Result<Option<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let donation = donations::fetch_by_order_id(order_id, &mut conn).await?;
        Ok(donation)
    }

    async fn fetch_recent_donation_for_email(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let donation = donations::fetch_recent_for_email(email, since, &mut conn).await?;
        Ok(donation)
    }

    async fn complete_donation(
        &self,
        payment: VerifiedPayment,
        receipt_prefix: &str,
    ) -> Result<CompletionOutcome, LedgerError> {
        let mut tx = self.pool.begin().await?;
        // The conditional update is the first statement, so the write lock is held for the rest of the transaction
        // and concurrent completions for the same order serialize here.
        let Some(claimed) = donations::claim_pending_for_payment(&payment, &mut tx).await? else {
            let existing = donations::fetch_by_order_id(&payment.order_id, &mut tx).await?;
            tx.commit().await?;
            return match existing {
                Some(d) if d.status == DonationStatus::Completed => {
                    if d.payment_id.as_deref() != Some(payment.payment_id.as_str()) {
                        warn!(
                            "💰️ Donation for order [{}] was already completed with payment {:?}, but a confirmation \
                             for payment {} was received. Keeping the original.",
                            d.order_id, d.payment_id, payment.payment_id
                        );
                    }
                    debug!("💰️ Donation for order [{}] was already completed. Returning existing receipt.", d.order_id);
                    Ok(CompletionOutcome::AlreadyCompleted(d))
                },
                Some(d) => Err(LedgerError::DonationAlreadyFailed(d.order_id)),
                None => Err(LedgerError::DonationNotFound(payment.order_id)),
            };
        };
        let year = payment.paid_at.year();
        let seq = receipts::next_receipt_value(receipt_prefix, year, payment.paid_at, &mut tx).await?;
        let receipt_number = format_receipt_number(receipt_prefix, year, seq);
        let note = format!("Payment {} verified", payment.payment_id);
        let donation = donations::mark_completed(claimed.id, &receipt_number, &note, &mut tx).await?;
        tx.commit().await?;
        info!("💰️ Donation #{} for order [{}] completed. Receipt {receipt_number}", donation.id, donation.order_id);
        Ok(CompletionOutcome::Completed(donation))
    }

    async fn fail_donation(&self, order_id: &OrderId, reason: &str) -> Result<FailureOutcome, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let outcome = match donations::mark_failed(order_id, reason, Utc::now(), &mut tx).await? {
            Some(d) => {
                info!("💰️ Donation #{} for order [{}] marked as failed. {reason}", d.id, d.order_id);
                FailureOutcome::Failed(d)
            },
            None => match donations::fetch_by_order_id(order_id, &mut tx).await? {
                Some(d) => {
                    debug!("💰️ Donation for order [{order_id}] is already {}. Leaving it as is.", d.status);
                    FailureOutcome::Unchanged(d)
                },
                None => return Err(LedgerError::DonationNotFound(order_id.clone())),
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn expire_stale_donations(
        &self,
        created_before: DateTime<Utc>,
        reason: &str,
    ) -> Result<Vec<Donation>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let expired = donations::expire_pending(created_before, reason, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(expired)
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl DonationQueries for SqliteDatabase {
    async fn search_donations(&self, query: DonationQuery) -> Result<Vec<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = donations::search(query, &mut conn).await?;
        Ok(result)
    }

    async fn count_donations(&self, status: Option<DonationStatus>) -> Result<i64, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let count = donations::count(status, &mut conn).await?;
        Ok(count)
    }

    async fn status_breakdown(&self) -> Result<Vec<StatusSummary>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let summary = donations::status_breakdown(&mut conn).await?;
        Ok(summary)
    }

    async fn fetch_recent_completed(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Donation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let result = donations::fetch_recent_completed(since, limit, &mut conn).await?;
        Ok(result)
    }
}

impl AdmissionStore for SqliteDatabase {
    async fn record_attempt(&self, key: &AdmissionKey) -> Result<u32, AdmissionError> {
        let mut tx = self.pool.begin().await?;
        let hits = admission::record_attempt(key, &mut tx).await?;
        tx.commit().await?;
        Ok(u32::try_from(hits).unwrap_or(u32::MAX))
    }

    async fn release_attempt(&self, key: &AdmissionKey) -> Result<(), AdmissionError> {
        let mut tx = self.pool.begin().await?;
        admission::release_attempt(key, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn purge_expired(&self, window_start: i64) -> Result<u64, AdmissionError> {
        let mut conn = self.pool.acquire().await?;
        let removed = admission::purge_before(window_start, &mut conn).await?;
        Ok(removed)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in the `DPG_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date by running any outstanding embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// The last receipt sequence value handed out for the given prefix and year.
    pub async fn last_receipt_value(&self, prefix: &str, year: i32) -> Result<i64, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let value = receipts::last_receipt_value(prefix, year, &mut conn).await?;
        Ok(value)
    }
}
