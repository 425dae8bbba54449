use chrono::{DateTime, Utc};

use crate::{
    db_types::{Donation, DonationStatus},
    traits::{
        data_objects::{DonationQuery, StatusSummary},
        LedgerError,
    },
};

/// Read-only reporting over the donation ledger.
#[allow(async_fn_in_trait)]
pub trait DonationQueries {
    /// Fetches a page of donations, newest first.
    async fn search_donations(&self, query: DonationQuery) -> Result<Vec<Donation>, LedgerError>;

    /// Counts donations, optionally restricted to a single status.
    async fn count_donations(&self, status: Option<DonationStatus>) -> Result<i64, LedgerError>;

    /// Donation count and total amount, per status.
    async fn status_breakdown(&self) -> Result<Vec<StatusSummary>, LedgerError>;

    /// The most recently paid completed donations with a payment time at or after `since`.
    async fn fetch_recent_completed(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Donation>, LedgerError>;
}
