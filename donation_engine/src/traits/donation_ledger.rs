use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Donation, NewDonation, OrderId, VerifiedPayment},
    traits::data_objects::{CompletionOutcome, FailureOutcome},
};

/// The donation ledger owns the donation state machine. It is the only component permitted to move a donation out of
/// `pending`, and it owns the receipt-number allocator.
///
/// Implementations must be safe under concurrent use: any number of completion calls for the same order may race, and
/// exactly one of them allocates a receipt number.
#[allow(async_fn_in_trait)]
pub trait DonationLedger {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new donation with status `pending`. Fails with [`LedgerError::DuplicateOrder`] if the gateway order id
    /// is already known.
    async fn insert_pending_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError>;

    async fn fetch_donation_by_order_id(&self, order_id: &OrderId) -> Result<Option<Donation>, LedgerError>;

    /// Returns the most recent donation (of any status) created for `email` at or after `since`, if there is one.
    async fn fetch_recent_donation_for_email(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Donation>, LedgerError>;

    /// Completes the donation for a payment whose signature has already been verified.
    ///
    /// In a single transaction:
    /// * the donation is moved from `pending` to `completed`, recording the payment id, signature and payment time,
    /// * the next value of the `(receipt_prefix, year)` sequence is allocated,
    /// * the formatted receipt number is stored against the donation.
    ///
    /// If the donation is already `completed`, the existing record is returned as
    /// [`CompletionOutcome::AlreadyCompleted`] and nothing is allocated. A `failed` donation yields
    /// [`LedgerError::DonationAlreadyFailed`], and an unknown order yields [`LedgerError::DonationNotFound`].
    async fn complete_donation(
        &self,
        payment: VerifiedPayment,
        receipt_prefix: &str,
    ) -> Result<CompletionOutcome, LedgerError>;

    /// Moves a `pending` donation to `failed`, recording `reason` in the audit notes. Donations that are already in a
    /// terminal state are returned unchanged.
    async fn fail_donation(&self, order_id: &OrderId, reason: &str) -> Result<FailureOutcome, LedgerError>;

    /// Moves every `pending` donation created before `created_before` to `failed`. Returns the expired donations.
    async fn expire_stale_donations(
        &self,
        created_before: DateTime<Utc>,
        reason: &str,
    ) -> Result<Vec<Donation>, LedgerError>;

    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Donation record not found for order {0}")]
    DonationNotFound(OrderId),
    #[error("The donation for order {0} has already failed and cannot be completed")]
    DonationAlreadyFailed(OrderId),
    #[error("Cannot insert donation, since order {0} already exists")]
    DuplicateOrder(OrderId),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
