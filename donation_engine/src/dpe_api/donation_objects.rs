use chrono::Duration;
use dpg_common::{MinorUnits, DEFAULT_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Donation, DonorInfo, OrderId},
    helpers::IntakePolicy,
    traits::StatusSummary,
};

pub const DEFAULT_RECEIPT_PREFIX: &str = "ORG";

/// Settings for the donation flow.
#[derive(Debug, Clone)]
pub struct DonationFlowConfig {
    pub intake: IntakePolicy,
    /// Organisation code at the start of every receipt number
    pub receipt_prefix: String,
    pub currency: String,
}

impl DonationFlowConfig {
    pub fn new(intake: IntakePolicy) -> Self {
        Self { intake, receipt_prefix: DEFAULT_RECEIPT_PREFIX.to_string(), currency: DEFAULT_CURRENCY_CODE.to_string() }
    }

    pub fn with_receipt_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.receipt_prefix = prefix.into();
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }
}

/// The gateway order opened for a new donation, together with the stored `pending` record.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub amount: MinorUnits,
    pub currency: String,
    pub donation: Donation,
}

/// The payment confirmation the gateway hands back to the donor's browser.
#[derive(Debug, Clone, Default)]
pub struct PaymentCallback {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    /// Donor details as re-submitted by the browser. Only used for logging; the stored snapshot is authoritative.
    pub donor: Option<DonorInfo>,
    /// Amount in major units as re-submitted by the browser. Only used for logging.
    pub amount: Option<f64>,
}

impl PaymentCallback {
    pub fn new(order_id: &str, payment_id: &str, signature: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            payment_id: payment_id.to_string(),
            signature: signature.to_string(),
            donor: None,
            amount: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The signature checked out and the donation was completed in this call.
    Completed(Donation),
    /// The signature checked out, but the donation had been completed before. The original receipt is returned.
    AlreadyCompleted(Donation),
    /// The signature did not check out. The donation is now `failed`, unless it was already in a terminal state.
    Rejected(Donation),
}

impl VerificationOutcome {
    pub fn donation(&self) -> &Donation {
        match self {
            Self::Completed(d) | Self::AlreadyCompleted(d) | Self::Rejected(d) => d,
        }
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationStatistics {
    pub total_donations: i64,
    pub total_amount_raised: MinorUnits,
    pub completed_count: i64,
    pub status_breakdown: Vec<StatusSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationListing {
    pub donations: Vec<Donation>,
    pub pagination: Pagination,
    pub statistics: DonationStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub failed: i64,
    pub total_amount: MinorUnits,
    pub recent_donations: Vec<Donation>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const RECENT_DONATIONS_LIMIT: i64 = 10;

pub fn recent_donations_window() -> Duration {
    Duration::days(7)
}
