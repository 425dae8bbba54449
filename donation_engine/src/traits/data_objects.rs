use std::collections::HashMap;

use dpg_common::MinorUnits;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Donation, DonationStatus, DonorInfo, OrderId};

/// The result of a completion attempt against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The donation moved from `pending` to `completed` in this call, and a fresh receipt number was allocated.
    Completed(Donation),
    /// The donation had already been completed by an earlier call. No receipt number was allocated.
    AlreadyCompleted(Donation),
}

impl CompletionOutcome {
    pub fn donation(&self) -> &Donation {
        match self {
            Self::Completed(d) | Self::AlreadyCompleted(d) => d,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// The result of a failure transition against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The donation moved from `pending` to `failed` in this call.
    Failed(Donation),
    /// The donation was already in a terminal state and was left as is.
    Unchanged(Donation),
}

impl FailureOutcome {
    pub fn donation(&self) -> &Donation {
        match self {
            Self::Failed(d) | Self::Unchanged(d) => d,
        }
    }
}

/// Query parameters for the donation listing. Results are always ordered newest first.
#[derive(Debug, Clone, Default)]
pub struct DonationQuery {
    pub status: Option<DonationStatus>,
    pub offset: i64,
    pub limit: i64,
}

impl DonationQuery {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { status: None, offset, limit }
    }

    pub fn with_status(mut self, status: DonationStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub status: DonationStatus,
    pub count: i64,
    pub total_amount: MinorUnits,
}

/// Identifies one admission counter: the originating address, the guarded operation and the start of the fixed
/// window (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdmissionKey {
    pub address: String,
    pub operation: String,
    pub window_start: i64,
}

impl AdmissionKey {
    pub fn new<S: Into<String>>(address: S, operation: S, window_start: i64) -> Self {
        Self { address: address.into(), operation: operation.into(), window_start }
    }
}

/// Everything the gateway needs to open an order for a donation.
#[derive(Debug, Clone)]
pub struct GatewayOrderRequest {
    pub amount: MinorUnits,
    pub currency: String,
    pub receipt: String,
    pub notes: HashMap<String, String>,
}

impl GatewayOrderRequest {
    pub fn new(amount: MinorUnits, currency: &str, receipt: String, donor: &DonorInfo, purpose: &str) -> Self {
        let mut notes = HashMap::new();
        notes.insert("donor_name".to_string(), donor.name.clone());
        notes.insert("donor_email".to_string(), donor.email.clone());
        notes.insert("donor_phone".to_string(), donor.phone.clone());
        notes.insert("purpose".to_string(), purpose.to_string());
        Self { amount, currency: currency.to_string(), receipt, notes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub order_id: OrderId,
    pub amount: MinorUnits,
    pub currency: String,
}
