use serde::{Deserialize, Serialize};

use crate::db_types::Donation;

/// Emitted once, after a donation has moved to `completed` and its receipt number has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationCompletedEvent {
    pub donation: Donation,
}

impl DonationCompletedEvent {
    pub fn new(donation: Donation) -> Self {
        Self { donation }
    }
}

/// Emitted once, after a donation has moved to `failed`, either because its payment could not be verified or because
/// it was abandoned and expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationFailedEvent {
    pub donation: Donation,
    pub reason: String,
}

impl DonationFailedEvent {
    pub fn new(donation: Donation, reason: &str) -> Self {
        Self { donation, reason: reason.to_string() }
    }
}
