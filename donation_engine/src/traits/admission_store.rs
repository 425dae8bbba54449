use thiserror::Error;

use crate::traits::data_objects::AdmissionKey;

/// A shared store of expiring attempt counters. Counters are keyed by [`AdmissionKey`], so a new window always starts
/// a fresh counter and old windows can be purged wholesale.
#[allow(async_fn_in_trait)]
pub trait AdmissionStore {
    /// Atomically records an attempt against the counter and returns the updated number of attempts in the window.
    async fn record_attempt(&self, key: &AdmissionKey) -> Result<u32, AdmissionError>;

    /// Removes a previously recorded attempt from the counter. Counters never drop below zero.
    async fn release_attempt(&self, key: &AdmissionKey) -> Result<(), AdmissionError>;

    /// Deletes all counters for windows starting before `window_start`. Returns the number of counters removed.
    async fn purge_expired(&self, window_start: i64) -> Result<u64, AdmissionError>;
}

#[derive(Debug, Clone, Error)]
pub enum AdmissionError {
    #[error("The admission store is unavailable: {0}")]
    StoreUnavailable(String),
    #[error("The admission store did not respond in time")]
    Timeout,
}

impl From<sqlx::Error> for AdmissionError {
    fn from(e: sqlx::Error) -> Self {
        AdmissionError::StoreUnavailable(e.to_string())
    }
}
