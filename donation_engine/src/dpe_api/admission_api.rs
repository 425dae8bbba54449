//! # Admission control
//!
//! Fixed-window rate limiting per originating address. Every window of `window` seconds (aligned to the unix epoch)
//! starts a fresh counter, and an address may make at most `max_attempts` attempts in a window.
//!
//! Counters live in an [`AdmissionStore`], so they are shared between server instances and survive restarts.
//! Admission is best effort: if the store fails or is slow, the request is allowed and the problem is logged.
use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::*;

use crate::traits::{AdmissionError, AdmissionKey, AdmissionStore};

pub const DEFAULT_ADMISSION_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// How long a single store call may take before admission gives up and fails open.
pub const STORE_TIMEOUT: Duration = Duration::from_millis(750);
/// Log target for addresses that keep hammering a guarded operation after being denied.
pub const SUSPICIOUS_ADDRESS_TARGET: &str = "dpg::suspicious_address";

#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub window: Duration,
    pub max_attempts: u32,
    /// When set, attempts that end in a successful response are released from the counter.
    pub skip_successful: bool,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self { window: DEFAULT_ADMISSION_WINDOW, max_attempts: DEFAULT_MAX_ATTEMPTS, skip_successful: true }
    }
}

impl AdmissionPolicy {
    fn window_secs(&self) -> i64 {
        i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX).max(1)
    }

    /// The start of the window containing `now`, in unix seconds.
    pub fn window_start(&self, now: DateTime<Utc>) -> i64 {
        let ts = now.timestamp();
        ts - ts.rem_euclid(self.window_secs())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The request may proceed. The key is present if the attempt was counted, so it can be released later.
    Allowed(Option<AdmissionKey>),
    /// The request must be turned away.
    Denied { retry_after_secs: u64, attempts: u32 },
}

pub struct AdmissionApi<S> {
    store: S,
    policy: AdmissionPolicy,
}

impl<S> Debug for AdmissionApi<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdmissionApi ({:?})", self.policy)
    }
}

impl<S> AdmissionApi<S>
where S: AdmissionStore
{
    pub fn new(store: S, policy: AdmissionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Records an attempt at `operation` from `address` and decides whether it may go ahead.
    pub async fn check(&self, address: &str, operation: &str, now: DateTime<Utc>) -> AdmissionDecision {
        let window_start = self.policy.window_start(now);
        let key = AdmissionKey::new(address, operation, window_start);
        let attempts = match with_timeout(self.store.record_attempt(&key)).await {
            Ok(n) => n,
            Err(e) => {
                error!("🚦️ Could not record {operation} attempt for {address}. Allowing the request. {e}");
                return AdmissionDecision::Allowed(None);
            },
        };
        trace!("🚦️ {address} has made {attempts} {operation} attempts in the current window");
        if attempts <= self.policy.max_attempts {
            return AdmissionDecision::Allowed(Some(key));
        }
        let window_end = window_start + self.policy.window_secs();
        let retry_after_secs = u64::try_from(window_end - now.timestamp()).unwrap_or(1).max(1);
        info!("🚦️ {operation} attempt #{attempts} from {address} denied. Retry in {retry_after_secs}s");
        if attempts == self.policy.max_attempts.saturating_mul(2).saturating_add(1) {
            warn!(
                target: SUSPICIOUS_ADDRESS_TARGET,
                "🚦️ {address} keeps retrying {operation} after being rate limited ({attempts} attempts in the window \
                 starting at {window_start})"
            );
        }
        AdmissionDecision::Denied { retry_after_secs, attempts }
    }

    /// Gives back an attempt that was counted by [`Self::check`]. Used for successful requests when the policy says
    /// they should not count.
    pub async fn release(&self, key: &AdmissionKey) {
        if let Err(e) = with_timeout(self.store.release_attempt(key)).await {
            error!("🚦️ Could not release {} attempt for {}. {e}", key.operation, key.address);
        }
    }

    /// Deletes counters for every window before the one containing `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AdmissionError> {
        let removed = with_timeout(self.store.purge_expired(self.policy.window_start(now))).await?;
        if removed > 0 {
            debug!("🚦️ {removed} expired admission counters purged");
        }
        Ok(removed)
    }
}

async fn with_timeout<T, F>(fut: F) -> Result<T, AdmissionError>
where F: std::future::Future<Output = Result<T, AdmissionError>> {
    tokio::time::timeout(STORE_TIMEOUT, fut).await.map_err(|_| AdmissionError::Timeout)?
}
