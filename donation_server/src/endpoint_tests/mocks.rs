use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, TimeZone, Utc};
use donation_engine::{
    db_types::{Donation, DonationStatus, NewDonation, OrderId, VerifiedPayment},
    traits::{
        AdmissionError,
        AdmissionKey,
        AdmissionStore,
        CompletionOutcome,
        DonationLedger,
        DonationQueries,
        DonationQuery,
        FailureOutcome,
        GatewayError,
        GatewayOrder,
        GatewayOrderRequest,
        LedgerError,
        PaymentGateway,
        StatusSummary,
    },
};
use dpg_common::MinorUnits;
use mockall::mock;

mock! {
    pub Ledger {}
    impl DonationLedger for Ledger {
        fn url(&self) -> &str;
        async fn insert_pending_donation(&self, donation: NewDonation) -> Result<Donation, LedgerError>;
        async fn fetch_donation_by_order_id(&self, order_id: &OrderId) -> Result<Option<Donation>, LedgerError>;
        async fn fetch_recent_donation_for_email(&self, email: &str, since: DateTime<Utc>) -> Result<Option<Donation>, LedgerError>;
        async fn complete_donation(&self, payment: VerifiedPayment, receipt_prefix: &str) -> Result<CompletionOutcome, LedgerError>;
        async fn fail_donation(&self, order_id: &OrderId, reason: &str) -> Result<FailureOutcome, LedgerError>;
        async fn expire_stale_donations(&self, created_before: DateTime<Utc>, reason: &str) -> Result<Vec<Donation>, LedgerError>;
    }
}

mock! {
    pub Queries {}
    impl DonationQueries for Queries {
        async fn search_donations(&self, query: DonationQuery) -> Result<Vec<Donation>, LedgerError>;
        async fn count_donations(&self, status: Option<DonationStatus>) -> Result<i64, LedgerError>;
        async fn status_breakdown(&self) -> Result<Vec<StatusSummary>, LedgerError>;
        async fn fetch_recent_completed(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Donation>, LedgerError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, GatewayError>;
    }
}

/// A process-local admission store. The SQLite store is exercised by the engine's integration tests.
#[derive(Default)]
pub struct MemoryAdmissionStore {
    counters: Mutex<HashMap<AdmissionKey, u32>>,
}

impl AdmissionStore for MemoryAdmissionStore {
    async fn record_attempt(&self, key: &AdmissionKey) -> Result<u32, AdmissionError> {
        let mut counters = self.counters.lock().unwrap();
        let hits = counters.entry(key.clone()).or_insert(0);
        *hits += 1;
        Ok(*hits)
    }

    async fn release_attempt(&self, key: &AdmissionKey) -> Result<(), AdmissionError> {
        if let Some(hits) = self.counters.lock().unwrap().get_mut(key) {
            *hits = hits.saturating_sub(1);
        }
        Ok(())
    }

    async fn purge_expired(&self, window_start: i64) -> Result<u64, AdmissionError> {
        let mut counters = self.counters.lock().unwrap();
        let before = counters.len();
        counters.retain(|k, _| k.window_start >= window_start);
        Ok((before - counters.len()) as u64)
    }
}

pub fn donation(order_id: &str, status: DonationStatus) -> Donation {
    let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
    let completed = status == DonationStatus::Completed;
    Donation {
        id: 1,
        order_id: OrderId::from(order_id),
        payment_id: completed.then(|| "pay_NfN4Zz1".to_string()),
        name: "Asha Rao".to_string(),
        email: "asha@example.org".to_string(),
        phone: "9876543210".to_string(),
        amount: MinorUnits::from(50_000),
        currency: "INR".to_string(),
        purpose: "General Donation".to_string(),
        status,
        signature: None,
        receipt_number: completed.then(|| "ORG-2025-000007".to_string()),
        notes: None,
        created_at,
        paid_at: completed.then(|| Utc.with_ymd_and_hms(2025, 3, 1, 10, 32, 0).unwrap()),
        updated_at: created_at,
    }
}
