//! #  Backend interface contracts.
//!
//! This module defines the behaviour that storage backends and external collaborators need to expose in order to be
//! supported by the donation engine.
//!
//! ## Donations
//! A donation is created as `pending` once the gateway has issued an order for it, and is moved exactly once to a
//! terminal state (`completed` or `failed`). Only the ledger performs these transitions.
//!
//! ## Traits
//! * [`DonationLedger`] owns the donation state machine and the receipt-number allocator.
//! * [`DonationQueries`] provides read-only reporting over the ledger.
//! * [`AdmissionStore`] is a shared, expiring counter store used for rate limiting.
//! * [`PaymentGateway`] is the remote payment provider, treated as an opaque service.
mod admission_store;
mod data_objects;
mod donation_ledger;
mod donation_queries;
mod payment_gateway;

pub use admission_store::{AdmissionError, AdmissionStore};
pub use data_objects::{
    AdmissionKey,
    CompletionOutcome,
    DonationQuery,
    FailureOutcome,
    GatewayOrder,
    GatewayOrderRequest,
    StatusSummary,
};
pub use donation_ledger::{DonationLedger, LedgerError};
pub use donation_queries::DonationQueries;
pub use payment_gateway::{GatewayError, PaymentGateway};
