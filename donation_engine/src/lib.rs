//! Donation Payment Engine
//!
//! This library contains the core logic for accepting donations through a third-party payment gateway. It is
//! provider-agnostic: the gateway is reached through the [`traits::PaymentGateway`] trait and storage through the
//! [`traits::DonationLedger`], [`traits::DonationQueries`] and [`traits::AdmissionStore`] traits.
//!
//! The library is divided into these sections:
//! 1. Storage backends ([`mod@sqlite`]). You should never need to access the database directly. Instead, use the public
//!    API provided by the engine. The exception is the data types used in the database, which are defined in
//!    [`mod@db_types`] and are public.
//! 2. The engine's public API ([`mod@dpe_api`]). This covers the donation lifecycle (order intake, payment
//!    verification, stale-order expiry), read-only reporting, and admission control.
//! 3. Pure helpers ([`mod@helpers`]): the intake validator, the payment signature verifier and receipt formatting.
//!
//! The engine also emits events when a donation completes or fails. Hook into these with [`events::EventHooks`] to
//! send notifications without slowing down the payment confirmation path.
pub mod db_types;
pub mod dpe_api;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use dpe_api::{
    admission_api::AdmissionApi,
    donation_flow_api::DonationFlowApi,
    donation_query_api::DonationQueryApi,
    errors::DonationFlowError,
};
