//! # Donation payment engine public API
//!
//! The `dpe_api` module exposes the programmatic API for the donation engine. The API is modular, so that clients can
//! pick the functionality they need, and each part only asks for the backend traits it actually uses.
//!
//! * [`donation_flow_api`] is the primary API. It takes a donation form through validation and gateway order creation,
//!   and turns gateway payment confirmations into completed (or failed) donations with receipt numbers.
//! * [`donation_query_api`] provides read-only listings and statistics.
//! * [`admission_api`] rate-limits abuse-prone operations per originating address.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits required by the API.
//!
//! ```rust,ignore
//! use donation_engine::{DonationQueryApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/donations.db", 25).await?;
//! // SqliteDatabase implements DonationQueries
//! let api = DonationQueryApi::new(db);
//! let stats = api.donation_stats(Utc::now()).await?;
//! ```
pub mod admission_api;
pub mod donation_flow_api;
pub mod donation_objects;
pub mod donation_query_api;
pub mod errors;
