//! A small client for the Razorpay Orders REST API.
//!
//! Only the calls the donation gateway needs are implemented: creating an order, and fetching one back for
//! reconciliation.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{NewRazorpayOrder, RazorpayErrorBody, RazorpayOrder};
pub use error::RazorpayApiError;
