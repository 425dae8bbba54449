//! # Donation payment server
//! This crate hosts the HTTP server for the donation payment gateway. It is responsible for:
//! * Accepting donation forms, validating them and opening an order with the payment gateway.
//! * Verifying the gateway's payment confirmation and issuing a receipt number.
//! * Rate limiting order creation per originating address.
//! * Expiring abandoned checkouts in the background.
//! * Handing completed donations to the notification hooks.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/donations/create-order`: Validates a donation form and opens a gateway order. Rate limited.
//! * `POST /api/donations/verify-payment`: Verifies a payment confirmation and completes the donation.
//! * `GET /api/donations`: Lists donations with pagination and statistics.
//! * `GET /api/donations/stats`: Aggregate donation statistics.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
