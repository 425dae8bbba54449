//! SQLite backend for the donation engine.
//!
//! The schema lives in `migrations/` and is embedded into the binary. Call [`SqliteDatabase::migrate`] at start-up to
//! bring a database up to date.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
