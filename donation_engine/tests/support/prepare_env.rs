use chrono::{DateTime, Utc};
use donation_engine::{
    db_types::{DonorInfo, NewDonation, OrderId},
    traits::DonationLedger,
    SqliteDatabase,
};
use dpg_common::MinorUnits;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const TEST_SECRET: &str = "dpg_test_key_secret";

pub fn random_db_path() -> String {
    format!("sqlite://{}/dpg_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

/// Creates a fresh database at `url` with all migrations applied.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        Sqlite::drop_database(url).await.expect("Error dropping stale test database");
    }
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to drop test database {url}: {e}");
    }
}

pub fn donor(n: usize) -> DonorInfo {
    let names = ["Asha", "Bilal", "Chitra", "Dev", "Esha", "Farhan", "Gita", "Hari"];
    let name = names[n % names.len()];
    DonorInfo::new(name.to_string(), format!("{}{n}@example.org", name.to_lowercase()), format!("98765{n:05}"))
}

pub fn pending_donation(order_id: &str, n: usize, created_at: DateTime<Utc>) -> NewDonation {
    NewDonation {
        order_id: OrderId::from(order_id),
        donor: donor(n),
        amount: MinorUnits::from(50_000),
        currency: "INR".to_string(),
        purpose: "General Donation".to_string(),
        created_at,
    }
}
