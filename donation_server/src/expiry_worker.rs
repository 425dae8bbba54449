use chrono::{Duration, Utc};
use donation_engine::{db_types::Donation, AdmissionApi, DonationFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::razorpay::RazorpayGateway;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute the worker
/// * marks donations that have been pending for longer than `pending_timeout` as failed, and
/// * deletes admission counters for windows that have closed.
pub fn start_expiry_worker(
    flow_api: DonationFlowApi<SqliteDatabase, RazorpayGateway>,
    admission_api: AdmissionApi<SqliteDatabase>,
    pending_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        info!("🕰️ Pending donation expiry worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running pending donation expiry job");
            match flow_api.expire_stale_donations(pending_timeout).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No stale donations"),
                Ok(expired) => {
                    info!("🕰️ {} stale donations expired", expired.len());
                    debug!("🕰️ Expired donations: {}", donation_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running pending donation expiry job: {e}");
                },
            }
            if let Err(e) = admission_api.purge_expired(Utc::now()).await {
                warn!("🕰️ Could not purge expired admission counters. {e}");
            }
        }
    })
}

fn donation_list(donations: &[Donation]) -> String {
    donations
        .iter()
        .map(|d| format!("[{}] order_id: {} email: {}", d.id, d.order_id, d.email))
        .collect::<Vec<String>>()
        .join(", ")
}
