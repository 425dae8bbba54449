//! Donation notifications.
//!
//! Completed donations are always announced on the `dpg::notifications` log target. If a webhook URL is configured,
//! the completed donation is also POSTed there, which is where thank-you emails and admin alerts are rendered.
//!
//! Notifications run on the event handler tasks. A failed notification is logged and never affects the donation.
use std::time::Duration;

use donation_engine::events::{DonationCompletedEvent, DonationFailedEvent, EventHandlers, EventHooks};
use futures::future::BoxFuture;
use log::*;
use reqwest::Client;
use serde_json::json;

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;
pub const NOTIFICATIONS_TARGET: &str = "dpg::notifications";
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    fn new(url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self { url: url.to_string(), client })
    }

    async fn send(&self, ev: DonationCompletedEvent) {
        let order_id = ev.donation.order_id.clone();
        let payload = json!({ "event": "donation.completed", "donation": ev.donation });
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(res) if res.status().is_success() => {
                debug!("📬️ Webhook notified of completed donation for order [{order_id}]")
            },
            Ok(res) => warn!("📬️ Webhook rejected the notification for order [{order_id}]. Status {}", res.status()),
            Err(e) => error!("📬️ Could not notify the webhook of the donation for order [{order_id}]. {e}"),
        }
    }
}

/// Builds the notification hooks. An invalid webhook configuration is logged and the webhook is skipped, since
/// notifications must never stop donations from being accepted.
pub fn create_notification_handlers(webhook_url: Option<&str>) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let webhook = webhook_url.and_then(|url| match WebhookNotifier::new(url) {
        Ok(notifier) => {
            info!("📬️ Completed donations will be posted to the notification webhook");
            Some(notifier)
        },
        Err(e) => {
            error!("📬️ Could not set up the notification webhook. Notifications will only be logged. {e}");
            None
        },
    });
    hooks.on_donation_completed(move |ev| on_completed(ev, webhook.clone()));
    hooks.on_donation_failed(on_failed);
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}

fn on_completed(ev: DonationCompletedEvent, webhook: Option<WebhookNotifier>) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let d = &ev.donation;
        info!(
            target: NOTIFICATIONS_TARGET,
            "📬️ New donation: {} {} from {} <{}> for {}. Receipt {}. Payment {}",
            d.amount,
            d.currency,
            d.name,
            d.email,
            d.purpose,
            d.receipt_number.as_deref().unwrap_or("-"),
            d.payment_id.as_deref().unwrap_or("-")
        );
        if let Some(webhook) = webhook {
            webhook.send(ev).await;
        }
    })
}

fn on_failed(ev: DonationFailedEvent) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        info!(
            target: NOTIFICATIONS_TARGET,
            "📬️ Donation for order [{}] from {} failed. {}", ev.donation.order_id, ev.donation.email, ev.reason
        );
    })
}
