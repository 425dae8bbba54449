use std::time::Duration;

use dpg_common::Secret;
use log::*;

pub const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com";
pub const DEFAULT_RAZORPAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// The API root, without a trailing slash. Override this to point at a sandbox or a test double.
    pub base_url: String,
    pub key_id: String,
    /// The key secret is used for HTTP basic auth _and_ as the HMAC key for payment signatures.
    pub key_secret: Secret<String>,
    /// Upper bound on every request made to the gateway.
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RAZORPAY_BASE_URL.to_string(),
            key_id: String::default(),
            key_secret: Secret::default(),
            timeout: DEFAULT_RAZORPAY_TIMEOUT,
        }
    }
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("DPG_GATEWAY_BASE_URL").unwrap_or_else(|_| {
            info!("DPG_GATEWAY_BASE_URL not set, using {DEFAULT_RAZORPAY_BASE_URL}");
            DEFAULT_RAZORPAY_BASE_URL.to_string()
        });
        let key_id = std::env::var("DPG_GATEWAY_KEY_ID").unwrap_or_else(|_| {
            warn!("DPG_GATEWAY_KEY_ID not set. Order creation will fail until it is configured.");
            String::default()
        });
        let key_secret = Secret::new(std::env::var("DPG_GATEWAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("DPG_GATEWAY_KEY_SECRET not set. Order creation and payment verification will fail.");
            String::default()
        }));
        let timeout = std::env::var("DPG_GATEWAY_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for DPG_GATEWAY_TIMEOUT ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RAZORPAY_TIMEOUT);
        Self { base_url: base_url.trim_end_matches('/').to_string(), key_id, key_secret, timeout }
    }

    pub fn is_configured(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_empty()
    }
}
