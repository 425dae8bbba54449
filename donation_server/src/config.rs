use std::{env, fmt::Display, str::FromStr, time::Duration as StdDuration};

use chrono::Duration;
use donation_engine::{
    dpe_api::{admission_api::AdmissionPolicy, donation_objects::DonationFlowConfig},
    helpers::{
        IntakePolicy,
        DEFAULT_DEDUP_WINDOW,
        DEFAULT_MAX_AMOUNT,
        DEFAULT_MIN_AMOUNT,
        DEFAULT_PHONE_PATTERN,
    },
};
use dpg_common::{
    helpers::{parse_boolean_flag, parse_list},
    DEFAULT_CURRENCY_CODE,
};
use log::*;
use razorpay_tools::RazorpayConfig;

use crate::errors::ServerError;

const DEFAULT_DPG_HOST: &str = "127.0.0.1";
const DEFAULT_DPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/donations.db";
const DEFAULT_RECEIPT_PREFIX: &str = "ORG";
const DEFAULT_RATE_LIMIT_WINDOW: StdDuration = StdDuration::from_secs(300);
const DEFAULT_RATE_LIMIT_MAX: u32 = 3;
const DEFAULT_PENDING_DONATION_TIMEOUT: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Gateway credentials. The key secret doubles as the payment signature key.
    pub gateway: RazorpayConfig,
    pub currency: String,
    /// The organisation code at the front of every receipt number, e.g. `ORG` in `ORG-2025-000042`.
    pub receipt_prefix: String,
    pub intake: IntakeConfig,
    pub rate_limit: RateLimitConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Origins that browsers may call the API from. An empty list means no cross-origin calls are allowed.
    pub allowed_origins: Vec<String>,
    /// The time before a donation that was never paid is considered abandoned and marked as failed.
    pub pending_donation_timeout: Duration,
    /// If set, every completed donation is POSTed to this URL.
    pub notification_webhook_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    /// Smallest donation, in major units
    pub min_amount: i64,
    /// Largest donation, in major units
    pub max_amount: i64,
    pub phone_pattern: String,
    pub dedup_window: StdDuration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            min_amount: DEFAULT_MIN_AMOUNT,
            max_amount: DEFAULT_MAX_AMOUNT,
            phone_pattern: DEFAULT_PHONE_PATTERN.to_string(),
            dedup_window: DEFAULT_DEDUP_WINDOW,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub window: StdDuration,
    pub max_attempts: u32,
    pub skip_successful: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { window: DEFAULT_RATE_LIMIT_WINDOW, max_attempts: DEFAULT_RATE_LIMIT_MAX, skip_successful: true }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DPG_HOST.to_string(),
            port: DEFAULT_DPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            gateway: RazorpayConfig::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            receipt_prefix: DEFAULT_RECEIPT_PREFIX.to_string(),
            intake: IntakeConfig::default(),
            rate_limit: RateLimitConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            allowed_origins: Vec::new(),
            pending_donation_timeout: DEFAULT_PENDING_DONATION_TIMEOUT,
            notification_webhook_url: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DPG_HOST").ok().unwrap_or_else(|| DEFAULT_DPG_HOST.into());
        let port = parse_value("DPG_PORT", env::var("DPG_PORT").ok(), DEFAULT_DPG_PORT);
        let database_url = env::var("DPG_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ DPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let gateway = RazorpayConfig::new_from_env_or_default();
        let currency = env::var("DPG_CURRENCY")
            .ok()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let receipt_prefix = env::var("DPG_RECEIPT_PREFIX")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_RECEIPT_PREFIX.to_string());
        let intake = IntakeConfig::from_env_or_default();
        let rate_limit = RateLimitConfig::from_env_or_default();
        let use_x_forwarded_for = parse_boolean_flag(env::var("DPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("DPG_USE_FORWARDED").ok(), false);
        let allowed_origins = env::var("DPG_ALLOWED_ORIGINS").map(|s| parse_list(&s)).unwrap_or_default();
        if allowed_origins.is_empty() {
            info!("🪛️ DPG_ALLOWED_ORIGINS is not set. Cross-origin requests will be refused.");
        } else {
            info!("🪛️ Allowed origins: {}", allowed_origins.join(", "));
        }
        let pending_donation_timeout = configure_pending_timeout();
        let notification_webhook_url =
            env::var("DPG_NOTIFICATION_WEBHOOK_URL").ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            host,
            port,
            database_url,
            gateway,
            currency,
            receipt_prefix,
            intake,
            rate_limit,
            use_x_forwarded_for,
            use_forwarded,
            allowed_origins,
            pending_donation_timeout,
            notification_webhook_url,
        }
    }

    pub fn intake_policy(&self) -> Result<IntakePolicy, ServerError> {
        let intake = &self.intake;
        IntakePolicy::new(intake.min_amount, intake.max_amount, &intake.phone_pattern, intake.dedup_window)
            .map_err(|e| ServerError::ConfigurationError(e.to_string()))
    }

    pub fn flow_config(&self) -> Result<DonationFlowConfig, ServerError> {
        let config = DonationFlowConfig::new(self.intake_policy()?)
            .with_receipt_prefix(self.receipt_prefix.as_str())
            .with_currency(self.currency.as_str());
        Ok(config)
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            window: self.rate_limit.window,
            max_attempts: self.rate_limit.max_attempts,
            skip_successful: self.rate_limit.skip_successful,
        }
    }
}

impl IntakeConfig {
    pub fn from_env_or_default() -> Self {
        let min_amount = parse_value("DPG_MIN_AMOUNT", env::var("DPG_MIN_AMOUNT").ok(), DEFAULT_MIN_AMOUNT);
        let max_amount = parse_value("DPG_MAX_AMOUNT", env::var("DPG_MAX_AMOUNT").ok(), DEFAULT_MAX_AMOUNT);
        let (min_amount, max_amount) = if min_amount < 1 || min_amount > max_amount {
            warn!(
                "🪛️ Donation bounds {min_amount}..{max_amount} are not valid. Using the defaults, \
                 {DEFAULT_MIN_AMOUNT}..{DEFAULT_MAX_AMOUNT}, instead."
            );
            (DEFAULT_MIN_AMOUNT, DEFAULT_MAX_AMOUNT)
        } else {
            (min_amount, max_amount)
        };
        let phone_pattern = match env::var("DPG_PHONE_PATTERN") {
            Ok(p) if regex::Regex::new(&p).is_ok() => p,
            Ok(p) => {
                warn!("🪛️ DPG_PHONE_PATTERN ({p}) is not a valid regular expression. Using the default instead.");
                DEFAULT_PHONE_PATTERN.to_string()
            },
            Err(_) => DEFAULT_PHONE_PATTERN.to_string(),
        };
        let dedup_window = parse_value(
            "DPG_DEDUP_WINDOW",
            env::var("DPG_DEDUP_WINDOW").ok(),
            DEFAULT_DEDUP_WINDOW.as_secs(),
        );
        Self { min_amount, max_amount, phone_pattern, dedup_window: StdDuration::from_secs(dedup_window) }
    }
}

impl RateLimitConfig {
    pub fn from_env_or_default() -> Self {
        let window = parse_value(
            "DPG_RATE_LIMIT_WINDOW",
            env::var("DPG_RATE_LIMIT_WINDOW").ok(),
            DEFAULT_RATE_LIMIT_WINDOW.as_secs(),
        );
        let window = if window == 0 {
            warn!("🪛️ DPG_RATE_LIMIT_WINDOW cannot be zero. Using the default instead.");
            DEFAULT_RATE_LIMIT_WINDOW
        } else {
            StdDuration::from_secs(window)
        };
        let max_attempts =
            parse_value("DPG_RATE_LIMIT_MAX", env::var("DPG_RATE_LIMIT_MAX").ok(), DEFAULT_RATE_LIMIT_MAX);
        let skip_successful = parse_boolean_flag(env::var("DPG_RATE_LIMIT_SKIP_SUCCESSFUL").ok(), true);
        info!(
            "🪛️ Order creation is limited to {max_attempts} attempts per {}s per address{}",
            window.as_secs(),
            if skip_successful { " (successful attempts excluded)" } else { "" }
        );
        Self { window, max_attempts, skip_successful }
    }
}

fn configure_pending_timeout() -> Duration {
    env::var("DPG_PENDING_DONATION_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ DPG_PENDING_DONATION_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_PENDING_DONATION_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for DPG_PENDING_DONATION_TIMEOUT. {e}"))
                .and_then(|h| {
                    if h > 0 {
                        Ok(Duration::hours(h))
                    } else {
                        warn!("🪛️ DPG_PENDING_DONATION_TIMEOUT must be a positive number of hours.");
                        Err(())
                    }
                })
        })
        .ok()
        .unwrap_or(DEFAULT_PENDING_DONATION_TIMEOUT)
}

/// Parses an optional configuration value, falling back to the default (with a log message) if the value is invalid.
fn parse_value<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => default,
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
