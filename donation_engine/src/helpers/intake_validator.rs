//! # Donation intake validation
//!
//! [`validate_donation`] is a pure function over the submitted form and an [`IntakePolicy`]. It never stops at the
//! first problem: every violation is collected so that the donor can fix the whole form in one go.
//!
//! Accepted values are normalised on the way through. Names are trimmed, emails are trimmed and lower-cased, and all
//! whitespace is stripped from phone numbers.
use std::{fmt::Display, time::Duration};

use dpg_common::{MinorUnits, MINOR_UNITS_PER_MAJOR};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::form_fields::de_amount;
use crate::db_types::DonorInfo;

pub const DEFAULT_PHONE_PATTERN: &str = r"^(\+91|91)?[6-9]\d{9}$";
pub const DEFAULT_PURPOSE: &str = "General Donation";
pub const DEFAULT_MIN_AMOUNT: i64 = 1;
pub const DEFAULT_MAX_AMOUNT: i64 = 500_000;
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);
/// No donation can be larger than this, in major units. Keeps every accepted amount well inside the minor-unit range.
pub const AMOUNT_CEILING: i64 = i64::MAX / MINOR_UNITS_PER_MAJOR / 1_000;

const NAME_PATTERN: &str = r"^[a-zA-Z\s]{2,50}$";
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

#[derive(Debug, Clone, Error)]
pub enum IntakePolicyError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("Invalid amount bounds: minimum {min} must be positive and at most {max}, which must be within the ceiling")]
    InvalidAmountBounds { min: i64, max: i64 },
}

/// The rules a donation form has to satisfy.
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    /// Smallest accepted donation, in major units
    pub min_amount: i64,
    /// Largest accepted donation, in major units
    pub max_amount: i64,
    /// Two donations from the same email within this window are treated as a duplicate submission
    pub dedup_window: Duration,
    phone: Regex,
    name: Regex,
    email: Regex,
}

impl IntakePolicy {
    pub fn new(
        min_amount: i64,
        max_amount: i64,
        phone_pattern: &str,
        dedup_window: Duration,
    ) -> Result<Self, IntakePolicyError> {
        if min_amount < 1 || min_amount > max_amount || max_amount > AMOUNT_CEILING {
            return Err(IntakePolicyError::InvalidAmountBounds { min: min_amount, max: max_amount });
        }
        let phone = Regex::new(phone_pattern)?;
        let name = Regex::new(NAME_PATTERN)?;
        let email = Regex::new(EMAIL_PATTERN)?;
        Ok(Self { min_amount, max_amount, dedup_window, phone, name, email })
    }

    /// The policy with all the default rules: 1 to 5 lakh rupees, Indian mobile numbers and a five minute
    /// de-duplication window.
    pub fn try_default() -> Result<Self, IntakePolicyError> {
        Self::new(DEFAULT_MIN_AMOUNT, DEFAULT_MAX_AMOUNT, DEFAULT_PHONE_PATTERN, DEFAULT_DEDUP_WINDOW)
    }
}

/// The donation form, exactly as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationRequest {
    /// Amount in major units. Fractional amounts are rejected, as are values that are not numbers at all.
    #[serde(default, deserialize_with = "de_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub donor: Option<DonorInfo>,
    #[serde(default)]
    pub purpose: Option<String>,
}

/// A donation form that has passed validation, with normalised donor details and the amount converted to minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDonation {
    pub amount: MinorUnits,
    pub donor: DonorInfo,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    AmountOutOfRange { min: i64, max: i64 },
    MissingDonor,
    InvalidName,
    InvalidEmail,
    InvalidPhone,
    DuplicateSubmission { window: Duration },
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::AmountOutOfRange { min, max } => {
                write!(f, "Amount must be between ₹{} and ₹{}", indian_grouping(*min), indian_grouping(*max))
            },
            Violation::MissingDonor => write!(f, "Donor information is required"),
            Violation::InvalidName => write!(f, "Please enter a valid name (2-50 characters, letters only)"),
            Violation::InvalidEmail => write!(f, "Please enter a valid email address"),
            Violation::InvalidPhone => write!(f, "Please enter a valid Indian phone number (10 digits)"),
            Violation::DuplicateSubmission { window } => {
                let minutes = window.as_secs().div_ceil(60).max(1);
                let unit = if minutes == 1 { "minute" } else { "minutes" };
                write!(f, "Please wait {minutes} {unit} between donations from the same email")
            },
        }
    }
}

impl Serialize for Violation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Checks the donation form against the policy. Returns the normalised donation, or every rule that was broken.
///
/// Duplicate submissions are not detected here, since that needs the ledger. See
/// [`DonationFlowApi::create_order`](crate::DonationFlowApi::create_order).
pub fn validate_donation(request: &DonationRequest, policy: &IntakePolicy) -> Result<ValidDonation, Vec<Violation>> {
    let mut violations = Vec::new();
    let amount = match request.amount {
        Some(a) if a.is_finite() && a.fract() == 0.0 && a >= policy.min_amount as f64 && a <= policy.max_amount as f64 => {
            MinorUnits::from_major(a as i64)
        },
        _ => None,
    };
    if amount.is_none() {
        violations.push(Violation::AmountOutOfRange { min: policy.min_amount, max: policy.max_amount });
    }
    let donor = match &request.donor {
        None => {
            violations.push(Violation::MissingDonor);
            None
        },
        Some(donor) => {
            let name = donor.name.trim().to_string();
            let email = donor.email.trim().to_lowercase();
            let phone = donor.phone.chars().filter(|c| !c.is_whitespace()).collect::<String>();
            if !policy.name.is_match(&name) {
                violations.push(Violation::InvalidName);
            }
            if !policy.email.is_match(&email) {
                violations.push(Violation::InvalidEmail);
            }
            if !policy.phone.is_match(&phone) {
                violations.push(Violation::InvalidPhone);
            }
            Some(DonorInfo { name, email, phone })
        },
    };
    let purpose = request
        .purpose
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PURPOSE)
        .to_string();
    match (amount, donor) {
        (Some(amount), Some(donor)) if violations.is_empty() => Ok(ValidDonation { amount, donor, purpose }),
        _ => Err(violations),
    }
}

/// Formats an integer with the Indian digit grouping, e.g. 500000 → `5,00,000`.
fn indian_grouping(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    if digits.len() <= 3 {
        return format!("{sign}{digits}");
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (h, t) = rest.split_at(rest.len() - 2);
        groups.push(t);
        rest = h;
    }
    groups.push(rest);
    groups.reverse();
    format!("{sign}{},{tail}", groups.join(","))
}
