use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use dpg_common::MinorUnits;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::de_text;

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The gateway-assigned order identifier. This is the external correlation key for a donation and is unique across the
/// ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    DonationStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    /// A gateway order exists, but the payment has not been confirmed yet.
    Pending,
    /// The payment signature was verified and a receipt number was issued. Terminal.
    Completed,
    /// The payment could not be verified, or the checkout was abandoned. Terminal.
    Failed,
}

impl DonationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationStatus::Pending => write!(f, "pending"),
            DonationStatus::Completed => write!(f, "completed"),
            DonationStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid donation status: {0}")]
pub struct ConversionError(String);

impl FromStr for DonationStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       DonorInfo       ---------------------------------------------------------
/// Donor contact details, as supplied on the donation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorInfo {
    #[serde(default, deserialize_with = "de_text")]
    pub name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub email: String,
    #[serde(default, deserialize_with = "de_text")]
    pub phone: String,
}

impl DonorInfo {
    pub fn new<S: Into<String>>(name: S, email: S, phone: S) -> Self {
        Self { name: name.into(), email: email.into(), phone: phone.into() }
    }
}

//--------------------------------------      NewDonation      ---------------------------------------------------------
/// A validated donation that has been assigned a gateway order and is ready to be stored as `pending`.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub order_id: OrderId,
    pub donor: DonorInfo,
    pub amount: MinorUnits,
    pub currency: String,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Donation       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    pub order_id: OrderId,
    pub payment_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub purpose: String,
    pub status: DonationStatus,
    #[serde(skip_serializing)]
    pub signature: Option<String>,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    pub fn donor(&self) -> DonorInfo {
        DonorInfo::new(self.name.as_str(), self.email.as_str(), self.phone.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status == DonationStatus::Completed
    }
}

//--------------------------------------    VerifiedPayment    ---------------------------------------------------------
/// Gateway payment details whose signature has already been checked.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub order_id: OrderId,
    pub payment_id: String,
    pub signature: String,
    pub paid_at: DateTime<Utc>,
}
