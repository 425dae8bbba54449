use std::fmt::Display;

use chrono::{DateTime, Utc};
use donation_engine::{
    db_types::{Donation, DonationStatus, DonorInfo, OrderId},
    dpe_api::donation_objects::{CreatedOrder, DonationListing, DonationStats, PaymentCallback},
    helpers::{de_amount, de_text},
};
use dpg_common::MinorUnits;
use serde::{Deserialize, Serialize};

pub const PAYMENT_VERIFIED_MESSAGE: &str = "Payment verified successfully! Thank you for your generous donation.";
pub const PAYMENT_REJECTED_MESSAGE: &str = "Payment verification failed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Returned once a gateway order has been opened for a donation. The browser hands `id` to the gateway checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub id: OrderId,
    /// In minor units, as the gateway checkout expects
    pub amount: MinorUnits,
    pub currency: String,
}

impl From<CreatedOrder> for CreateOrderResponse {
    fn from(order: CreatedOrder) -> Self {
        Self { success: true, id: order.order_id, amount: order.amount, currency: order.currency }
    }
}

/// The payment confirmation the gateway checkout hands back to the browser. The gateway's own field names are accepted
/// so the checkout response can be forwarded as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(default, alias = "razorpay_order_id", deserialize_with = "de_text")]
    pub order_id: String,
    #[serde(default, alias = "razorpay_payment_id", deserialize_with = "de_text")]
    pub payment_id: String,
    #[serde(default, alias = "razorpay_signature", deserialize_with = "de_text")]
    pub signature: String,
    #[serde(default)]
    pub donor: Option<DonorInfo>,
    /// Only compared against the stored amount and logged, so a value that is not a number is simply dropped
    #[serde(default, deserialize_with = "de_amount")]
    pub amount: Option<f64>,
}

impl From<VerifyPaymentRequest> for PaymentCallback {
    fn from(req: VerifyPaymentRequest) -> Self {
        Self {
            order_id: req.order_id,
            payment_id: req.payment_id,
            signature: req.signature,
            donor: req.donor,
            amount: req.amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub receipt_number: Option<String>,
    pub amount: MinorUnits,
    pub currency: String,
    pub payment_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub status: DonationStatus,
}

impl From<&Donation> for ReceiptSummary {
    fn from(d: &Donation) -> Self {
        Self {
            receipt_number: d.receipt_number.clone(),
            amount: d.amount,
            currency: d.currency.clone(),
            payment_id: d.payment_id.clone(),
            date: d.paid_at,
            status: d.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub donation: ReceiptSummary,
}

impl VerifyPaymentResponse {
    pub fn verified(donation: &Donation) -> Self {
        Self { success: true, message: PAYMENT_VERIFIED_MESSAGE.to_string(), donation: ReceiptSummary::from(donation) }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDonationsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<DonationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationListingResponse {
    pub success: bool,
    #[serde(flatten)]
    pub listing: DonationListing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationStatsResponse {
    pub success: bool,
    pub stats: DonationStats,
}
