use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The body of a `POST /v1/orders` request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewRazorpayOrder {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    /// Merchant-side reference, at most 40 characters.
    pub receipt: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RazorpayOrder {
    pub id: String,
    #[serde(default)]
    pub entity: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RazorpayErrorBody {
    pub error: RazorpayErrorDetail,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RazorpayErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl RazorpayErrorBody {
    /// Best-effort extraction of a readable message from an error response body.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<RazorpayErrorBody>(body) {
            Ok(e) if !e.error.description.is_empty() => format!("{}: {}", e.error.code, e.error.description),
            _ => body.to_string(),
        }
    }
}
