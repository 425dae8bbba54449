use chrono::{DateTime, Utc};

/// Formats a receipt number as `{PREFIX}-{YYYY}-{NNNNNN}`. Sequence values wider than six digits are printed in full.
pub fn format_receipt_number(prefix: &str, year: i32, seq: i64) -> String {
    format!("{prefix}-{year:04}-{seq:06}")
}

/// The client-side reference sent to the gateway when opening an order.
pub fn gateway_receipt_tag(now: DateTime<Utc>) -> String {
    format!("receipt_{}", now.timestamp_millis())
}
