//! Lenient deserializers for browser-submitted form fields.
//!
//! Donation forms post whatever the input elements hold, so amounts often arrive as strings and cleared fields as
//! `null`. These helpers accept both shapes so that a bad value is reported by the validator rather than rejected
//! wholesale as an unreadable body.
use serde::{de::IgnoredAny, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountField {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Reads an amount given as a JSON number or a numeric string. Anything else, including `null`, reads as `None`.
pub fn de_amount<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where D: Deserializer<'de> {
    let amount = match AmountField::deserialize(d)? {
        AmountField::Number(n) => Some(n),
        AmountField::Text(s) => s.trim().parse::<f64>().ok(),
        AmountField::Other(_) => None,
    };
    Ok(amount)
}

/// Reads a text field, treating `null` as an empty string.
pub fn de_text<'de, D>(d: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
