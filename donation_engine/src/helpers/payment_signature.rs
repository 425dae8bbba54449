//! # Payment confirmation signatures
//!
//! When a donor completes a checkout, the gateway hands the browser three values: the order id, the payment id and a
//! signature. The signature is an HMAC-SHA256, keyed with the merchant's key secret, over
//!
//! ```text
//!    {order_id}|{payment_id}
//! ```
//!
//! encoded as lowercase hex. Since only the gateway and this server know the key secret, a matching signature proves
//! that the gateway really did accept the payment for that order.
use dpg_common::Secret;
use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
#[error("The payment signature key is not usable: {0}")]
pub struct SignatureKeyError(String);

/// Verifies gateway payment signatures. The verifier holds a keyed HMAC instance that is cloned for every check, so
/// the key secret itself is not retained.
#[derive(Clone)]
pub struct SignatureVerifier {
    keyed_mac: HmacSha256,
}

impl SignatureVerifier {
    pub fn new(secret: &Secret<String>) -> Result<Self, SignatureKeyError> {
        let keyed_mac =
            HmacSha256::new_from_slice(secret.reveal().as_bytes()).map_err(|e| SignatureKeyError(e.to_string()))?;
        Ok(Self { keyed_mac })
    }

    fn mac_for(&self, order_id: &str, payment_id: &str) -> HmacSha256 {
        let mut mac = self.keyed_mac.clone();
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        mac
    }

    /// Produces the lowercase hex signature the gateway would send for this order and payment.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        let mac = self.mac_for(order_id, payment_id);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks the claimed signature in constant time. Malformed signatures (empty, not hex, wrong length) simply fail.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        if order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
            return false;
        }
        let Ok(claimed) = hex::decode(signature.trim()) else {
            trace!("🔐️ Signature for order [{order_id}] is not valid hex");
            return false;
        };
        self.mac_for(order_id, payment_id).verify_slice(&claimed).is_ok()
    }
}
