mod form_fields;
mod intake_validator;
mod payment_signature;
mod receipt;

pub use form_fields::{de_amount, de_text};
pub use intake_validator::{
    validate_donation,
    DonationRequest,
    IntakePolicy,
    IntakePolicyError,
    ValidDonation,
    Violation,
    AMOUNT_CEILING,
    DEFAULT_DEDUP_WINDOW,
    DEFAULT_MAX_AMOUNT,
    DEFAULT_MIN_AMOUNT,
    DEFAULT_PHONE_PATTERN,
    DEFAULT_PURPOSE,
};
pub use payment_signature::{SignatureKeyError, SignatureVerifier};
pub use receipt::{format_receipt_number, gateway_receipt_tag};
