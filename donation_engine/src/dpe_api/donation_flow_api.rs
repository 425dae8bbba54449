use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use dpg_common::MINOR_UNITS_PER_MAJOR;
use log::*;

use crate::{
    db_types::{Donation, DonorInfo, NewDonation, OrderId, VerifiedPayment},
    dpe_api::{
        donation_objects::{CreatedOrder, DonationFlowConfig, PaymentCallback, VerificationOutcome},
        errors::DonationFlowError,
    },
    events::{DonationCompletedEvent, DonationFailedEvent, EventProducers},
    helpers::{gateway_receipt_tag, validate_donation, DonationRequest, SignatureVerifier, Violation},
    traits::{CompletionOutcome, DonationLedger, FailureOutcome, GatewayOrderRequest, PaymentGateway},
};

pub const SIGNATURE_MISMATCH_NOTE: &str = "Payment signature verification failed";
pub const EXPIRED_NOTE: &str = "Checkout was not completed in time";

/// `DonationFlowApi` is the primary API for the donation lifecycle: taking a donation form through to a gateway order,
/// and turning the gateway's payment confirmation into a completed donation with a receipt number.
pub struct DonationFlowApi<B, G> {
    db: B,
    gateway: G,
    verifier: SignatureVerifier,
    config: DonationFlowConfig,
    producers: EventProducers,
}

impl<B, G> Debug for DonationFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DonationFlowApi ({})", self.config.receipt_prefix)
    }
}

impl<B, G> DonationFlowApi<B, G> {
    pub fn new(
        db: B,
        gateway: G,
        verifier: SignatureVerifier,
        config: DonationFlowConfig,
        producers: EventProducers,
    ) -> Self {
        Self { db, gateway, verifier, config, producers }
    }

    pub fn config(&self) -> &DonationFlowConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> DonationFlowApi<B, G>
where
    B: DonationLedger,
    G: PaymentGateway,
{
    /// Takes a donation form, and if it passes every check, opens a gateway order for it and stores the donation as
    /// `pending`.
    ///
    /// The form is validated first, and then checked for a duplicate submission from the same email within the
    /// de-duplication window. All problems are reported together in [`DonationFlowError::ValidationFailed`]. The
    /// gateway is only contacted once the form is clean, and if it fails no local record is created.
    pub async fn create_order(&self, request: DonationRequest) -> Result<CreatedOrder, DonationFlowError> {
        let now = Utc::now();
        let validated = validate_donation(&request, &self.config.intake);
        let mut violations = match &validated {
            Ok(_) => Vec::new(),
            Err(v) => v.clone(),
        };
        let email = request.donor.as_ref().map(|d| d.email.trim().to_lowercase()).filter(|e| !e.is_empty());
        if let Some(email) = email {
            if self.is_duplicate_submission(&email, now).await? {
                info!("💰️ Duplicate donation submission from {email} rejected");
                violations.push(Violation::DuplicateSubmission { window: self.config.intake.dedup_window });
            }
        }
        let donation = match validated {
            Ok(donation) if violations.is_empty() => donation,
            _ => {
                debug!("💰️ Donation form rejected with {} violations", violations.len());
                return Err(DonationFlowError::ValidationFailed(violations));
            },
        };
        let receipt = gateway_receipt_tag(now);
        let order_request = GatewayOrderRequest::new(
            donation.amount,
            &self.config.currency,
            receipt,
            &donation.donor,
            &donation.purpose,
        );
        let order = self.gateway.create_order(order_request).await.map_err(|e| {
            error!("💰️ Could not open a gateway order for a {} donation. {e}", donation.amount);
            e
        })?;
        let new_donation = NewDonation {
            order_id: order.order_id.clone(),
            donor: donation.donor,
            amount: donation.amount,
            currency: order.currency.clone(),
            purpose: donation.purpose,
            created_at: now,
        };
        let stored = self.db.insert_pending_donation(new_donation).await?;
        info!("💰️ Gateway order [{}] opened for a {} {} donation", order.order_id, order.amount, order.currency);
        Ok(CreatedOrder { order_id: order.order_id, amount: order.amount, currency: order.currency, donation: stored })
    }

    async fn is_duplicate_submission(&self, email: &str, now: DateTime<Utc>) -> Result<bool, DonationFlowError> {
        let window = Duration::from_std(self.config.intake.dedup_window).unwrap_or_else(|_| Duration::minutes(5));
        let recent = self.db.fetch_recent_donation_for_email(email, now - window).await?;
        Ok(recent.is_some())
    }

    /// Processes the payment confirmation for an order.
    ///
    /// If the signature checks out, the donation is completed and a receipt number is issued. Repeating the same
    /// confirmation returns the original receipt. If the signature does not check out, a `pending` donation is marked as
    /// `failed` and [`VerificationOutcome::Rejected`] is returned; a donation that is already completed is never
    /// downgraded.
    ///
    /// Events are only published for fresh transitions, never for replays.
    pub async fn verify_payment(&self, callback: PaymentCallback) -> Result<VerificationOutcome, DonationFlowError> {
        let order_id = callback.order_id.trim();
        if order_id.is_empty() {
            return Err(DonationFlowError::MissingPaymentDetails("order id"));
        }
        let order_id = OrderId::from(order_id);
        let payment_id = callback.payment_id.trim();
        let signature = callback.signature.trim();
        if self.verifier.verify(order_id.as_str(), payment_id, signature) {
            let payment = VerifiedPayment {
                order_id: order_id.clone(),
                payment_id: payment_id.to_string(),
                signature: signature.to_string(),
                paid_at: Utc::now(),
            };
            let outcome = match self.db.complete_donation(payment, &self.config.receipt_prefix).await? {
                CompletionOutcome::Completed(donation) => {
                    self.call_donation_completed_hook(&donation).await;
                    VerificationOutcome::Completed(donation)
                },
                CompletionOutcome::AlreadyCompleted(donation) => VerificationOutcome::AlreadyCompleted(donation),
            };
            log_resubmitted_details(&callback, outcome.donation());
            Ok(outcome)
        } else {
            warn!("💰️ Payment signature for order [{order_id}] (payment {payment_id:?}) does not match");
            let outcome = match self.db.fail_donation(&order_id, SIGNATURE_MISMATCH_NOTE).await? {
                FailureOutcome::Failed(donation) => {
                    self.call_donation_failed_hook(&donation, SIGNATURE_MISMATCH_NOTE).await;
                    donation
                },
                FailureOutcome::Unchanged(donation) => donation,
            };
            Ok(VerificationOutcome::Rejected(outcome))
        }
    }

    /// Marks every `pending` donation older than `max_age` as `failed`. These are checkouts that were abandoned before
    /// the gateway confirmed a payment.
    pub async fn expire_stale_donations(&self, max_age: Duration) -> Result<Vec<Donation>, DonationFlowError> {
        let cutoff = Utc::now() - max_age;
        let expired = self.db.expire_stale_donations(cutoff, EXPIRED_NOTE).await?;
        for donation in &expired {
            info!("🕰️ Donation for order [{}] expired without a confirmed payment", donation.order_id);
            self.call_donation_failed_hook(donation, EXPIRED_NOTE).await;
        }
        Ok(expired)
    }

    async fn call_donation_completed_hook(&self, donation: &Donation) {
        debug!("📬️ Notifying donation completed hook subscribers");
        let event = DonationCompletedEvent::new(donation.clone());
        self.producers.publish_donation_completed(event).await;
    }

    async fn call_donation_failed_hook(&self, donation: &Donation, reason: &str) {
        debug!("📬️ Notifying donation failed hook subscribers");
        let event = DonationFailedEvent::new(donation.clone(), reason);
        self.producers.publish_donation_failed(event).await;
    }
}

/// Donor details and amounts sent along with a payment confirmation are never trusted, but differences from the
/// stored record are worth knowing about.
fn log_resubmitted_details(callback: &PaymentCallback, donation: &Donation) {
    if let Some(donor) = &callback.donor {
        let stored = donation.donor();
        let resubmitted = DonorInfo::new(donor.name.trim(), donor.email.trim(), donor.phone.trim());
        if !resubmitted.email.eq_ignore_ascii_case(&stored.email) || resubmitted.name != stored.name {
            warn!(
                "💰️ Donor details sent with the confirmation for order [{}] differ from the stored record. Using the \
                 stored record.",
                donation.order_id
            );
        }
    }
    if let Some(amount) = callback.amount {
        if (amount * MINOR_UNITS_PER_MAJOR as f64).round() as i64 != donation.amount.value() {
            warn!(
                "💰️ Amount sent with the confirmation for order [{}] ({amount}) differs from the stored amount {}",
                donation.order_id, donation.amount
            );
        }
    }
}
