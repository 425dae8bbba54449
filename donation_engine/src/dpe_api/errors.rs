use thiserror::Error;

use crate::{
    db_types::OrderId,
    helpers::Violation,
    traits::{GatewayError, LedgerError},
};

#[derive(Debug, Clone, Error)]
pub enum DonationFlowError {
    #[error("Validation failed: {}", .0.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; "))]
    ValidationFailed(Vec<Violation>),
    #[error("The payment confirmation is missing the {0}")]
    MissingPaymentDetails(&'static str),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("Donation record not found for order {0}")]
    DonationNotFound(OrderId),
    #[error("The donation for order {0} has already failed")]
    DonationAlreadyFailed(OrderId),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerError> for DonationFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DonationNotFound(id) => Self::DonationNotFound(id),
            LedgerError::DonationAlreadyFailed(id) => Self::DonationAlreadyFailed(id),
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerError::DuplicateOrder(id) => Self::DatabaseError(format!("Order {id} already exists")),
        }
    }
}
