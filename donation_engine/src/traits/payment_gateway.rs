use thiserror::Error;

use crate::traits::data_objects::{GatewayOrder, GatewayOrderRequest};

/// The remote payment provider. The engine only ever asks it to open orders; completion is reported back by the
/// donor's browser with a signature that the engine checks itself.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway is not configured: {0}")]
    NotConfigured(String),
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("The payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("Could not communicate with the payment gateway: {0}")]
    Transport(String),
    #[error("The payment gateway returned an unexpected response: {0}")]
    InvalidResponse(String),
}
