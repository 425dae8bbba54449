//! The Razorpay implementation of the engine's [`PaymentGateway`].
use donation_engine::{
    db_types::OrderId,
    traits::{GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway},
};
use dpg_common::MinorUnits;
use log::*;
use razorpay_tools::{NewRazorpayOrder, RazorpayApi, RazorpayApiError, RazorpayConfig};

#[derive(Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        if !config.is_configured() {
            warn!("💳️ The gateway key id or key secret is missing. Donations cannot be accepted until they are set.");
        }
        let api = RazorpayApi::new(config).map_err(gateway_error)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let order = NewRazorpayOrder {
            amount: request.amount.value(),
            currency: request.currency,
            receipt: request.receipt,
            notes: request.notes,
        };
        let result = self.api.create_order(order).await.map_err(gateway_error)?;
        if result.id.is_empty() {
            return Err(GatewayError::InvalidResponse("The gateway order has no id".to_string()));
        }
        trace!("💳️ Gateway order {} is {}", result.id, result.status);
        Ok(GatewayOrder {
            order_id: OrderId::from(result.id),
            amount: MinorUnits::from(result.amount),
            currency: result.currency,
        })
    }
}

fn gateway_error(e: RazorpayApiError) -> GatewayError {
    match e {
        RazorpayApiError::NotConfigured => GatewayError::NotConfigured(e.to_string()),
        RazorpayApiError::Initialization(s) => GatewayError::NotConfigured(s),
        RazorpayApiError::Timeout => GatewayError::Timeout,
        RazorpayApiError::RestResponseError(s) => GatewayError::Transport(s),
        RazorpayApiError::JsonError(s) => GatewayError::InvalidResponse(s),
        RazorpayApiError::QueryError { status, message } => {
            GatewayError::Rejected(format!("Error {status}. {message}"))
        },
    }
}
