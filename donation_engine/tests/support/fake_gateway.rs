use std::sync::atomic::{AtomicU64, Ordering};

use donation_engine::{
    db_types::OrderId,
    traits::{GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway},
};

/// A gateway that hands out sequential order ids, and counts how often it was called.
#[derive(Default)]
pub struct FakeGateway {
    calls: AtomicU64,
    failing: bool,
}

impl FakeGateway {
    pub fn failing() -> Self {
        Self { calls: AtomicU64::new(0), failing: true }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing {
            return Err(GatewayError::Timeout);
        }
        Ok(GatewayOrder {
            order_id: OrderId(format!("order_fake{n:010}")),
            amount: request.amount,
            currency: request.currency,
        })
    }
}
