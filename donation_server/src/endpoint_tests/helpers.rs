use std::net::SocketAddr;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use donation_engine::{
    dpe_api::{admission_api::AdmissionPolicy, donation_objects::DonationFlowConfig},
    events::EventProducers,
    helpers::{IntakePolicy, SignatureVerifier},
    AdmissionApi,
    DonationFlowApi,
    DonationQueryApi,
};
use dpg_common::Secret;
use serde_json::{json, Value};

use super::mocks::{MemoryAdmissionStore, MockGateway, MockLedger, MockQueries};
use crate::{
    config::ServerOptions,
    routes::{health, CreateOrderRoute, DonationStatsRoute, ListDonationsRoute, VerifyPaymentRoute},
    server::{json_config, query_config},
};

// DO NOT re-use this secret anywhere.
pub const TEST_SECRET: &str = "dpg_endpoint_test_secret";

pub fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(&Secret::new(TEST_SECRET.to_string())).unwrap()
}

pub fn peer(n: u8) -> SocketAddr {
    SocketAddr::from(([192, 0, 2, n], 40_000))
}

/// Registers the full donations API against the given mocks, exactly as the server does.
pub fn configure_app(
    ledger: MockLedger,
    gateway: MockGateway,
    queries: MockQueries,
    policy: AdmissionPolicy,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let flow_config = DonationFlowConfig::new(IntakePolicy::try_default().unwrap());
        let flow_api = DonationFlowApi::new(ledger, gateway, verifier(), flow_config, EventProducers::default());
        let admission_api = AdmissionApi::new(MemoryAdmissionStore::default(), policy);
        cfg.app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(ServerOptions::default()))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(DonationQueryApi::new(queries)))
            .app_data(web::Data::new(admission_api))
            .service(health)
            .service(
                web::scope("/api/donations")
                    .service(CreateOrderRoute::<MockLedger, MockGateway, MemoryAdmissionStore>::new())
                    .service(VerifyPaymentRoute::<MockLedger, MockGateway>::new())
                    .service(ListDonationsRoute::<MockQueries>::new())
                    .service(DonationStatsRoute::<MockQueries>::new()),
            );
    }
}

pub async fn call<S, R, B>(service: &S, req: R) -> (StatusCode, HeaderMap, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(service, req).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = test::read_body(res).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

pub fn donation_form(email: &str, amount: i64) -> Value {
    json!({
        "amount": amount,
        "donor": { "name": "Asha Rao", "email": email, "phone": "98765 43210" },
        "purpose": "Education"
    })
}

pub fn create_order_request(from: SocketAddr, body: &Value) -> TestRequest {
    TestRequest::post().uri("/api/donations/create-order").peer_addr(from).set_json(body)
}

pub fn verify_payment_request(body: &Value) -> TestRequest {
    TestRequest::post().uri("/api/donations/verify-payment").peer_addr(peer(1)).set_json(body)
}
