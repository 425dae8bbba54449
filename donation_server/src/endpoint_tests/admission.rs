use actix_web::{
    http::{header::RETRY_AFTER, StatusCode},
    test,
    App,
};
use donation_engine::{
    db_types::{DonationStatus, OrderId},
    dpe_api::admission_api::AdmissionPolicy,
    traits::{FailureOutcome, GatewayOrder},
};
use serde_json::json;

use super::{
    helpers::{call, configure_app, create_order_request, donation_form, peer, verify_payment_request},
    mocks::{donation, MockGateway, MockLedger, MockQueries},
};

fn successful_ledger(times: usize) -> MockLedger {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_recent_donation_for_email().times(times).returning(|_, _| Ok(None));
    ledger
        .expect_insert_pending_donation()
        .times(times)
        .returning(|d| Ok(donation(d.order_id.as_str(), DonationStatus::Pending)));
    ledger
}

fn successful_gateway(times: usize) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().times(times).returning(|req| {
        Ok(GatewayOrder { order_id: OrderId::from(req.receipt.as_str()), amount: req.amount, currency: req.currency })
    });
    gateway
}

#[actix_web::test]
async fn fourth_attempt_is_rate_limited() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    // Three attempts from the first address, and one from the second. The rate-limited attempt never gets this far.
    ledger.expect_fetch_recent_donation_for_email().times(4).returning(|_, _| Ok(None));
    ledger.expect_insert_pending_donation().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().never();
    let app = configure_app(ledger, gateway, MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let form = donation_form("asha@example.org", 0);
    for _ in 0..3 {
        let (status, _, _) = call(&service, create_order_request(peer(1), &form).to_request()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, headers, body) = call(&service, create_order_request(peer(1), &form).to_request()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let retry_after = headers.get(RETRY_AFTER).unwrap().to_str().unwrap().parse::<u64>().unwrap();
    assert!((1..=300).contains(&retry_after));
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Too many donation attempts detected. This is for security purposes.");
    assert_eq!(body["retryAfter"], retry_after);
    assert!(body["timestamp"].is_string());
    // Other addresses are unaffected
    let (status, _, _) = call(&service, create_order_request(peer(2), &form).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn successful_attempts_are_not_counted() {
    let _ = env_logger::try_init().ok();
    let app = configure_app(successful_ledger(5), successful_gateway(5), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    for i in 0..5 {
        let form = donation_form(&format!("donor{i}@example.org"), 100);
        let (status, _, body) = call(&service, create_order_request(peer(1), &form).to_request()).await;
        assert_eq!(status, StatusCode::OK, "Attempt {i} failed: {body}");
        assert_eq!(body["amount"], json!(10_000));
    }
}

#[actix_web::test]
async fn successful_attempts_count_when_configured() {
    let _ = env_logger::try_init().ok();
    let policy = AdmissionPolicy { skip_successful: false, ..AdmissionPolicy::default() };
    let app = configure_app(successful_ledger(3), successful_gateway(3), MockQueries::new(), policy);
    let service = test::init_service(App::new().configure(app)).await;
    for i in 0..3 {
        let form = donation_form(&format!("donor{i}@example.org"), 100);
        let (status, _, _) = call(&service, create_order_request(peer(1), &form).to_request()).await;
        assert_eq!(status, StatusCode::OK);
    }
    let form = donation_form("donor4@example.org", 100);
    let (status, _, _) = call(&service, create_order_request(peer(1), &form).to_request()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn payment_confirmations_are_never_rate_limited() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_fail_donation()
        .times(6)
        .returning(|id, _| Ok(FailureOutcome::Unchanged(donation(id.as_str(), DonationStatus::Failed))));
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({ "orderId": "order_N1", "paymentId": "pay_1", "signature": "bad" });
    for _ in 0..6 {
        let (status, _, _) = call(&service, verify_payment_request(&body).to_request()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
