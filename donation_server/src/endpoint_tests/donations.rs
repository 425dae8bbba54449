use actix_web::{http::StatusCode, test, test::TestRequest, App};
use donation_engine::{
    db_types::{DonationStatus, OrderId},
    dpe_api::admission_api::AdmissionPolicy,
    traits::{CompletionOutcome, FailureOutcome, GatewayError, GatewayOrder, LedgerError},
};
use dpg_common::MinorUnits;
use serde_json::json;

use super::{
    helpers::{call, configure_app, create_order_request, donation_form, peer, verifier, verify_payment_request},
    mocks::{donation, MockGateway, MockLedger, MockQueries},
};

fn gateway_issuing(order_id: &'static str) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().returning(move |req| {
        Ok(GatewayOrder { order_id: OrderId::from(order_id), amount: req.amount, currency: req.currency })
    });
    gateway
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let app = configure_app(MockLedger::new(), MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let (status, _, body) = call(&service, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_fetch_recent_donation_for_email()
        .withf(|email, _| email.to_string() == "asha@example.org")
        .times(1)
        .returning(|_, _| Ok(None));
    ledger
        .expect_insert_pending_donation()
        .withf(|d| {
            d.order_id.as_str() == "order_N1" &&
                d.amount == MinorUnits::from(50_000) &&
                d.donor.phone == "9876543210" &&
                d.purpose == "Education"
        })
        .times(1)
        .returning(|_| Ok(donation("order_N1", DonationStatus::Pending)));
    let app = configure_app(ledger, gateway_issuing("order_N1"), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let req = create_order_request(peer(1), &donation_form("Asha@Example.org", 500)).to_request();
    let (status, _, body) = call(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "id": "order_N1", "amount": 50_000, "currency": "INR" }));
}

#[actix_web::test]
async fn create_order_with_invalid_form() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_recent_donation_for_email().returning(|_, _| Ok(None));
    ledger.expect_insert_pending_donation().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().never();
    let app = configure_app(ledger, gateway, MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    for amount in [0, 500_001] {
        let req = create_order_request(peer(1), &donation_form("asha@example.org", amount)).to_request();
        let (status, _, body) = call(&service, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"], json!(["Amount must be between ₹1 and ₹5,00,000"]));
    }
}

#[actix_web::test]
async fn create_order_with_amount_as_text() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_recent_donation_for_email().returning(|_, _| Ok(None));
    ledger
        .expect_insert_pending_donation()
        .withf(|d| d.amount == MinorUnits::from(150_000))
        .times(1)
        .returning(|_| Ok(donation("order_N1", DonationStatus::Pending)));
    let app = configure_app(ledger, gateway_issuing("order_N1"), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;

    let mut form = donation_form("asha@example.org", 0);
    form["amount"] = json!("1500");
    let (status, _, body) = call(&service, create_order_request(peer(1), &form).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], 150_000);

    let form = json!({ "amount": "lots", "donor": { "name": "Asha Rao", "email": "asha@example.org", "phone": null } });
    let (status, _, body) = call(&service, create_order_request(peer(2), &form).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["errors"],
        json!(["Amount must be between ₹1 and ₹5,00,000", "Please enter a valid Indian phone number (10 digits)"])
    );
}

#[actix_web::test]
async fn create_order_reports_every_violation() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_recent_donation_for_email().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().never();
    let app = configure_app(ledger, gateway, MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let form = json!({ "amount": 100, "donor": { "name": "A", "email": "", "phone": "12345" } });
    let req = create_order_request(peer(1), &form).to_request();
    let (status, _, body) = call(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn duplicate_submissions_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_fetch_recent_donation_for_email()
        .returning(|_, _| Ok(Some(donation("order_N0", DonationStatus::Pending))));
    ledger.expect_insert_pending_donation().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().never();
    let app = configure_app(ledger, gateway, MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let req = create_order_request(peer(1), &donation_form("asha@example.org", 500)).to_request();
    let (status, _, body) = call(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Please wait 5 minutes between donations from the same email"]));
}

#[actix_web::test]
async fn gateway_failures_leave_no_record() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_recent_donation_for_email().returning(|_, _| Ok(None));
    ledger.expect_insert_pending_donation().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_order().times(1).returning(|_| Err(GatewayError::Timeout));
    let app = configure_app(ledger, gateway, MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let req = create_order_request(peer(1), &donation_form("asha@example.org", 500)).to_request();
    let (status, _, body) = call(&service, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(!body["message"].as_str().unwrap().contains("gateway"));
}

#[actix_web::test]
async fn malformed_body() {
    let _ = env_logger::try_init().ok();
    let app = configure_app(MockLedger::new(), MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let req = TestRequest::post()
        .uri("/api/donations/verify-payment")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let (status, _, body) = call(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn verify_payment() {
    let _ = env_logger::try_init().ok();
    let signature = verifier().sign("order_N1", "pay_NfN4Zz1");
    let expected_signature = signature.clone();
    let mut ledger = MockLedger::new();
    ledger
        .expect_complete_donation()
        .withf(move |p, prefix| {
            p.order_id.as_str() == "order_N1" &&
                p.payment_id == "pay_NfN4Zz1" &&
                p.signature == expected_signature &&
                prefix.to_string() == "ORG"
        })
        .times(1)
        .returning(|_, _| Ok(CompletionOutcome::Completed(donation("order_N1", DonationStatus::Completed))));
    ledger.expect_fail_donation().never();
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({
        "razorpay_order_id": "order_N1",
        "razorpay_payment_id": "pay_NfN4Zz1",
        "razorpay_signature": signature,
        "donor": { "name": "Asha Rao", "email": "asha@example.org", "phone": "9876543210" },
        "amount": 500
    });
    let (status, _, body) = call(&service, verify_payment_request(&body).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment verified successfully! Thank you for your generous donation.");
    assert_eq!(body["donation"]["receiptNumber"], "ORG-2025-000007");
    assert_eq!(body["donation"]["paymentId"], "pay_NfN4Zz1");
    assert_eq!(body["donation"]["amount"], 50_000);
    assert_eq!(body["donation"]["status"], "completed");
    assert_eq!(body["donation"]["date"], "2025-03-01T10:32:00Z");
}

#[actix_web::test]
async fn confirmation_with_form_values_still_completes() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_complete_donation()
        .times(3)
        .returning(|_, _| Ok(CompletionOutcome::Completed(donation("order_N1", DonationStatus::Completed))));
    ledger.expect_fail_donation().never();
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let signature = verifier().sign("order_N1", "pay_NfN4Zz1");
    for amount in [json!("500"), json!("five hundred"), json!(null)] {
        let body = json!({
            "razorpay_order_id": "order_N1",
            "razorpay_payment_id": "pay_NfN4Zz1",
            "razorpay_signature": signature,
            "donor": { "name": "Asha Rao", "email": "asha@example.org", "phone": null },
            "amount": amount
        });
        let (status, _, body) = call(&service, verify_payment_request(&body).to_request()).await;
        assert_eq!(status, StatusCode::OK, "amount {amount}");
        assert_eq!(body["donation"]["receiptNumber"], "ORG-2025-000007");
    }
}

#[actix_web::test]
async fn replayed_confirmation_returns_the_same_receipt() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    let mut first = true;
    ledger.expect_complete_donation().times(2).returning(move |_, _| {
        let d = donation("order_N1", DonationStatus::Completed);
        if std::mem::replace(&mut first, false) {
            Ok(CompletionOutcome::Completed(d))
        } else {
            Ok(CompletionOutcome::AlreadyCompleted(d))
        }
    });
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({
        "orderId": "order_N1",
        "paymentId": "pay_NfN4Zz1",
        "signature": verifier().sign("order_N1", "pay_NfN4Zz1"),
    });
    let (status1, _, body1) = call(&service, verify_payment_request(&body).to_request()).await;
    let (status2, _, body2) = call(&service, verify_payment_request(&body).to_request()).await;
    assert_eq!(status1, StatusCode::OK);
    assert_eq!(status2, StatusCode::OK);
    assert_eq!(body1["donation"]["receiptNumber"], body2["donation"]["receiptNumber"]);
}

#[actix_web::test]
async fn bad_signature_fails_the_donation() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_complete_donation().never();
    ledger
        .expect_fail_donation()
        .withf(|id, _| id.as_str() == "order_N1")
        .times(1)
        .returning(|_, _| Ok(FailureOutcome::Failed(donation("order_N1", DonationStatus::Failed))));
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({
        "orderId": "order_N1",
        "paymentId": "pay_NfN4Zz1",
        "signature": verifier().sign("order_N1", "pay_someone_else"),
    });
    let (status, _, body) = call(&service, verify_payment_request(&body).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "Payment verification failed" }));
}

#[actix_web::test]
async fn forged_confirmation_does_not_touch_a_completed_donation() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_fail_donation()
        .times(1)
        .returning(|_, _| Ok(FailureOutcome::Unchanged(donation("order_N1", DonationStatus::Completed))));
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({ "orderId": "order_N1", "paymentId": "pay_NfN4Zz1", "signature": "00ff" });
    let (status, _, body) = call(&service, verify_payment_request(&body).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn confirmation_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_complete_donation()
        .returning(|p, _| Err(LedgerError::DonationNotFound(p.order_id.clone())));
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({
        "orderId": "order_unknown",
        "paymentId": "pay_1",
        "signature": verifier().sign("order_unknown", "pay_1"),
    });
    let (status, _, body) = call(&service, verify_payment_request(&body).to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn confirmation_for_failed_donation() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger
        .expect_complete_donation()
        .returning(|p, _| Err(LedgerError::DonationAlreadyFailed(p.order_id.clone())));
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({
        "orderId": "order_N1",
        "paymentId": "pay_1",
        "signature": verifier().sign("order_N1", "pay_1"),
    });
    let (status, _, body) = call(&service, verify_payment_request(&body).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "The donation for order order_N1 has already failed");
}

#[actix_web::test]
async fn confirmation_without_order_id() {
    let _ = env_logger::try_init().ok();
    let mut ledger = MockLedger::new();
    ledger.expect_complete_donation().never();
    ledger.expect_fail_donation().never();
    let app = configure_app(ledger, MockGateway::new(), MockQueries::new(), AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let body = json!({ "paymentId": "pay_1", "signature": "abcd" });
    let (status, _, body) = call(&service, verify_payment_request(&body).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
