use actix_web::{http::StatusCode, test, test::TestRequest, App};
use donation_engine::{
    db_types::DonationStatus,
    dpe_api::admission_api::AdmissionPolicy,
    traits::{LedgerError, StatusSummary},
};
use dpg_common::MinorUnits;
use serde_json::json;

use super::{
    helpers::{call, configure_app},
    mocks::{donation, MockGateway, MockLedger, MockQueries},
};

fn breakdown() -> Vec<StatusSummary> {
    vec![
        StatusSummary { status: DonationStatus::Completed, count: 2, total_amount: MinorUnits::from(100_000) },
        StatusSummary { status: DonationStatus::Pending, count: 1, total_amount: MinorUnits::from(20_000) },
        StatusSummary { status: DonationStatus::Failed, count: 2, total_amount: MinorUnits::from(5_000) },
    ]
}

#[actix_web::test]
async fn list_donations() {
    let _ = env_logger::try_init().ok();
    let mut queries = MockQueries::new();
    queries
        .expect_search_donations()
        .withf(|q| q.offset == 2 && q.limit == 2 && q.status == Some(DonationStatus::Completed))
        .times(1)
        .returning(|_| Ok(vec![donation("order_N2", DonationStatus::Completed)]));
    queries.expect_count_donations().withf(|s| *s == Some(DonationStatus::Completed)).returning(|_| Ok(3));
    queries.expect_status_breakdown().returning(|| Ok(breakdown()));
    let app = configure_app(MockLedger::new(), MockGateway::new(), queries, AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let req = TestRequest::get().uri("/api/donations?page=2&limit=2&status=completed").to_request();
    let (status, _, body) = call(&service, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"], json!({ "total": 3, "page": 2, "pages": 2, "limit": 2 }));
    assert_eq!(body["donations"].as_array().unwrap().len(), 1);
    assert_eq!(body["donations"][0]["orderId"], "order_N2");
    assert!(body["donations"][0].get("signature").is_none());
    assert_eq!(body["statistics"]["totalDonations"], 5);
    assert_eq!(body["statistics"]["totalAmountRaised"], 100_000);
    assert_eq!(body["statistics"]["completedCount"], 2);
    assert_eq!(body["statistics"]["statusBreakdown"][0], json!({ "status": "completed", "count": 2, "totalAmount": 100_000 }));
}

#[actix_web::test]
async fn list_donations_defaults() {
    let _ = env_logger::try_init().ok();
    let mut queries = MockQueries::new();
    queries
        .expect_search_donations()
        .withf(|q| q.offset == 0 && q.limit == 20 && q.status.is_none())
        .returning(|_| Ok(vec![]));
    queries.expect_count_donations().returning(|_| Ok(0));
    queries.expect_status_breakdown().returning(|| Ok(vec![]));
    let app = configure_app(MockLedger::new(), MockGateway::new(), queries, AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let (status, _, body) = call(&service, TestRequest::get().uri("/api/donations").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"], json!({ "total": 0, "page": 1, "pages": 0, "limit": 20 }));
}

#[actix_web::test]
async fn list_donations_with_unknown_status() {
    let _ = env_logger::try_init().ok();
    let mut queries = MockQueries::new();
    queries.expect_search_donations().never();
    let app = configure_app(MockLedger::new(), MockGateway::new(), queries, AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let req = TestRequest::get().uri("/api/donations?status=refunded").to_request();
    let (status, _, body) = call(&service, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn donation_stats() {
    let _ = env_logger::try_init().ok();
    let mut queries = MockQueries::new();
    queries.expect_status_breakdown().returning(|| Ok(breakdown()));
    queries
        .expect_fetch_recent_completed()
        .withf(|_, limit| *limit == 10)
        .returning(|_, _| Ok(vec![donation("order_N2", DonationStatus::Completed)]));
    let app = configure_app(MockLedger::new(), MockGateway::new(), queries, AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let (status, _, body) = call(&service, TestRequest::get().uri("/api/donations/stats").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["stats"];
    assert_eq!(stats["total"], 5);
    assert_eq!(stats["completed"], 2);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["failed"], 2);
    assert_eq!(stats["totalAmount"], 100_000);
    assert_eq!(stats["recentDonations"][0]["receiptNumber"], "ORG-2025-000007");
}

#[actix_web::test]
async fn database_errors_are_hidden() {
    let _ = env_logger::try_init().ok();
    let mut queries = MockQueries::new();
    queries.expect_status_breakdown().returning(|| Err(LedgerError::DatabaseError("database is locked".into())));
    let app = configure_app(MockLedger::new(), MockGateway::new(), queries, AdmissionPolicy::default());
    let service = test::init_service(App::new().configure(app)).await;
    let (status, _, body) = call(&service, TestRequest::get().uri("/api/donations/stats").to_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["message"].as_str().unwrap().contains("locked"));
}
