use std::time::Duration;

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    http::{header, KeepAlive},
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use donation_engine::{
    dpe_api::donation_objects::DonationFlowConfig,
    events::EventProducers,
    helpers::SignatureVerifier,
    AdmissionApi,
    DonationFlowApi,
    DonationQueryApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::{notifications::create_notification_handlers, razorpay::RazorpayGateway},
    routes::{health, CreateOrderRoute, DonationStatsRoute, ListDonationsRoute, VerifyPaymentRoute},
};

pub const ACCESS_LOG_TARGET: &str = "dpg::access_log";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        RazorpayGateway::new(config.gateway.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    if config.gateway.key_secret.is_empty() {
        warn!("💻️ DPG_GATEWAY_KEY_SECRET is empty. Every payment confirmation will be rejected.");
    }
    let verifier = SignatureVerifier::new(&config.gateway.key_secret)
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let flow_config = config.flow_config()?;
    let handlers = create_notification_handlers(config.notification_webhook_url.as_deref());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let flow_api =
        DonationFlowApi::new(db.clone(), gateway.clone(), verifier.clone(), flow_config.clone(), producers.clone());
    let admission_api = AdmissionApi::new(db.clone(), config.admission_policy());
    // Not awaited, the worker runs for as long as the server does
    let _worker = start_expiry_worker(flow_api, admission_api, config.pending_donation_timeout);
    let components = ServerComponents { db, gateway, verifier, flow_config, producers };
    let srv = create_server_instance(config, components)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Everything the request handlers share across workers.
#[derive(Clone)]
pub struct ServerComponents {
    pub db: SqliteDatabase,
    pub gateway: RazorpayGateway,
    pub verifier: SignatureVerifier,
    pub flow_config: DonationFlowConfig,
    pub producers: EventProducers,
}

pub fn create_server_instance(config: ServerConfig, components: ServerComponents) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let admission_policy = config.admission_policy();
    let allowed_origins = config.allowed_origins.clone();
    let srv = HttpServer::new(move || {
        let ServerComponents { db, gateway, verifier, flow_config, producers } = components.clone();
        let flow_api = DonationFlowApi::new(db.clone(), gateway, verifier, flow_config, producers);
        let query_api = DonationQueryApi::new(db.clone());
        let admission_api = AdmissionApi::new(db, admission_policy.clone());
        let donations_scope = web::scope("/api/donations")
            .service(CreateOrderRoute::<SqliteDatabase, RazorpayGateway, SqliteDatabase>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(ListDonationsRoute::<SqliteDatabase>::new())
            .service(DonationStatsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(cors_policy(&allowed_origins))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target(ACCESS_LOG_TARGET))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(admission_api))
            .service(health)
            .service(donations_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed request bodies are answered in the same JSON shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not parse request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not parse query string. {err}");
        ServerError::InvalidRequestQuery(err.to_string()).into()
    })
}

/// Only the configured origins may call the API from a browser. `*` allows any origin.
pub fn cors_policy(allowed_origins: &[String]) -> Cors {
    let cors = allowed_origins.iter().fold(Cors::default(), |cors, origin| {
        if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        }
    });
    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}
