//! Admission control middleware for Actix Web.
//!
//! Every request through a wrapped resource is counted against the caller's allowance for the resource's operation.
//! Once the allowance for the current window is spent, the request is answered with a 429 and never reaches the
//! handler.
//!
//! The caller is identified by their remote address (see [`get_remote_ip`]), so the [`ServerOptions`] proxy settings
//! decide whether forwarding headers are trusted.
//!
//! When the admission policy skips successful attempts, an attempt whose response has a 2xx status is handed back
//! after the handler has run, so only failed attempts count towards the limit.
//!
//! The middleware expects `web::Data<AdmissionApi<S>>` and `web::Data<ServerOptions>` to be registered with the app. If
//! the admission API is missing, requests are let through.
use std::{
    future::{ready, Ready},
    marker::PhantomData,
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use chrono::Utc;
use donation_engine::{dpe_api::admission_api::AdmissionDecision, traits::AdmissionStore, AdmissionApi};
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::{config::ServerOptions, errors::ServerError, helpers::get_remote_ip};

const UNKNOWN_ADDRESS: &str = "unknown";

pub struct AdmissionMiddlewareFactory<S> {
    operation: &'static str,
    _store: PhantomData<fn() -> S>,
}

impl<S> AdmissionMiddlewareFactory<S> {
    pub fn new(operation: &'static str) -> Self {
        AdmissionMiddlewareFactory { operation, _store: PhantomData }
    }
}

impl<Srv, B, S> Transform<Srv, ServiceRequest> for AdmissionMiddlewareFactory<S>
where
    Srv: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    Srv::Future: 'static,
    B: 'static,
    S: AdmissionStore + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = AdmissionMiddlewareService<Srv, S>;

    fn new_transform(&self, service: Srv) -> Self::Future {
        ready(Ok(AdmissionMiddlewareService {
            operation: self.operation,
            service: Rc::new(service),
            _store: PhantomData,
        }))
    }
}

pub struct AdmissionMiddlewareService<Srv, S> {
    operation: &'static str,
    service: Rc<Srv>,
    _store: PhantomData<fn() -> S>,
}

impl<Srv, B, S> Service<ServiceRequest> for AdmissionMiddlewareService<Srv, S>
where
    Srv: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    Srv::Future: 'static,
    B: 'static,
    S: AdmissionStore + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let operation = self.operation;
        Box::pin(async move {
            let Some(api) = req.app_data::<web::Data<AdmissionApi<S>>>().cloned() else {
                warn!("🚦️ No admission API is registered. {operation} requests are not rate limited.");
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            };
            let options = req.app_data::<web::Data<ServerOptions>>().map(|o| *o.get_ref()).unwrap_or_default();
            let address = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded)
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());
            match api.check(&address, operation, Utc::now()).await {
                AdmissionDecision::Denied { retry_after_secs, .. } => {
                    let err = ServerError::RateLimited { retry_after_secs };
                    Ok(req.error_response(err).map_into_right_body())
                },
                AdmissionDecision::Allowed(key) => {
                    trace!("🚦️ {operation} request from {address} admitted");
                    let res = service.call(req).await?;
                    if let Some(key) = key {
                        if api.policy().skip_successful && res.status().is_success() {
                            trace!("🚦️ {operation} request from {address} succeeded. Releasing the attempt.");
                            api.release(&key).await;
                        }
                    }
                    Ok(res.map_into_left_body())
                },
            }
        })
    }
}
