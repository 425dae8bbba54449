//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use donation_engine::{
    dpe_api::donation_objects::VerificationOutcome,
    helpers::DonationRequest,
    traits::{DonationLedger, DonationQueries, PaymentGateway},
    DonationFlowApi,
    DonationQueryApi,
};
use log::*;

use crate::{
    data_objects::{
        CreateOrderResponse,
        DonationListingResponse,
        DonationStatsResponse,
        JsonResponse,
        ListDonationsParams,
        VerifyPaymentRequest,
        VerifyPaymentResponse,
        PAYMENT_REJECTED_MESSAGE,
    },
    errors::ServerError,
};

/// The operation name that create-order attempts are counted under.
pub const CREATE_ORDER_OPERATION: &str = "create-order";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    // Same as above, but every call is first counted against the caller's admission allowance for `$op`. The last type
    // parameter is the admission store.
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ ; admission $op:expr) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ S >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ core::marker::PhantomData<fn() -> S> );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ S > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ S > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+ core::marker::PhantomData::<fn() -> S>)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+ S> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+ S>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
            S: donation_engine::traits::AdmissionStore + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AdmissionMiddlewareFactory::<S>::new($op));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(JsonResponse::success("👍️"))
}

route!(create_order => Post "/create-order" impl DonationLedger, PaymentGateway; admission CREATE_ORDER_OPERATION);
/// Route handler for the create-order endpoint
///
/// Validates the donation form, opens an order with the payment gateway, and records the donation as pending. The
/// response carries the gateway order id the checkout widget needs.
pub async fn create_order<B, G>(
    body: web::Json<DonationRequest>,
    api: web::Data<DonationFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: DonationLedger,
    G: PaymentGateway,
{
    debug!("💻️ POST create-order");
    let order = api.create_order(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CreateOrderResponse::from(order)))
}

route!(verify_payment => Post "/verify-payment" impl DonationLedger, PaymentGateway);
/// Route handler for the verify-payment endpoint
///
/// A confirmation whose signature checks out completes the donation and returns its receipt. Replaying the same
/// confirmation returns the same receipt. A confirmation with a bad signature fails the donation and returns a 400.
pub async fn verify_payment<B, G>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<DonationFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: DonationLedger,
    G: PaymentGateway,
{
    let callback = body.into_inner();
    debug!("💻️ POST verify-payment for order [{}]", callback.order_id);
    match api.verify_payment(callback.into()).await? {
        VerificationOutcome::Completed(donation) => {
            info!(
                "💻️ Donation of {} {} for order [{}] completed. Receipt {}",
                donation.amount,
                donation.currency,
                donation.order_id,
                donation.receipt_number.as_deref().unwrap_or("-")
            );
            Ok(HttpResponse::Ok().json(VerifyPaymentResponse::verified(&donation)))
        },
        VerificationOutcome::AlreadyCompleted(donation) => {
            debug!("💻️ Payment confirmation for order [{}] was replayed", donation.order_id);
            Ok(HttpResponse::Ok().json(VerifyPaymentResponse::verified(&donation)))
        },
        VerificationOutcome::Rejected(donation) => {
            debug!("💻️ Payment confirmation for order [{}] rejected. Status is {}", donation.order_id, donation.status);
            Ok(HttpResponse::BadRequest().json(JsonResponse::failure(PAYMENT_REJECTED_MESSAGE)))
        },
    }
}

route!(list_donations => Get "" impl DonationQueries);
/// Route handler for the donation listing
///
/// Donations come back newest first, `limit` (at most 100) to a page, along with the overall statistics.
pub async fn list_donations<B: DonationQueries>(
    params: web::Query<ListDonationsParams>,
    api: web::Data<DonationQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ListDonationsParams { page, limit, status } = params.into_inner();
    debug!("💻️ GET donations page {page:?}, limit {limit:?}, status {status:?}");
    let listing = api.list_donations(page, limit, status).await?;
    Ok(HttpResponse::Ok().json(DonationListingResponse { success: true, listing }))
}

route!(donation_stats => Get "/stats" impl DonationQueries);
pub async fn donation_stats<B: DonationQueries>(
    api: web::Data<DonationQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET donation stats");
    let stats = api.donation_stats(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(DonationStatsResponse { success: true, stats }))
}
