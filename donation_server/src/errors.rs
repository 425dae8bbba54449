use actix_web::{
    error::ResponseError,
    http::{
        header::{ContentType, RETRY_AFTER},
        StatusCode,
    },
    HttpResponse,
};
use chrono::Utc;
use donation_engine::{helpers::Violation, traits::LedgerError, DonationFlowError};
use log::error;
use serde_json::json;
use thiserror::Error;

pub const RATE_LIMITED_MESSAGE: &str = "Too many donation attempts detected. This is for security purposes.";
const GENERIC_ERROR_MESSAGE: &str = "Something went wrong on our side. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request query: {0}")]
    InvalidRequestQuery(String),
    #[error("Validation failed")]
    ValidationFailed(Vec<Violation>),
    #[error("{0}")]
    DonationAlreadyFailed(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The payment gateway could not be reached. {0}")]
    GatewayError(String),
    #[error("Too many donation attempts detected. This is for security purposes.")]
    RateLimited { retry_after_secs: u64 },
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestQuery(_) => StatusCode::BAD_REQUEST,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::DonationAlreadyFailed(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::GatewayError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        response.insert_header(ContentType::json());
        let body = match self {
            Self::ValidationFailed(violations) => {
                let errors = violations.iter().map(|v| v.to_string()).collect::<Vec<String>>();
                json!({ "success": false, "message": self.to_string(), "errors": errors })
            },
            Self::RateLimited { retry_after_secs } => {
                response.insert_header((RETRY_AFTER, retry_after_secs.to_string()));
                json!({
                    "success": false,
                    "error": RATE_LIMITED_MESSAGE,
                    "retryAfter": retry_after_secs,
                    "timestamp": Utc::now().to_rfc3339(),
                })
            },
            // Internal details are logged where they happen and never leak to the client
            _ if self.status_code().is_server_error() => json!({ "success": false, "message": GENERIC_ERROR_MESSAGE }),
            _ => json!({ "success": false, "message": self.to_string() }),
        };
        response.body(body.to_string())
    }
}

impl From<DonationFlowError> for ServerError {
    fn from(e: DonationFlowError) -> Self {
        match e {
            DonationFlowError::ValidationFailed(violations) => Self::ValidationFailed(violations),
            DonationFlowError::MissingPaymentDetails(_) => Self::InvalidRequestBody(e.to_string()),
            DonationFlowError::Gateway(e) => Self::GatewayError(e.to_string()),
            DonationFlowError::DonationNotFound(_) => Self::NoRecordFound(e.to_string()),
            DonationFlowError::DonationAlreadyFailed(_) => Self::DonationAlreadyFailed(e.to_string()),
            DonationFlowError::DatabaseError(s) => {
                error!("💻️ Database error while handling a donation. {s}");
                Self::BackendError(s)
            },
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DonationNotFound(_) => Self::NoRecordFound(e.to_string()),
            _ => {
                error!("💻️ Database error. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}
