// app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use wanderkart_flow::FlowError;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication required: {0}")]
  Unauthenticated(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Gateway Error: {0}")]
  Gateway(#[from] GatewayError),

  #[error("Workflow Error: {0}")]
  Workflow(#[from] FlowError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Message safe to show to end users. Gateway and internal causes are only logged.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::Unauthenticated(m) | AppError::NotFound(m) | AppError::Payment(m) => {
        m.clone()
      }
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Gateway(_) => "Data service request failed".to_string(),
      AppError::Workflow(_) => "Workflow processing error".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<GatewayError>() {
      Ok(gateway_err) => AppError::Gateway(gateway_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Gateway(GatewayError::Conflict { .. }) => StatusCode::CONFLICT,
      AppError::Gateway(GatewayError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Workflow(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    HttpResponse::build(self.status_code()).json(json!({ "error": self.public_message(), "notices": [] }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
