use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use buildlink_ai::AiError;
use buildlink_core::{AccountError, MessagingError, PortalError};
use buildlink_types::api::ErrorResponse;

/// Everything a handler can fail with. Rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::Account(e) => Self::Account(e),
            PortalError::Messaging(e) => Self::Messaging(e),
            PortalError::Storage(e) => Self::Internal(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Account(e) => match e {
                AccountError::MissingFields
                | AccountError::PasswordMismatch
                | AccountError::WeakPassword
                | AccountError::NotAnArchitect
                | AccountError::VerificationNotApplicable => StatusCode::BAD_REQUEST,
                AccountError::EmailTaken
                | AccountError::VerificationPending
                | AccountError::AlreadyVerified
                | AccountError::VerificationNotSubmitted => StatusCode::CONFLICT,
                AccountError::UnknownUser => StatusCode::NOT_FOUND,
                AccountError::IncorrectPassword => StatusCode::UNAUTHORIZED,
                AccountError::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Messaging(e) => match e {
                MessagingError::EmptyBody | MessagingError::SelfMessage => StatusCode::BAD_REQUEST,
                MessagingError::UnknownRecipient | MessagingError::ConversationNotFound => {
                    StatusCode::NOT_FOUND
                }
            },
            Self::Ai(AiError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Ai(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(e) = &self {
            error!("Internal error: {:#}", e);
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
