use thiserror::Error;

/// Errors produced anywhere in the tracker, from form validation to storage
///
/// The `Display` text of the user-facing variants is what ends up in the
/// `{"msg": ...}` body of an HTTP error response.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A submitted form or request body failed validation
    #[error("{0}")]
    Validation(String),

    /// The request carried no bearer token
    #[error("Missing Authorization Header")]
    MissingToken,

    /// The bearer token could not be decoded or verified
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A unique value (username, email) is already taken
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad or missing configuration value
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Non-success response returned by the tracker API to a client
    #[error("{msg} (HTTP {status})")]
    Api { status: u16, msg: String },

    /// Transport failure while talking to the tracker API
    #[error("request failed: {0}")]
    Http(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for TrackerError {
    fn from(err: bincode::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(feature = "web")]
mod response {
    use super::TrackerError;
    use axum::{
        Json,
        extract::rejection::JsonRejection,
        http::StatusCode,
        response::{IntoResponse, Response},
    };

    /// Unreadable request bodies are client errors
    impl From<JsonRejection> for TrackerError {
        fn from(rejection: JsonRejection) -> Self {
            TrackerError::Validation(rejection.body_text())
        }
    }

    impl TrackerError {
        /// HTTP status used when this error is returned from a handler
        pub fn status_code(&self) -> StatusCode {
            match self {
                TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
                TrackerError::MissingToken
                | TrackerError::InvalidToken(_)
                | TrackerError::TokenExpired
                | TrackerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                TrackerError::Conflict(_) => StatusCode::CONFLICT,
                TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
                TrackerError::Api { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                TrackerError::Http(_) => StatusCode::BAD_GATEWAY,
                TrackerError::Config(_)
                | TrackerError::Storage(_)
                | TrackerError::Serialization(_)
                | TrackerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for TrackerError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            let msg = if status.is_server_error() {
                log::error!("request failed: {}", self);
                "Internal server error".to_string()
            } else {
                self.to_string()
            };

            (status, Json(serde_json::json!({ "msg": msg }))).into_response()
        }
    }
}
