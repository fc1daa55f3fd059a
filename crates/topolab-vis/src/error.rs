//! Error types for topolab-vis.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use topolab_protocols::Rejection;

/// Result type for topolab-vis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the control surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Topology edit failed
    #[error(transparent)]
    Topology(#[from] topolab_topology::Error),

    /// Configuration change refused
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Backend answered with a failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend unreachable or response unreadable
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A form value could not be applied
    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// An emulation run is already in flight
    #[error("an emulation run is already in progress")]
    Busy,

    /// No capture was taken on this interface
    #[error("no capture for interface {0}")]
    CaptureNotFound(String),

    /// No capture frame at this index
    #[error("no capture frame at index {0}")]
    FrameOutOfRange(usize),

    /// Invalid environment or command line setting
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        use topolab_topology::Error as TopoError;

        let missing = |e: &TopoError| {
            matches!(
                e,
                TopoError::NodeNotFound(_)
                    | TopoError::EdgeNotFound(_)
                    | TopoError::InterfaceNotFound { .. }
            )
        };

        match self {
            Error::Topology(e) | Error::Rejected(Rejection::Topology(e)) if missing(e) => {
                StatusCode::NOT_FOUND
            }
            Error::Topology(_) => StatusCode::CONFLICT,
            Error::Rejected(_) | Error::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Backend(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Serialization(_) => StatusCode::BAD_REQUEST,
            Error::Busy => StatusCode::CONFLICT,
            Error::CaptureNotFound(_) | Error::FrameOutOfRange(_) => StatusCode::NOT_FOUND,
            Error::Config(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request refused");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
