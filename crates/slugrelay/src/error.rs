use std::error::Error as _;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use slugrelay_build::PackageError;
use slugrelay_cloud::ApiError;

/// Errors a relay handler answers with.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("must specify {0}")]
    MissingParam(&'static str),

    /// Upstream refused the operation (it answered 422).
    #[error("no access to {0}")]
    NoAccess(&'static str),

    #[error("Code release not found for {0}")]
    ReleaseNotFound(String),

    /// Request parameters that are present but unusable.
    #[error("{0}")]
    Unprocessable(String),

    #[error(transparent)]
    Api(ApiError),

    #[error(transparent)]
    Package(PackageError),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParam(_) | Self::NoAccess(_) => StatusCode::FORBIDDEN,
            Self::ReleaseNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Api(_) | Self::Package(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `Display` followed by every source, joined with `: `.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl From<ApiError> for RelayError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::InvalidCloud(_) => Self::Unprocessable(e.to_string()),
            e => Self::Api(e),
        }
    }
}

impl From<PackageError> for RelayError {
    fn from(e: PackageError) -> Self {
        match e {
            PackageError::InvalidUrl { .. } => Self::Unprocessable(e.to_string()),
            e => Self::Package(e),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.chain(), "request failed");
            return (status, self.chain()).into_response();
        }

        tracing::info!(%status, reason = %self, "request refused");
        match self {
            Self::Unprocessable(message) => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
