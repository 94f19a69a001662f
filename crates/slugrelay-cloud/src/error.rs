use std::path::PathBuf;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Upstream answered 422; callers turn this into a "no access" response.
    #[error("upstream rejected {path} as unprocessable: {body}")]
    UnprocessableEntity { path: String, body: String },

    #[error("upstream returned {status} for {path}: {body}")]
    Status {
        path: String,
        status: StatusCode,
        body: String,
    },

    #[error("request to {path} failed")]
    Transport { path: String, source: reqwest::Error },

    #[error("failed to decode response from {path}")]
    Decode { path: String, source: reqwest::Error },

    #[error("upstream response is missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid cloud {0:?}")]
    InvalidCloud(String),

    #[error("failed to read slug {path}")]
    ReadSlug {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create HTTP client for upstream API")]
    HttpClient { source: reqwest::Error },
}

impl ApiError {
    pub fn is_unprocessable(&self) -> bool {
        matches!(self, Self::UnprocessableEntity { .. })
    }
}
