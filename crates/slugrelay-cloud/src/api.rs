use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// The upstream release API, one method per remote call.
///
/// [`HttpPlatformClient`](crate::HttpPlatformClient) talks to the real
/// service; tests substitute a mock.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// `GET /apps/{app}/releases/new`
    async fn create_pending_release(&self, app: &str) -> Result<PendingRelease, ApiError>;

    /// `PUT` the slug file to a pre-signed upload URL.
    async fn upload_slug(&self, upload_url: &str, slug: &Path) -> Result<(), ApiError>;

    /// `POST /apps/{app}/releases`, returning the raw response object.
    async fn finalize_release(
        &self,
        app: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value, ApiError>;

    /// `GET /account`, returning the acting user's email.
    async fn current_user_email(&self) -> Result<String, ApiError>;

    /// `GET /apps/{app}/releases`, oldest first.
    async fn list_releases(&self, app: &str) -> Result<Vec<Release>, ApiError>;

    /// `GET /apps/{app}/release_slug`
    async fn get_release_slug(&self, app: &str) -> Result<ReleaseSlug, ApiError>;
}

/// Placeholder release issued by upstream before the slug is uploaded.
///
/// Every field is kept so it can be echoed back when finalizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingRelease(pub Map<String, Value>);

impl PendingRelease {
    pub fn upload_url(&self) -> Result<&str, ApiError> {
        self.0
            .get("slug_put_url")
            .and_then(Value::as_str)
            .ok_or(ApiError::MissingField("slug_put_url"))
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

/// One entry of an app's release history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub name: Option<String>,
    /// Head identifier the release was built from.
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Current slug of an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSlug {
    #[serde(default)]
    pub name: Option<String>,
    pub slug_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Account {
    pub email: String,
}
