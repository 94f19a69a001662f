use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::api::{Account, PendingRelease, PlatformApi, Release, ReleaseSlug};
use crate::error::ApiError;

/// reqwest-backed [`PlatformApi`] for one cloud and one API key.
pub struct HttpPlatformClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    upload_timeout: Option<Duration>,
}

impl std::fmt::Debug for HttpPlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlatformClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("upload_timeout", &self.upload_timeout)
            .finish()
    }
}

impl HttpPlatformClient {
    /// `base_url` must be an absolute http(s) URL; a path prefix is kept.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: SecretString,
    ) -> Result<Self, ApiError> {
        let parsed = match Url::parse(base_url) {
            Ok(url) if !url.cannot_be_a_base() => url,
            // arch-lint: allow(no-error-swallowing) reason="the cloud name is the actionable part; the parse detail adds nothing"
            _ => return Err(ApiError::InvalidCloud(base_url.to_owned())),
        };
        Ok(Self {
            http,
            base_url: parsed,
            api_key,
            upload_timeout: None,
        })
    }

    /// Per-request timeout for slug uploads, replacing the client-wide one.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for `segments` below the base. Each segment is percent-encoded,
    /// so an app name can never add path components or a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidCloud(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated request against the API host. The user part of the
    /// Basic credentials is empty; the API key is the password.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth("", Some(self.api_key.expose_secret()))
            .header(header::ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Transport {
            path: path.to_owned(),
            source: e,
        })?;
        check_status(response, path).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_owned();
        tracing::debug!(path, "GET");
        let response = self.send(self.request(Method::GET, url), &path).await?;
        decode(response, &path).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &Map<String, Value>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_owned();
        tracing::debug!(path, "POST");
        let response = self
            .send(self.request(Method::POST, url).json(body), &path)
            .await?;
        decode(response, &path).await
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn create_pending_release(&self, app: &str) -> Result<PendingRelease, ApiError> {
        self.get_json(&["apps", app, "releases", "new"]).await
    }

    async fn upload_slug(&self, upload_url: &str, slug: &Path) -> Result<(), ApiError> {
        let bytes = tokio::fs::read(slug)
            .await
            .map_err(|e| ApiError::ReadSlug {
                path: slug.to_path_buf(),
                source: e,
            })?;
        let size = bytes.len();
        let shown = redact(upload_url);

        // Pre-signed URL: no API credentials and no content type.
        let mut request = self.http.put(upload_url).body(bytes);
        if let Some(timeout) = self.upload_timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                path: shown.clone(),
                source: e,
            })?;
        check_status(response, &shown).await?;

        tracing::info!(url = %shown, bytes = size, "slug uploaded");
        Ok(())
    }

    async fn finalize_release(
        &self,
        app: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        self.post_json(&["apps", app, "releases"], payload).await
    }

    async fn current_user_email(&self) -> Result<String, ApiError> {
        let account: Account = self.get_json(&["account"]).await?;
        Ok(account.email)
    }

    async fn list_releases(&self, app: &str) -> Result<Vec<Release>, ApiError> {
        self.get_json(&["apps", app, "releases"]).await
    }

    async fn get_release_slug(&self, app: &str) -> Result<ReleaseSlug, ApiError> {
        self.get_json(&["apps", app, "release_slug"]).await
    }
}

/// Map non-success statuses to errors, keeping 422 distinct.
async fn check_status(response: Response, path: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        // arch-lint: allow(no-silent-result-drop) reason="the status is the error; an unreadable body only loses detail"
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    tracing::warn!(path, %status, "upstream request failed");

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        Err(ApiError::UnprocessableEntity {
            path: path.to_owned(),
            body,
        })
    } else {
        Err(ApiError::Status {
            path: path.to_owned(),
            status,
            body,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
    response.json().await.map_err(|e| ApiError::Decode {
        path: path.to_owned(),
        source: e,
    })
}

/// Strip the query; pre-signed URLs carry their signature there.
fn redact(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.to_string()
        }
        // arch-lint: allow(no-error-swallowing) reason="reqwest already rejected or will reject the URL; this only shapes a log field"
        Err(_) => "<invalid url>".to_owned(),
    }
}
