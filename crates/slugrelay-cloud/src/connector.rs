use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::SecretString;

use crate::api::PlatformApi;
use crate::client::HttpPlatformClient;
use crate::error::ApiError;

const USER_AGENT: &str = concat!("slugrelay/", env!("CARGO_PKG_VERSION"));

/// Builds a [`PlatformApi`] for a cloud and API key, once per request.
pub trait ApiConnector: Send + Sync + 'static {
    type Api: PlatformApi + 'static;

    fn connect(&self, cloud: &str, api_key: SecretString) -> Result<Self::Api, ApiError>;
}

/// Connects to the HTTP API selected by the `cloud` parameter.
///
/// Clouds listed in `[clouds]` use the configured base URL; any other
/// cloud name is taken as an API host domain (`https://api.{cloud}`).
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
    clouds: BTreeMap<String, String>,
    upload_timeout: Duration,
}

impl HttpConnector {
    /// `timeout` bounds each API call; slug uploads get `upload_timeout`
    /// instead, since they carry the whole image.
    pub fn new(
        clouds: BTreeMap<String, String>,
        timeout: Duration,
        upload_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClient { source: e })?;
        Ok(Self {
            http,
            clouds,
            upload_timeout,
        })
    }

    pub fn base_url(&self, cloud: &str) -> Result<String, ApiError> {
        if let Some(url) = self.clouds.get(cloud) {
            return Ok(url.clone());
        }
        let valid = !cloud.is_empty()
            && !cloud.starts_with('.')
            && cloud
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !valid {
            return Err(ApiError::InvalidCloud(cloud.to_owned()));
        }
        Ok(format!("https://api.{cloud}"))
    }
}

impl ApiConnector for HttpConnector {
    type Api = HttpPlatformClient;

    fn connect(&self, cloud: &str, api_key: SecretString) -> Result<Self::Api, ApiError> {
        let base_url = self.base_url(cloud)?;
        tracing::debug!(cloud, %base_url, "connecting to upstream");
        let client = HttpPlatformClient::new(self.http.clone(), &base_url, api_key)?;
        Ok(client.with_upload_timeout(self.upload_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector() -> HttpConnector {
        let clouds = BTreeMap::from([
            ("standard".to_owned(), "https://api.heroku.com".to_owned()),
            ("local".to_owned(), "http://127.0.0.1:9000/".to_owned()),
        ]);
        HttpConnector::new(clouds, Duration::from_secs(5), Duration::from_secs(30)).unwrap()
    }

    #[test]
    fn configured_cloud_uses_table() {
        assert_eq!(
            connector().base_url("standard").unwrap(),
            "https://api.heroku.com"
        );
    }

    #[test]
    fn unknown_cloud_is_a_host() {
        assert_eq!(
            connector().base_url("eu.example.com").unwrap(),
            "https://api.eu.example.com"
        );
    }

    #[test]
    fn suspicious_cloud_is_rejected() {
        for cloud in ["", ".evil", "evil.com/path", "evil.com@other", "a b"] {
            assert!(
                matches!(connector().base_url(cloud), Err(ApiError::InvalidCloud(_))),
                "{cloud:?} should be rejected"
            );
        }
    }

    #[test]
    fn connect_parses_configured_url() {
        let client = connector()
            .connect("local", SecretString::from("key"))
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn unparseable_configured_url_is_rejected() {
        let clouds = BTreeMap::from([("broken".to_owned(), "not a url".to_owned())]);
        let connector =
            HttpConnector::new(clouds, Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            connector.connect("broken", SecretString::from("key")),
            Err(ApiError::InvalidCloud(_))
        ));
    }
}
