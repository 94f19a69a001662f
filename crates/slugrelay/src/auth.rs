use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::SecretString;

const CHALLENGE: &str = "Basic realm=\"Restricted Area\"";

/// Upstream API key taken from HTTP Basic credentials.
///
/// The password is the key; the username is ignored. Any request without
/// usable Basic credentials is rejected with [`Unauthorized`] before the
/// handler runs.
///
/// ```rust,no_run
/// use slugrelay::ApiKey;
///
/// async fn handler(ApiKey(_key): ApiKey) -> &'static str {
///     "ok"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiKey(pub SecretString);

/// 401 rejection carrying the Basic auth challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, CHALLENGE)],
            "Unauthorized",
        )
            .into_response()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ApiKey {
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path();

        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            // arch-lint: allow(no-silent-result-drop) reason="non-ASCII Authorization header is malformed; treating as absent triggers 401"
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!(path, "missing authentication");
                Unauthorized
            })?;

        let password = basic_password(header).ok_or_else(|| {
            tracing::warn!(path, "malformed Basic credentials");
            Unauthorized
        })?;

        Ok(Self(SecretString::from(password)))
    }
}

/// Password half of a `Basic` Authorization value. The scheme is matched
/// case-insensitively.
fn basic_password(value: &str) -> Option<String> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    // arch-lint: allow(no-silent-result-drop) reason="undecodable credentials are rejected with 401"
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    // arch-lint: allow(no-silent-result-drop) reason="non-UTF-8 credentials are rejected with 401"
    let decoded = String::from_utf8(decoded).ok()?;
    let (_user, password) = decoded.split_once(':')?;
    Some(password.to_owned())
}
