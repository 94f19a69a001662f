use std::collections::HashMap;

use axum::{
    Form,
    extract::{FromRequest, Query, Request},
    http::header,
};
use slugrelay_core::ProcessTypes;

use crate::error::RelayError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const PROCESSES: &str = "processes";

/// Request parameters merged from the query string and a urlencoded body.
///
/// Body values override query values with the same name.
#[derive(Debug, Clone, Default)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// A parameter that must be present and non-blank.
    pub fn require(&self, name: &'static str) -> Result<&str, RelayError> {
        self.get(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or(RelayError::MissingParam(name))
    }

    /// Explicit process types, either as a JSON object in `processes` or
    /// as `processes[<name>]=<command>` pairs.
    pub fn processes(&self) -> Result<Option<ProcessTypes>, RelayError> {
        if let Some(raw) = self.get(PROCESSES).filter(|v| !v.trim().is_empty()) {
            let types = serde_json::from_str(raw)
                .map_err(|e| RelayError::Unprocessable(format!("invalid processes: {e}")))?;
            return Ok(Some(types));
        }

        let types: ProcessTypes = self
            .0
            .iter()
            .filter_map(|(key, command)| {
                let name = key.strip_prefix("processes[")?.strip_suffix(']')?;
                (!name.is_empty()).then_some((name, command.as_str()))
            })
            .collect();
        Ok((!types.is_empty()).then_some(types))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Params {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        )
    }
}

impl<S: Send + Sync> FromRequest<S> for Params {
    type Rejection = RelayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map_err(|e| RelayError::Unprocessable(e.body_text()))?;

        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            // arch-lint: allow(no-silent-result-drop) reason="a non-ASCII content type is not a form body"
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));

        if is_form {
            let Form(body) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| RelayError::Unprocessable(e.body_text()))?;
            params.extend(body);
        }

        Ok(Self(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_missing() {
        let params = Params::from([("cloud", "  "), ("build_url", "https://x/b.tgz")]);
        assert!(matches!(
            params.require("cloud"),
            Err(RelayError::MissingParam("cloud"))
        ));
        assert_eq!(params.require("build_url").unwrap(), "https://x/b.tgz");
        assert!(matches!(
            params.require("description"),
            Err(RelayError::MissingParam("description"))
        ));
    }

    #[test]
    fn processes_from_json() {
        let params = Params::from([("processes", r#"{"web":"./web","worker":"./work"}"#)]);
        let types = params.processes().unwrap().unwrap();
        assert_eq!(types.get("web"), Some("./web"));
        assert_eq!(types.get("worker"), Some("./work"));
    }

    #[test]
    fn processes_from_bracketed_keys() {
        let params = Params::from([
            ("processes[web]", "bin/web"),
            ("processes[clock]", "bin/clock"),
            ("processes[]", "ignored"),
            ("cloud", "standard"),
        ]);
        let types = params.processes().unwrap().unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types.get("clock"), Some("bin/clock"));
    }

    #[test]
    fn no_processes_is_none() {
        assert!(Params::default().processes().unwrap().is_none());
    }

    #[test]
    fn malformed_processes_are_unprocessable() {
        for raw in ["not json", r#"["web"]"#, r#"{"web": 1}"#] {
            let params = Params::from([("processes", raw)]);
            assert!(
                matches!(params.processes(), Err(RelayError::Unprocessable(_))),
                "{raw:?} should be rejected"
            );
        }
    }
}
