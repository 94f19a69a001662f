use std::path::Path;

use serde_json::{Map, Value};
use slugrelay_core::ProcessTypes;

use crate::api::{PendingRelease, PlatformApi};
use crate::error::ApiError;

const SLUG_VERSION: u64 = 2;

/// Fields the caller sets on top of the merged payload.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    pub process_types: Option<ProcessTypes>,
}

/// Create a release of `app` from the slug image at `slug`.
///
/// Requests a pending release, uploads the slug to its upload URL, looks up
/// the acting user and finalizes. Returns the upstream release descriptor
/// (`null` when the response carries none).
pub async fn release<A: PlatformApi + ?Sized>(
    api: &A,
    app: &str,
    slug: &Path,
    description: &str,
    head: &str,
    options: &ReleaseOptions,
) -> Result<Value, ApiError> {
    let pending = api.create_pending_release(app).await?;
    api.upload_slug(pending.upload_url()?, slug).await?;
    let user = api.current_user_email().await?;

    let payload = build_payload(pending, &user, description, head, options);
    let response = api.finalize_release(app, &payload).await?;

    tracing::info!(app, head, user = %user, "release created");
    // arch-lint: allow(no-silent-result-drop) reason="a response without a release member yields a null descriptor"
    Ok(response.get("release").cloned().unwrap_or(Value::Null))
}

/// Merge release defaults into the pending descriptor.
///
/// A default only fills a key the descriptor leaves absent, `null` or
/// `false`; `options` then overwrite unconditionally.
pub fn build_payload(
    pending: PendingRelease,
    user: &str,
    description: &str,
    head: &str,
    options: &ReleaseOptions,
) -> Map<String, Value> {
    let mut payload = pending.into_fields();

    let defaults = [
        ("slug_version", Value::from(SLUG_VERSION)),
        ("run_deploy_hooks", Value::Bool(true)),
        ("user", Value::from(user)),
        ("release_descr", Value::from(description)),
        ("head", Value::from(head)),
    ];
    for (key, value) in defaults {
        let unset = matches!(payload.get(key), None | Some(Value::Null | Value::Bool(false)));
        if unset {
            payload.insert(key.to_owned(), value);
        }
    }

    let process_types = match &options.process_types {
        Some(types) => Value::Object(
            types
                .iter()
                .map(|(name, command)| (name.to_owned(), Value::from(command)))
                .collect(),
        ),
        None => Value::Null,
    };
    payload.insert("process_types".to_owned(), process_types);

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending(value: Value) -> PendingRelease {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn defaults_fill_empty_descriptor() {
        let payload = build_payload(
            pending(json!({"slug_put_url": "https://s3/put"})),
            "dev@example.com",
            "Deploy abc",
            "abc123",
            &ReleaseOptions::default(),
        );

        assert_eq!(
            Value::Object(payload),
            json!({
                "slug_put_url": "https://s3/put",
                "slug_version": 2,
                "run_deploy_hooks": true,
                "user": "dev@example.com",
                "release_descr": "Deploy abc",
                "head": "abc123",
                "process_types": null
            })
        );
    }

    #[test]
    fn descriptor_values_win_over_defaults() {
        let payload = build_payload(
            pending(json!({
                "slug_put_url": "u",
                "slug_version": 3,
                "user": "upstream@example.com",
                "head": "upstream-head"
            })),
            "dev@example.com",
            "desc",
            "abc123",
            &ReleaseOptions::default(),
        );

        assert_eq!(payload["slug_version"], json!(3));
        assert_eq!(payload["user"], json!("upstream@example.com"));
        assert_eq!(payload["head"], json!("upstream-head"));
        assert_eq!(payload["release_descr"], json!("desc"));
    }

    #[test]
    fn null_and_false_count_as_unset() {
        let payload = build_payload(
            pending(json!({
                "slug_put_url": "u",
                "run_deploy_hooks": false,
                "release_descr": null
            })),
            "dev@example.com",
            "desc",
            "abc123",
            &ReleaseOptions::default(),
        );

        assert_eq!(payload["run_deploy_hooks"], json!(true));
        assert_eq!(payload["release_descr"], json!("desc"));
    }

    #[test]
    fn options_override_descriptor() {
        let options = ReleaseOptions {
            process_types: Some([("web", "./server")].into_iter().collect()),
        };
        let payload = build_payload(
            pending(json!({"slug_put_url": "u", "process_types": {"old": "x"}})),
            "dev@example.com",
            "desc",
            "abc123",
            &options,
        );

        assert_eq!(payload["process_types"], json!({"web": "./server"}));
    }
}
