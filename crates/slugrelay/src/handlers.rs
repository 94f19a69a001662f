use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, header},
};
use serde::Serialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use slugrelay_build::{SlugPackager, ToolExecutor};
use slugrelay_cloud::{ApiConnector, ApiError, PlatformApi, ReleaseOptions};
use slugrelay_core::ProcessTypes;

use crate::auth::ApiKey;
use crate::error::RelayError;
use crate::metrics::CopyMetrics;
use crate::params::Params;
use crate::state::AppState;

const PROMOTE_COMMAND: &str = "pipeline:promote";

/// Success body of both routes.
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub release: Value,
}

/// `POST /apps/{app}/release`
pub async fn create_release<C, E>(
    State(state): State<AppState<C, E>>,
    ApiKey(api_key): ApiKey,
    Path(app): Path<String>,
    params: Params,
) -> Result<Json<ReleaseResponse>, RelayError>
where
    C: ApiConnector,
    E: ToolExecutor + 'static,
{
    let cloud = params.require("cloud")?;
    let build_url = params.require("build_url")?;
    let description = params.require("description")?;
    let processes = params.processes()?;

    let api = state.connector.connect(cloud, api_key)?;
    let head = head_id();
    tracing::info!(app = %app, cloud, head = %head, "release requested");

    let release = release_from_url(
        &state.packager,
        &api,
        &app,
        build_url,
        description,
        &head,
        processes,
    )
    .await?;
    Ok(Json(ReleaseResponse { release }))
}

/// `POST /apps/{source_app}/copy/{target_app}`
pub async fn copy_release<C, E>(
    State(state): State<AppState<C, E>>,
    ApiKey(api_key): ApiKey,
    Path((source_app, target_app)): Path<(String, String)>,
    headers: HeaderMap,
    params: Params,
) -> Result<Json<ReleaseResponse>, RelayError>
where
    C: ApiConnector,
    E: ToolExecutor + 'static,
{
    let cloud = params.require("cloud")?;
    let command = params.get("command").map(str::to_owned);
    let user_agent = headers
        .get(header::USER_AGENT)
        // arch-lint: allow(no-silent-result-drop) reason="a non-ASCII User-Agent is recorded as absent"
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut metrics = CopyMetrics::start(user_agent, command.clone(), &source_app, &target_app);
    let outcome = copy(
        &state,
        cloud,
        api_key,
        &source_app,
        &target_app,
        command.as_deref(),
        &mut metrics,
    )
    .await;
    metrics.finish(&outcome);

    outcome.map(|release| Json(ReleaseResponse { release }))
}

async fn copy<C, E>(
    state: &AppState<C, E>,
    cloud: &str,
    api_key: secrecy::SecretString,
    source_app: &str,
    target_app: &str,
    command: Option<&str>,
    metrics: &mut CopyMetrics,
) -> Result<Value, RelayError>
where
    C: ApiConnector,
    E: ToolExecutor,
{
    let api = state.connector.connect(cloud, api_key)?;

    let user = api.current_user_email().await?;
    metrics.set_user(&user);

    let slug = api
        .get_release_slug(source_app)
        .await
        .map_err(|e| no_access_on_422(e, "releases_slug"))?;

    let head = api
        .list_releases(source_app)
        .await?
        .pop()
        .and_then(|release| release.commit)
        .ok_or_else(|| RelayError::ReleaseNotFound(source_app.to_owned()))?;

    let verb = if command == Some(PROMOTE_COMMAND) {
        "Promote"
    } else {
        "Copy"
    };
    // arch-lint: allow(no-silent-result-drop) reason="an unnamed slug leaves a blank name in the description"
    let slug_name = slug.name.as_deref().unwrap_or_default();
    let description = format!("{verb} {source_app} {slug_name} {head}");
    tracing::info!(source_app, target_app, head = %head, "copying release");

    release_from_url(
        &state.packager,
        &api,
        target_app,
        &slug.slug_url,
        &description,
        &head,
        None,
    )
    .await
    .map_err(|e| match e {
        RelayError::Api(e) => no_access_on_422(e, "new-releases"),
        other => other,
    })
}

/// Package `build_url` and release it to `app`. The slug's working
/// directory is removed when this returns.
async fn release_from_url<A, E>(
    packager: &SlugPackager<E>,
    api: &A,
    app: &str,
    build_url: &str,
    description: &str,
    head: &str,
    processes: Option<ProcessTypes>,
) -> Result<Value, RelayError>
where
    A: PlatformApi,
    E: ToolExecutor,
{
    let slug = packager.package(build_url, processes).await?;
    let options = ReleaseOptions {
        process_types: slug.process_types.clone(),
    };
    let release =
        slugrelay_cloud::release(api, app, &slug.image, description, head, &options).await?;
    Ok(release)
}

fn no_access_on_422(e: ApiError, resource: &'static str) -> RelayError {
    if e.is_unprocessable() {
        RelayError::NoAccess(resource)
    } else {
        e.into()
    }
}

/// Hex SHA-1 of the current time, `seconds.nanoseconds`.
pub fn head_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        // arch-lint: allow(no-silent-result-drop) reason="a clock before the epoch still yields a usable opaque id"
        .unwrap_or_default();
    let stamp = format!("{}.{:09}", now.as_secs(), now.subsec_nanos());
    format!("{:x}", Sha1::digest(stamp.as_bytes()))
}
