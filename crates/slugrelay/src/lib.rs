//! HTTP relay that turns build artifacts into releases.
//!
//! Two endpoints, both behind HTTP Basic auth (the password is the upstream
//! API key):
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /apps/{app}/release` | package `build_url` as a slug and release it to `app` |
//! | `POST /apps/{source_app}/copy/{target_app}` | re-release the current slug of `source_app` onto `target_app` |
//!
//! ```rust,no_run
//! use slugrelay::{AppState, router};
//! use slugrelay_core::RelayConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelayConfig::default();
//! let app = router(AppState::from_config(&config)?);
//! let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod params;
pub mod state;

use axum::{Router, routing::post};
use slugrelay_build::ToolExecutor;
use slugrelay_cloud::ApiConnector;
use tower_http::trace::TraceLayer;

pub use auth::{ApiKey, Unauthorized};
pub use error::RelayError;
pub use params::Params;
pub use state::{AppState, SetupError};

/// Build the relay router.
pub fn router<C, E>(state: AppState<C, E>) -> Router
where
    C: ApiConnector,
    E: ToolExecutor + 'static,
{
    Router::new()
        .route("/apps/{app}/release", post(handlers::create_release::<C, E>))
        .route(
            "/apps/{source_app}/copy/{target_app}",
            post(handlers::copy_release::<C, E>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
