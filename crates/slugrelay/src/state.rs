use std::fmt;
use std::sync::Arc;

use slugrelay_build::{PackageError, RealExecutor, SlugPackager, ToolExecutor};
use slugrelay_cloud::{ApiConnector, ApiError, HttpConnector};
use slugrelay_core::RelayConfig;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to set up upstream connector")]
    Connector(#[source] ApiError),

    #[error("failed to set up slug packager")]
    Packager(#[source] PackageError),
}

/// Shared state behind the relay router.
///
/// Holds no per-request data: API keys arrive with each request and the
/// upstream client is built from them on the spot.
pub struct AppState<C = HttpConnector, E: ToolExecutor = RealExecutor> {
    pub connector: Arc<C>,
    pub packager: Arc<SlugPackager<E>>,
}

impl<C, E: ToolExecutor> Clone for AppState<C, E> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            packager: Arc::clone(&self.packager),
        }
    }
}

impl<C: fmt::Debug, E: ToolExecutor> fmt::Debug for AppState<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

impl<C: ApiConnector, E: ToolExecutor> AppState<C, E> {
    pub fn new(connector: C, packager: SlugPackager<E>) -> Self {
        Self {
            connector: Arc::new(connector),
            packager: Arc::new(packager),
        }
    }
}

impl AppState {
    /// Production state: HTTP upstream and real packaging tools.
    pub fn from_config(config: &RelayConfig) -> Result<Self, SetupError> {
        let connector = HttpConnector::new(
            config.clouds.clone(),
            config.timeouts.upstream(),
            config.timeouts.upload(),
        )
        .map_err(SetupError::Connector)?;
        let packager = SlugPackager::new(
            config.tools.clone(),
            config.timeouts.download(),
            config.timeouts.tool(),
        )
        .map_err(SetupError::Packager)?;

        tracing::debug!(
            bind = %config.server.bind,
            clouds = config.clouds.len(),
            "relay state ready",
        );
        Ok(Self::new(connector, packager))
    }
}
