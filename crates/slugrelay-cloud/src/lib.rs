pub mod api;
pub mod client;
pub mod connector;
pub mod error;
pub mod release;

pub use api::{PendingRelease, PlatformApi, Release, ReleaseSlug};
pub use client::HttpPlatformClient;
pub use connector::{ApiConnector, HttpConnector};
pub use error::ApiError;
pub use release::{ReleaseOptions, build_payload, release};
