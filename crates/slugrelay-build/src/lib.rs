//! Build artifact packaging for slugrelay.
//!
//! Downloads a build artifact, turns tarballs into squashfs slug images
//! and reads the `Procfile` back out of the image. External tools are
//! driven through [`ToolExecutor`] so tests can substitute a mock.

pub mod doctor;
pub mod executor;
pub mod package;
pub mod tool;

pub use doctor::{CheckResult, DoctorReport, ToolCheck};
pub use executor::{RealExecutor, ToolExecutor};
pub use package::{PackageError, PackagedSlug, SlugPackager};
pub use tool::ToolError;
