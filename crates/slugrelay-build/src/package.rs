use std::path::{Path, PathBuf};
use std::time::Duration;

use slugrelay_core::{ProcessTypes, ToolsConfig};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::executor::{RealExecutor, ToolExecutor};
use crate::tool::ToolError;

/// Name of the slug image inside the working directory.
const IMAGE_NAME: &str = "build";
const PROCFILE: &str = "Procfile";

/// Downloads build artifacts and turns them into squashfs slug images.
pub struct SlugPackager<E: ToolExecutor = RealExecutor> {
    executor: E,
    http: reqwest::Client,
    tools: ToolsConfig,
}

impl SlugPackager<RealExecutor> {
    pub fn new(
        tools: ToolsConfig,
        download_timeout: Duration,
        tool_timeout: Duration,
    ) -> Result<Self, PackageError> {
        let http = reqwest::Client::builder()
            .timeout(download_timeout)
            .build()
            .map_err(|e| PackageError::HttpClient { source: e })?;
        Ok(Self::with_executor(
            RealExecutor::new(tool_timeout),
            http,
            tools,
        ))
    }
}

impl<E: ToolExecutor> SlugPackager<E> {
    pub fn with_executor(executor: E, http: reqwest::Client, tools: ToolsConfig) -> Self {
        Self {
            executor,
            http,
            tools,
        }
    }

    /// Fetch `build_url` and produce a slug image plus its process types.
    ///
    /// URLs whose path ends in `.tgz` are unpacked and rebuilt as squashfs;
    /// anything else is assumed to already be a squashfs image. Explicit
    /// `processes` win over the image's `Procfile`.
    ///
    /// The returned [`PackagedSlug`] owns the working directory; it is
    /// removed when the value is dropped.
    pub async fn package(
        &self,
        build_url: &str,
        processes: Option<ProcessTypes>,
    ) -> Result<PackagedSlug, PackageError> {
        let url = Url::parse(build_url).map_err(|e| PackageError::InvalidUrl {
            url: build_url.to_owned(),
            source: e,
        })?;

        let workdir = tempfile::Builder::new()
            .prefix("slugrelay-")
            .tempdir()
            .map_err(|e| PackageError::Workdir { source: e })?;
        let dir = workdir.path();
        let image = dir.join(IMAGE_NAME);

        if url.path().ends_with(".tgz") {
            let tarball = dir.join("build.tgz");
            let tree = dir.join("tarball");
            self.download(&url, &tarball).await?;

            tokio::fs::create_dir_all(&tree)
                .await
                .map_err(|e| PackageError::Write {
                    path: tree.clone(),
                    source: e,
                })?;
            self.run(
                &self.tools.tar,
                vec![
                    "-xzf".to_owned(),
                    path_arg(&tarball)?,
                    "-C".to_owned(),
                    path_arg(&tree)?,
                ],
            )
            .await?;
            self.run(
                &self.tools.mksquashfs,
                vec![path_arg(&tree)?, path_arg(&image)?, "-all-root".to_owned()],
            )
            .await?;
        } else {
            self.download(&url, &image).await?;
        }

        let procfile = self.extract_procfile(dir, &image).await?;
        let process_types = match processes {
            Some(explicit) => Some(explicit),
            None => procfile,
        };

        tracing::info!(
            // arch-lint: allow(no-silent-result-drop) reason="log field only; a host-less URL logs an empty host"
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            process_types = process_types.as_ref().map_or(0, ProcessTypes::len),
            "slug packaged"
        );

        Ok(PackagedSlug {
            image,
            process_types,
            workdir,
        })
    }

    /// Extract only the `Procfile` from the image and parse it.
    ///
    /// An image without a `Procfile`, or one unsquashfs cannot read, yields
    /// `None`.
    async fn extract_procfile(
        &self,
        dir: &Path,
        image: &Path,
    ) -> Result<Option<ProcessTypes>, PackageError> {
        let extract = dir.join("extract");
        let args = vec![
            "-d".to_owned(),
            path_arg(&extract)?,
            path_arg(image)?,
            PROCFILE.to_owned(),
        ];
        // arch-lint: allow(no-error-swallowing) reason="an image without a readable Procfile declares no processes"
        if let Err(e) = self.executor.exec(&self.tools.unsquashfs, &args).await {
            tracing::warn!(error = %e, "could not extract Procfile from slug");
            return Ok(None);
        }

        let procfile = extract.join(PROCFILE);
        match tokio::fs::read_to_string(&procfile).await {
            Ok(content) => Ok(Some(ProcessTypes::parse(&content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PackageError::Read {
                path: procfile,
                source: e,
            }),
        }
    }

    async fn run(&self, program: &str, args: Vec<String>) -> Result<String, PackageError> {
        self.executor
            .exec(program, &args)
            .await
            .map_err(|e| PackageError::Tool { source: e })
    }

    /// Stream the response body of `url` into `dest`.
    async fn download(&self, url: &Url, dest: &Path) -> Result<u64, PackageError> {
        let download_err = |e: reqwest::Error| PackageError::Download {
            url: redact(url),
            source: e,
        };

        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(download_err)?;

        let write_err = |e: std::io::Error| PackageError::Write {
            path: dest.to_path_buf(),
            source: e,
        };
        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(download_err)? {
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;

        tracing::debug!(url = %redact(url), bytes = written, "artifact downloaded");
        Ok(written)
    }
}

/// A slug image ready for upload.
#[derive(Debug)]
pub struct PackagedSlug {
    /// Path of the squashfs image.
    pub image: PathBuf,
    /// `None` when neither the caller nor the image declared any processes.
    pub process_types: Option<ProcessTypes>,
    workdir: TempDir,
}

impl PackagedSlug {
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }
}

/// Drop the query string; pre-signed artifact URLs carry credentials there.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.set_fragment(None);
    shown.to_string()
}

fn path_arg(path: &Path) -> Result<String, PackageError> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| PackageError::InvalidPath(path.to_path_buf()))
}

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("invalid build_url {url:?}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("failed to create HTTP client for downloads")]
    HttpClient { source: reqwest::Error },

    #[error("failed to create working directory")]
    Workdir { source: std::io::Error },

    #[error("working path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("failed to download {url}")]
    Download { url: String, source: reqwest::Error },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("slug packaging tool failed")]
    Tool { source: ToolError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_strips_signature() {
        let url = Url::parse("https://bucket.s3.amazonaws.com/slug.img?X-Amz-Signature=abc#x")
            .unwrap();
        assert_eq!(redact(&url), "https://bucket.s3.amazonaws.com/slug.img");
    }
}
