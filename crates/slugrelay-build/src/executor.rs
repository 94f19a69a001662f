use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::tool::ToolError;

/// Abstraction over external tool execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// Arguments are passed as an array; nothing goes through a shell.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run `program` with `args` and capture stdout.
    async fn exec(&self, program: &str, args: &[String]) -> Result<String, ToolError>;
}

/// Runs tools as child processes, killing them when `timeout` elapses.
#[derive(Debug, Clone)]
pub struct RealExecutor {
    timeout: Duration,
}

impl RealExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolExecutor for RealExecutor {
    async fn exec(&self, program: &str, args: &[String]) -> Result<String, ToolError> {
        tracing::debug!(program, ?args, "running tool");

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::TimedOut {
                program: program.to_owned(),
                timeout: self.timeout,
            })?
            .map_err(|e| ToolError::Wait {
                program: program.to_owned(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ToolError::InvalidUtf8 {
                program: program.to_owned(),
                source: e,
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(ToolError::CommandFailed {
                program: program.to_owned(),
                args: args.to_vec(),
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}
