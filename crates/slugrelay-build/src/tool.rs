use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {program}; is it installed and on PATH?")]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} failed ({status}): {args:?}\n{stderr}")]
    CommandFailed {
        program: String,
        args: Vec<String>,
        status: String,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("failed to collect output of {program}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: String,
        source: std::string::FromUtf8Error,
    },
}
