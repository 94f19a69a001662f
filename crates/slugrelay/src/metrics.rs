use serde::Serialize;

/// Tracing target for metrics records.
pub const TARGET: &str = "slugrelay::metrics";

#[derive(Debug, Clone, Serialize)]
struct CopyRecord {
    action: &'static str,
    user_agent: Option<String>,
    user: Option<String>,
    command: Option<String>,
    source_app: String,
    target_app: String,
    result: Option<String>,
}

/// Metrics record for one copy request.
///
/// The record is logged as `metrics=<json>` exactly once: by
/// [`finish`](Self::finish), or on drop if the request never got that far.
#[derive(Debug)]
pub struct CopyMetrics {
    record: CopyRecord,
    emitted: bool,
}

impl CopyMetrics {
    pub fn start(
        user_agent: Option<String>,
        command: Option<String>,
        source_app: &str,
        target_app: &str,
    ) -> Self {
        Self {
            record: CopyRecord {
                action: "copy",
                user_agent,
                user: None,
                command,
                source_app: source_app.to_owned(),
                target_app: target_app.to_owned(),
                result: None,
            },
            emitted: false,
        }
    }

    pub fn set_user(&mut self, email: &str) {
        self.record.user = Some(email.to_owned());
    }

    /// Record the outcome and emit. `success` on `Ok`, the error text otherwise.
    pub fn finish<T, E: std::fmt::Display>(mut self, outcome: &Result<T, E>) {
        self.record.result = Some(match outcome {
            Ok(_) => "success".to_owned(),
            Err(e) => e.to_string(),
        });
        self.emit();
    }

    fn emit(&mut self) {
        if self.emitted {
            return;
        }
        self.emitted = true;
        match serde_json::to_string(&self.record) {
            Ok(json) => tracing::info!(target: TARGET, "metrics={json}"),
            // arch-lint: allow(no-error-swallowing) reason="a metrics record must never fail the request it describes"
            Err(e) => tracing::warn!(target: TARGET, error = %e, "failed to encode metrics"),
        }
    }
}

impl Drop for CopyMetrics {
    fn drop(&mut self) {
        if !self.emitted {
            self.record
                .result
                .get_or_insert_with(|| "aborted".to_owned());
            self.emit();
        }
    }
}
