use std::fmt;

use slugrelay_core::ToolsConfig;

use crate::executor::ToolExecutor;

/// Outcome of probing every external packaging tool.
#[derive(Debug, Default)]
pub struct DoctorReport {
    pub tools: Vec<ToolCheck>,
    pub config_file: CheckResult,
}

impl DoctorReport {
    /// Run all tool checks without early return.
    pub async fn run<E: ToolExecutor>(executor: &E, tools: &ToolsConfig) -> Self {
        let version_checks: [(&str, &str, &str); 3] = [
            ("tar", tools.tar.as_str(), "--version"),
            ("mksquashfs", tools.mksquashfs.as_str(), "-version"),
            ("unsquashfs", tools.unsquashfs.as_str(), "-version"),
        ];

        let mut report = Self::default();
        for (label, program, flag) in version_checks {
            let result = match executor.exec(program, &[flag.to_owned()]).await {
                // arch-lint: allow(no-silent-result-drop) reason="a tool that prints nothing is still installed; show its name"
                Ok(out) => CheckResult::ok(out.lines().next().unwrap_or(program).trim()),
                Err(e) => CheckResult::fail(&e.to_string()),
            };
            report.tools.push(ToolCheck {
                name: label.to_owned(),
                result,
            });
        }
        report
    }

    pub fn all_passed(&self) -> bool {
        self.config_file.passed && self.tools.iter().all(|t| t.result.passed)
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "slugrelay doctor")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for check in &self.tools {
            writeln!(
                f,
                "{:<14}{}  {}",
                check.name,
                check.result.icon(),
                check.result.detail
            )?;
        }
        write!(
            f,
            "{:<14}{}  {}",
            "config",
            self.config_file.icon(),
            self.config_file.detail
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub name: String,
    pub result: CheckResult,
}
