use std::path::Path;
use std::time::Duration;

use slugrelay_build::{CheckResult, DoctorReport, RealExecutor};
use slugrelay_core::RelayConfig;

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn doctor(config_path: &Path) -> anyhow::Result<()> {
    let (config, config_check) = match RelayConfig::load(config_path) {
        Ok(config) if config_path.exists() => (config, CheckResult::ok("Found")),
        Ok(config) => (config, CheckResult::ok("Not found, using defaults")),
        Err(e) => (RelayConfig::default(), CheckResult::fail(&e.to_string())),
    };

    let executor = RealExecutor::new(CHECK_TIMEOUT);
    let mut report = DoctorReport::run(&executor, &config.tools).await;
    report.config_file = config_check;

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}
