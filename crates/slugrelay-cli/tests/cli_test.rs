use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn slugrelay() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("slugrelay");
    cmd.env_remove("SLUGRELAY_CONFIG").env_remove("SLUGRELAY_BIND");
    cmd
}

// ── Help / Version ──

#[test]
fn shows_help() {
    slugrelay()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Relay build artifacts"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn shows_version() {
    slugrelay()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("slugrelay"));
}

#[test]
fn serve_help_mentions_bind_env() {
    slugrelay()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SLUGRELAY_BIND"));
}

// ── Error cases ──

#[test]
fn unknown_subcommand_fails() {
    slugrelay().arg("deploy").assert().failure();
}

#[test]
fn serve_rejects_invalid_config() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("slugrelay.toml"), "[server\nbind = ").unwrap();

    slugrelay()
        .current_dir(tmp.path())
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid TOML in config"));
}

#[test]
fn serve_reads_config_path_from_env() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("relay.toml");
    std::fs::write(&path, "[clouds]\nstandard = \"ftp://nope\"\n").unwrap();

    slugrelay()
        .env("SLUGRELAY_CONFIG", &path)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must map to an http(s) URL"));
}

#[test]
fn serve_rejects_invalid_bind() {
    slugrelay()
        .args(["serve", "--bind", "not-an-address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--bind"));
}

#[test]
fn doctor_reports_invalid_config() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("slugrelay.toml"), "[server\nbind = ").unwrap();

    slugrelay()
        .current_dir(tmp.path())
        .arg("doctor")
        .assert()
        .failure()
        .stdout(predicate::str::contains("slugrelay doctor"))
        .stdout(predicate::str::contains("NG"));
}

#[test]
fn doctor_reports_missing_tool() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("slugrelay.toml"),
        "[tools]\nmksquashfs = \"/nonexistent/mksquashfs\"\n",
    )
    .unwrap();

    slugrelay()
        .current_dir(tmp.path())
        .arg("doctor")
        .assert()
        .failure()
        .stdout(predicate::str::contains("mksquashfs"))
        .stdout(predicate::str::contains("NG"));
}
