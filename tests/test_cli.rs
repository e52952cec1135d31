#[cfg(test)]
extern crate assert_cmd;
extern crate predicates;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_KEYS: [&str; 4] = [
    "SAVESYNC_PATHS__REMOTE",
    "SAVESYNC_PATHS__LOCAL",
    "SAVESYNC_RSYNC__BINARY",
    "SAVESYNC_RSYNC__DRY_RUN",
];

/// Binary started in an empty directory, with logs kept out of the build tree.
fn savesync(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("savesync").expect("Calling binary failed");
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd.current_dir(workdir.path())
        .env("SAVESYNC_LOG__DIR", workdir.path().join("logs"))
        .env("SAVESYNC_CONSUMER__ENABLE_LOG_CONSUMER", "false");
    cmd
}

#[cfg(unix)]
fn fake_rsync() -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/app/tests/fixtures/fake-rsync");
    let mode = std::fs::metadata(path).unwrap().permissions().mode();
    assert!(mode & 0o111 != 0, "{} must be executable", path);
    path.to_string()
}

#[test]
fn test_cli() {
    let mut cmd = Command::cargo_bin("savesync").expect("Calling binary failed");
    cmd.assert().failure();
}

#[test]
fn test_version() {
    let expected_version = "savesync 0.3.0\n";
    let mut cmd = Command::cargo_bin("savesync").expect("Calling binary failed");
    cmd.arg("--version").assert().stdout(expected_version);
}

#[test]
fn test_missing_paths_fails() {
    let workdir = tempfile::tempdir().unwrap();

    savesync(&workdir).arg("download").assert().failure();
}

#[cfg(unix)]
#[test]
fn test_download_stdout() {
    let workdir = tempfile::tempdir().unwrap();

    savesync(&workdir)
        .env("SAVESYNC_PATHS__REMOTE", "host:/save")
        .env("SAVESYNC_PATHS__LOCAL", "/tmp/save")
        .env("SAVESYNC_RSYNC__BINARY", fake_rsync())
        .arg("download")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Starting download..."))
        .stdout(predicate::str::contains("fake-rsync -a -v -z host:/save/ /tmp/save"))
        .stdout(predicate::str::contains("Download completed successfully."));
}

#[test]
fn test_missing_binary_reports_error() {
    let workdir = tempfile::tempdir().unwrap();

    savesync(&workdir)
        .env("SAVESYNC_PATHS__REMOTE", "host:/save")
        .env("SAVESYNC_PATHS__LOCAL", "/tmp/save")
        .env("SAVESYNC_RSYNC__BINARY", "savesync-missing-rsync")
        .arg("upload")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error: failed to launch `savesync-missing-rsync`"))
        .stderr(predicate::str::contains("panicked").not());
}

#[cfg(unix)]
#[test]
fn test_sync_continues_after_failed_download() {
    let workdir = tempfile::tempdir().unwrap();

    savesync(&workdir)
        .env("SAVESYNC_PATHS__REMOTE", "host:/fail-download")
        .env("SAVESYNC_PATHS__LOCAL", "/tmp/save")
        .env("SAVESYNC_RSYNC__BINARY", fake_rsync())
        .arg("sync")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Starting sync..."))
        .stdout(predicate::str::contains("Download failed."))
        .stdout(predicate::str::contains("Upload completed successfully."));
}

#[cfg(unix)]
#[test]
fn test_config_file_and_dry_run() {
    let workdir = tempfile::tempdir().unwrap();
    let config_path = workdir.path().join("saves.toml");
    std::fs::write(
        &config_path,
        format!(
            "[paths]\nremote = \"host:/save\"\nlocal = \"/tmp/save\"\n\n[rsync]\nbinary = \"{}\"\n",
            fake_rsync()
        ),
    )
    .unwrap();

    savesync(&workdir)
        .arg("--config")
        .arg(&config_path)
        .args(["upload", "--dry-run"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains(
            "fake-rsync -a -v -z --update --dry-run /tmp/save/ host:/save",
        ));
}

#[cfg(unix)]
#[test]
fn test_interactive_runs_queued_actions() {
    let workdir = tempfile::tempdir().unwrap();

    savesync(&workdir)
        .env("SAVESYNC_PATHS__REMOTE", "host:/save")
        .env("SAVESYNC_PATHS__LOCAL", "/tmp/save")
        .env("SAVESYNC_RSYNC__BINARY", fake_rsync())
        .arg("interactive")
        .write_stdin("upload\nbogus\nquit\n")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Unknown command: bogus"))
        .stdout(predicate::str::contains("Upload completed successfully."));
}
