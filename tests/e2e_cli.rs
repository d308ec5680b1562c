//! CLI end-to-end tests
//!
//! Tests for the fieldconv command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the fieldconv binary
#[allow(deprecated)]
fn fieldconv_cmd() -> Command {
    let mut cmd = Command::cargo_bin("fieldconv").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    fieldconv_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    fieldconv_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldconv"))
        .stdout(predicate::str::contains("convert"));
}

#[test]
fn test_cli_version_command() {
    fieldconv_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_tools_command() {
    fieldconv_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_convert_help_lists_flags() {
    fieldconv_cmd()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--indir"))
        .stdout(predicate::str::contains("--withframe"))
        .stdout(predicate::str::contains("--sleeptime"));
}

#[test]
fn test_cli_convert_missing_input_dir() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    fieldconv_cmd()
        .args(["convert", "--indir"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_convert_rejects_unknown_type() {
    let dir = tempdir().unwrap();
    fieldconv_cmd()
        .args(["convert", "-t", ".txt", "-i"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported media type"));
}

#[test]
fn test_cli_convert_empty_dir_succeeds() {
    let dir = tempdir().unwrap();
    fieldconv_cmd()
        .args(["convert", "-i"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do"));
}

#[test]
fn test_cli_convert_creates_output_dir() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("converted");
    fieldconv_cmd()
        .args(["convert", "-i"])
        .arg(dir.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    assert!(out.is_dir());
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fieldconv.toml");
    fs::write(
        &path,
        "[convert]\nextension = \"jpg\"\npool_size = 2\npoll_interval_secs = 30\n",
    )
    .unwrap();

    fieldconv_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains(".jpg"))
        .stdout(predicate::str::contains("30s"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fieldconv.toml");
    fs::write(&path, "[convert]\nresize = -1.0\n").unwrap();

    fieldconv_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("resize"));
}

#[test]
fn test_cli_convert_uses_config_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("rec");
    fs::create_dir(&input).unwrap();
    let path = dir.path().join("fieldconv.toml");
    fs::write(
        &path,
        format!("[convert]\ninput_dir = {:?}\n", input.display().to_string()),
    )
    .unwrap();

    fieldconv_cmd()
        .args(["--config"])
        .arg(&path)
        .arg("convert")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do"));
}

#[test]
fn test_cli_convert_clip() {
    if !fieldconv_av::check_tool("ffmpeg").available {
        eprintln!("ffmpeg not available, skipping");
        return;
    }
    let dir = tempdir().unwrap();
    let clip = dir.path().join("a.h264");
    let made = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i", "testsrc=size=64x48:rate=10"])
        .args(["-frames:v", "5", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-f", "h264"])
        .arg(&clip)
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if !made {
        eprintln!("libx264 not available, skipping");
        return;
    }

    fieldconv_cmd()
        .args(["convert", "-d", "-i"])
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("a.mp4").exists());
    assert!(!clip.exists());
}
