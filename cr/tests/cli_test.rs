//! End-to-end tests for the `cr` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn safetensors_bytes() -> Vec<u8> {
    let mut header = br#"{"weight":{"dtype":"F32","shape":[2],"data_offsets":[0,8]}}"#.to_vec();
    while header.len() % 8 != 0 {
        header.push(b' ');
    }
    let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&[0u8; 8]);
    bytes
}

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Workspace with a config pointing at its own checkpoint folder
fn workspace() -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let models = temp.path().join("models");
    let config = temp.path().join("cr.yml");
    fs::write(
        &config,
        format!(
            "rotation:\n  base-folder: {}\nfolders:\n  checkpoints:\n    - {}\n",
            models.display(),
            models.display()
        ),
    )
    .unwrap();
    (temp, config)
}

fn cr(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cr").expect("binary built");
    cmd.arg("--config").arg(config).env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_resolve_prints_relative_path() {
    let (temp, config) = workspace();
    let models = temp.path().join("models");
    write(&models, "sdxl/base.safetensors", &safetensors_bytes());
    write(&models, "sdxl/base_v2.safetensors", &safetensors_bytes());

    cr(&config)
        .args(["resolve", "BASE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sdxl/base.safetensors"))
        .stdout(predicate::str::contains("base name"));
}

#[test]
fn test_resolve_json_output() {
    let (temp, config) = workspace();
    let models = temp.path().join("models");
    write(&models, "juggernaut_xl.safetensors", &safetensors_bytes());

    let output = cr(&config)
        .args(["resolve", "jugger", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["relative_path"], "juggernaut_xl.safetensors");
    assert_eq!(value["tier"], "partial-filename");
    assert_eq!(value["verified"]["tensor_count"], 1);
}

#[test]
fn test_resolve_ambiguous_fails() {
    let (temp, config) = workspace();
    let models = temp.path().join("models");
    write(&models, "a/model.safetensors", &safetensors_bytes());
    write(&models, "b/model.safetensors", &safetensors_bytes());

    cr(&config)
        .args(["resolve", "model"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ambiguous"));
}

#[test]
fn test_resolve_rejects_corrupt_file() {
    let (temp, config) = workspace();
    let models = temp.path().join("models");
    write(&models, "model.safetensors", b"definitely not safetensors");

    cr(&config)
        .args(["resolve", "model"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rejected by safe mode"));
}

#[test]
fn test_resolve_unsafe_mode_accepts_pickle() {
    let (temp, config) = workspace();
    let models = temp.path().join("models");
    write(&models, "legacy.ckpt", b"pickle");

    cr(&config)
        .args(["resolve", "legacy", "--unsafe", "--extensions", "ckpt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy.ckpt"))
        .stdout(predicate::str::contains("Not verified"));
}

#[test]
fn test_rotate_is_stable_within_window() {
    let (temp, config) = workspace();
    let models = temp.path().join("models");
    for name in ["one.safetensors", "two.safetensors", "three.sft"] {
        write(&models, &format!("SDXL 10/{}", name), b"x");
    }

    let first = cr(&config)
        .args(["rotate", "--category", "SDXL", "--at", "2026-01-13 10:05", "--format", "json"])
        .output()
        .unwrap();
    let second = cr(&config)
        .args(["rotate", "--category", "SDXL", "--at", "2026-01-13 10:55", "--format", "json"])
        .output()
        .unwrap();
    assert!(first.status.success());

    let a: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    let b: serde_json::Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(a["filename"], b["filename"]);
    assert_eq!(a["window"]["window_start"], "2026-01-13T10:00:00");
}

#[test]
fn test_rotate_rejects_bad_interval() {
    let (_temp, config) = workspace();

    cr(&config)
        .args(["rotate", "--interval", "2000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval"));
}

#[test]
fn test_verify_command() {
    let temp = TempDir::new().unwrap();
    let (_ws, config) = workspace();
    write(temp.path(), "ok.safetensors", &safetensors_bytes());
    write(temp.path(), "bad.ckpt", b"pickle");

    cr(&config)
        .arg("verify")
        .arg(temp.path().join("ok.safetensors"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 tensors"));

    cr(&config)
        .arg("verify")
        .arg(temp.path().join("bad.ckpt"))
        .assert()
        .failure();
}

#[test]
fn test_list_and_kontext() {
    let (temp, config) = workspace();
    let models = temp.path().join("models");
    write(&models, "x.safetensors", b"x");
    write(&models, "y.ckpt", b"x");

    cr(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("x.safetensors"))
        .stdout(predicate::str::contains("y.ckpt").not());

    cr(&config)
        .args(["kontext", "1920", "1080"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1392"))
        .stdout(predicate::str::contains("752"));
}
