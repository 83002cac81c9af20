// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! `forge stop` end-to-end specs against real PID records.

use crate::prelude::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

fn write_config(dir: &Path, executable: &Path) -> PathBuf {
    let config = serde_json::json!({
        "executable": executable,
        "daemon": { "pid_dir": dir },
    });
    let path = dir.join("config.json");
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

fn pid_record(dir: &Path, executable: &Path) -> PathBuf {
    let digest = Sha256::digest(executable.to_string_lossy().as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    dir.join(format!("{}.pid", hex))
}

#[test]
fn stop_without_a_pid_record_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("app.sh");
    std::fs::write(&exe, "#!/bin/sh\nsleep 60\n").unwrap();
    let config = write_config(dir.path(), &exe);

    cli()
        .args(&["stop", "--config", &config.to_string_lossy()])
        .current_dir(dir.path())
        .passes()
        .stdout_has("forge is not running");
}

#[test]
fn stop_terminates_the_recorded_daemon_and_removes_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("app.sh");
    std::fs::write(&exe, "#!/bin/sh\nsleep 60\n").unwrap();
    let config = write_config(dir.path(), &exe);

    let mut child = std::process::Command::new("sleep").arg("60").spawn().unwrap();
    let record = pid_record(dir.path(), &exe);
    std::fs::write(&record, child.id().to_string()).unwrap();

    cli()
        .args(&["stop", "--config", &config.to_string_lossy()])
        .current_dir(dir.path())
        .passes()
        .stdout_has("Stopped forge daemon");
    assert!(!record.exists());
    let _ = child.wait();

    // A second stop finds nothing to do.
    cli()
        .args(&["stop", "--config", &config.to_string_lossy()])
        .current_dir(dir.path())
        .passes()
        .stdout_has("forge is not running");
}
