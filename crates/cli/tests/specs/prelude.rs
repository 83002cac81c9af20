// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Shared spec harness: a thin chainable wrapper over `assert_cmd`.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use assert_cmd::Command;
use std::path::Path;
use std::process::Output;

pub struct Spec {
    command: Command,
}

/// A fresh invocation of the built `forge` binary.
pub fn cli() -> Spec {
    Spec { command: Command::cargo_bin("forge").unwrap() }
}

impl Spec {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.command.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.command.env(key, value);
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.command.current_dir(dir);
        self
    }

    pub fn passes(mut self) -> Check {
        let output = self.command.output().unwrap();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstderr:\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr),
        );
        Check { output }
    }

    pub fn fails(mut self) -> Check {
        let output = self.command.output().unwrap();
        assert!(!output.status.success(), "expected failure, command succeeded");
        Check { output }
    }
}

pub struct Check {
    output: Output,
}

impl Check {
    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout).into_owned();
        assert!(stdout.contains(needle), "stdout missing {:?}:\n{}", needle, stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout).into_owned();
        assert!(!stdout.contains(needle), "stdout unexpectedly contains {:?}:\n{}", needle, stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.output.stderr).into_owned();
        assert!(stderr.contains(needle), "stderr missing {:?}:\n{}", needle, stderr);
        self
    }
}
