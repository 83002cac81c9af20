// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! Thin asynchronous wrappers around source-control commands and the
//! post-update script.
//!
//! Both seams are traits so the update state machine can be driven in
//! tests with no subprocess I/O at all.

use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Source-control operations the update machine needs.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// The revision the working directory currently sits on.
    async fn current_revision(&self, dir: &Path) -> Result<String, GitError>;

    /// Reset hard to `revision`, then pull `remote`/`revision`.
    async fn fetch(&self, dir: &Path, remote: &str, revision: &str) -> Result<String, GitError>;

    /// Reset hard to an explicit revision (the rollback step).
    async fn reset_hard(&self, dir: &Path, revision: &str) -> Result<String, GitError>;
}

/// Post-update script execution.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, dir: &Path, script: &str) -> Result<String, GitError>;
}

fn check(command: &str, output: Output) -> Result<String, GitError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(GitError::Failed {
            command: command.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let command = format!("git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| GitError::Spawn { command: command.clone(), source })?;
    check(&command, output)
}

/// Real git client. Commands are run as argument vectors in the target
/// working directory; nothing is spliced through a shell.
#[derive(Debug, Clone, Default)]
pub struct GitClient;

#[async_trait]
impl SourceControl for GitClient {
    async fn current_revision(&self, dir: &Path) -> Result<String, GitError> {
        let out = run_git(dir, &["rev-parse", "HEAD"]).await?;
        Ok(out.trim().to_string())
    }

    async fn fetch(&self, dir: &Path, remote: &str, revision: &str) -> Result<String, GitError> {
        let reset = run_git(dir, &["reset", "--hard", revision]).await?;
        let pull = run_git(dir, &["pull", remote, revision]).await?;
        Ok(format!("{}{}", reset, pull))
    }

    async fn reset_hard(&self, dir: &Path, revision: &str) -> Result<String, GitError> {
        run_git(dir, &["reset", "--hard", revision]).await
    }
}

/// Runs the configured post-update script through `sh -c`.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, dir: &Path, script: &str) -> Result<String, GitError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(script)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| GitError::Spawn { command: script.to_string(), source })?;
        check(script, output)
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
