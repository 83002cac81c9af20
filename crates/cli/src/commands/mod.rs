// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! CLI command implementations

use anyhow::Result;
use clap::Args;
use forge_core::{AppTarget, Config, ConfigBuilder, ENV_CONFIG_FILE};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub mod run;
pub mod stop;
pub mod update;

/// Shared `[script]` positional for `update` and `stop`.
#[derive(Args)]
pub struct TargetArgs {
    /// Script or executable the command applies to
    pub script: Option<String>,
}

/// Fully layered configuration plus the resolved target it applies to.
pub struct Loaded {
    pub config: Config,
    pub target: AppTarget,
}

/// The main config file: `--config` wins, then `$FORGE_CFG_FILE`, then
/// `config.json` in the invoking directory.
fn config_file_path(flag: Option<PathBuf>, cwd: &Path) -> PathBuf {
    flag.or_else(|| std::env::var_os(ENV_CONFIG_FILE).map(PathBuf::from))
        .unwrap_or_else(|| cwd.join("config.json"))
}

/// Layer the configuration and resolve the supervised target.
///
/// The project-local override file lives next to the executable, which
/// is itself config-dependent, so the target is resolved twice: once
/// provisionally from the main file to locate the project file, and
/// once from the final merge.
pub fn load(
    config_flag: Option<PathBuf>,
    script: Option<&str>,
    extra_args: &[String],
    overrides: Value,
) -> Result<Loaded> {
    let cwd = std::env::current_dir()?;
    let mut builder = ConfigBuilder::new();
    builder.apply_file(&config_file_path(config_flag, &cwd))?;

    let provisional = builder.finalize()?;
    let target = AppTarget::resolve(script, extra_args, &cwd, &provisional);

    builder.apply_project_file(&target.directory)?;
    builder.apply_env(std::env::vars());
    builder.apply_overrides(overrides);

    let config = builder.finalize()?;
    let target = AppTarget::resolve(script, extra_args, &cwd, &config);
    Ok(Loaded { config, target })
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
