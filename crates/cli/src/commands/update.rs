// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! `forge update` - one-shot safe update without supervision

use anyhow::{anyhow, Result};
use forge_core::EventBus;
use forge_engine::{update, GitClient, ShellRunner, UpdateOutcome};
use serde_json::Value;
use std::path::PathBuf;

use crate::commands::TargetArgs;
use crate::{logging, runner};

pub async fn update(config_file: Option<PathBuf>, args: TargetArgs) -> Result<()> {
    let loaded = crate::commands::load(
        config_file,
        args.script.as_deref(),
        &[],
        Value::Object(serde_json::Map::new()),
    )?;

    let bus = EventBus::new();
    logging::attach(&bus);

    let spec = runner::update_spec(&loaded);
    match update::safe(&bus, &GitClient, &ShellRunner, &spec).await {
        UpdateOutcome::Success => Ok(()),
        UpdateOutcome::Failure => {
            Err(anyhow!("update failed and the repository could not be rolled back"))
        }
    }
}
