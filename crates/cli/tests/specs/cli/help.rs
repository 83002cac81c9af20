// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

//! CLI help output specs.

use crate::prelude::*;

#[test]
fn forge_without_arguments_exits_nonzero() {
    cli().fails();
}

#[test]
fn forge_help_shows_usage_and_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("run")
        .stdout_has("update")
        .stdout_has("stop");
}

#[test]
fn forge_run_help_shows_the_run_flags() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("--daemon")
        .stdout_has("--update")
        .stdout_has("--watch");
}

#[test]
fn forge_run_help_hides_the_foreground_marker() {
    cli().args(&["run", "--help"]).passes().stdout_lacks("--foreground");
}

#[test]
fn forge_update_help_shows_usage() {
    cli().args(&["update", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn forge_stop_help_shows_usage() {
    cli().args(&["stop", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn forge_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
