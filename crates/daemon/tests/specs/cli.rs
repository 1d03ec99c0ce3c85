// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line and configuration error specs

use crate::prelude::*;

#[test]
fn help_lists_config_flag() {
    keepd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn missing_config_file_fails() {
    let scratch = Scratch::new();

    keepd()
        .arg("--config")
        .arg(scratch.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn malformed_config_fails() {
    let scratch = Scratch::new();
    let config = scratch.file("keepd.toml", "[fortress]\ndrain_timeout = 30\n");

    keepd()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("TOML parse error"));
}

#[test]
fn bad_log_filter_fails() {
    let scratch = Scratch::new();
    let config = scratch.file("keepd.toml", "[log]\nfilter = \"keep=loud\"\n");

    keepd()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("logging setup failed"));
}
