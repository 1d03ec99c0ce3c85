// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs
//!
//! Verify keepd starts, reports ready, and stops cleanly on signals.

use crate::prelude::*;

fn config_with_log(scratch: &Scratch) -> std::path::PathBuf {
    let log = scratch.path().join("logs").join("keepd.log");
    scratch.file(
        "keepd.toml",
        &format!(
            "[fortress]\ndrain_timeout = \"1s\"\n\n[log]\nfilter = \"debug\"\npath = {:?}\n",
            log.display().to_string()
        ),
    )
}

fn read_log(scratch: &Scratch) -> String {
    std::fs::read_to_string(scratch.path().join("logs").join("keepd.log")).unwrap_or_default()
}

#[test]
fn sigterm_stops_daemon_cleanly() {
    let scratch = Scratch::new();
    let daemon = Daemon::start(&config_with_log(&scratch));

    daemon.signal(Signal::SIGTERM);
    let status = daemon.wait();

    assert!(status.success(), "keepd exited with {:?}", status);
    let log = read_log(&scratch);
    assert!(log.contains("Received SIGTERM"), "log: {}", log);
    assert!(log.contains("Daemon stopped"), "log: {}", log);
}

#[test]
fn sigint_stops_daemon_cleanly() {
    let scratch = Scratch::new();
    let daemon = Daemon::start(&config_with_log(&scratch));

    daemon.signal(Signal::SIGINT);
    let status = daemon.wait();

    assert!(status.success(), "keepd exited with {:?}", status);
    assert!(read_log(&scratch).contains("Received SIGINT"));
}

#[test]
fn startup_and_shutdown_are_logged() {
    let scratch = Scratch::new();
    let daemon = Daemon::start(&config_with_log(&scratch));

    daemon.signal(Signal::SIGTERM);
    daemon.wait();

    let log = read_log(&scratch);
    assert!(log.contains("fortress started"), "log: {}", log);
    assert!(log.contains("all visits drained"), "log: {}", log);
    assert!(log.contains("Fortress shutdown complete"), "log: {}", log);
}

#[test]
fn starts_with_default_config() {
    let scratch = Scratch::new();
    let config = scratch.file("keepd.toml", "");

    let daemon = Daemon::start(&config);
    daemon.signal(Signal::SIGTERM);

    assert!(daemon.wait().success());
}
