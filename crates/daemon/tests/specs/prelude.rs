// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for keepd specs

#![allow(dead_code)]

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::kill;
use nix::unistd::Pid;
use tempfile::TempDir;

pub use assert_cmd::Command;
pub use nix::sys::signal::Signal;
pub use predicates::prelude::*;

/// Upper bound for the daemon to react to a signal
pub const SPEC_WAIT_MAX: Duration = Duration::from_secs(10);

/// `keepd` command ready for arguments
pub fn keepd() -> Command {
    Command::cargo_bin("keepd").unwrap()
}

/// Scratch directory holding a config file and logs
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to a file under the scratch directory
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

/// A keepd process started in the background
pub struct Daemon {
    child: Child,
}

impl Daemon {
    /// Start keepd with `config` and wait until it reports READY
    pub fn start(config: &Path) -> Self {
        let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("keepd"))
            .arg("--config")
            .arg(config)
            .env_remove("RUST_LOG")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let stdout = child.stdout.take().unwrap();
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        assert_eq!(line.trim(), "READY", "daemon did not report ready");

        Self { child }
    }

    pub fn signal(&self, signal: Signal) {
        kill(Pid::from_raw(self.child.id() as i32), signal).unwrap();
    }

    /// Wait for the process to exit, failing the test past the deadline
    pub fn wait(mut self) -> ExitStatus {
        let deadline = Instant::now() + SPEC_WAIT_MAX;
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status;
            }
            if Instant::now() > deadline {
                let _ = self.child.kill();
                panic!("keepd did not exit within {:?}", SPEC_WAIT_MAX);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

