//! Common test utilities for Berth CLI tests.
//!
//! Provides an isolated project directory per test plus the fixture recipes
//! the CLI tests share.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Recipe with one build service depending on one image service
pub const COMPOSE_BASIC: &str = r#"
version: "3"
services:
  app:
    build: .
    ports:
      - "8080:8080"
    depends_on:
      - db
    env_file: .env
  db:
    image: postgres:16
"#;

/// Recipe with no env file and no build context requirements
pub const COMPOSE_IMAGES_ONLY: &str = r#"
version: "3"
services:
  db:
    image: postgres:16
  cache:
    image: redis:7
"#;

/// Isolated project directory for driving the compiled binary
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp project"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root
    pub fn write(&self, name: &str, content: &str) -> &Self {
        fs::write(self.dir.path().join(name), content).expect("write fixture");
        self
    }

    /// Run `berth` with the given args, cwd at the project root
    pub fn berth(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_berth"))
            .current_dir(self.dir.path())
            // Keep host configuration out of the test environment.
            .env_remove("BERTH_ENGINE")
            .env_remove("BERTH_FILE")
            .env_remove("BERTH_PROJECT")
            .args(args)
            .output()
            .expect("run berth")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
