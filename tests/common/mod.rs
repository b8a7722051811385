//! Common test utilities for routegen scenario and CLI tests.
//!
//! This module provides:
//! - `TestProject`: an isolated project directory with routes and models
//! - Helpers to run the `routegen` binary against it
//! - Fixtures: reusable source module contents

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

pub const MODELS: &str = "export type Order = { id: string };\n";

pub const ORDERS: &str = "export const orders = route<void, { id: string }>(handler);\n";

pub const ORDERS_WITH_QTY: &str =
    "export const orders = route<void, { id: string; qty: number }>(handler);\n";

pub const ORDERS_IMPORTING_MODELS: &str = "import type { Order } from '../models';\n\
export const orders = route<void, Order>(handler);\n";

/// Result of running the routegen CLI
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Isolated project directory with a `src/routes` tree
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/routes")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    /// Run `routegen --root <project> <args>`
    pub fn run(&self, args: &[&str]) -> TestResult {
        let output = Command::new(env!("CARGO_BIN_EXE_routegen"))
            .current_dir(self.root())
            .env_remove("ROUTEGEN_ROUTES_DIR")
            .env_remove("ROUTEGEN_OUTPUT_DIR")
            .env_remove("ROUTEGEN_MAX_DEPTH")
            .env_remove("ROUTEGEN_JOBS")
            .env("ROUTEGEN_LOG", "off")
            .arg("--root")
            .arg(self.root())
            .args(args)
            .output()
            .unwrap();
        TestResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}
