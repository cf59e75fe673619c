//! Shared test helpers for vh-verify integration tests

#![allow(dead_code)]

pub mod fake_service;
pub mod fixed_backend;

use std::path::PathBuf;

/// Path to the checked-in roster fixture
pub fn roster_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("roster.json")
}
