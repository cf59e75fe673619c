//! # VeriHealth Common Library
//!
//! Shared code for VeriHealth services:
//! - Error taxonomy for bootstrap and configuration
//! - TOML bootstrap configuration model and file discovery

pub mod config;
pub mod error;

pub use error::{Error, Result};
