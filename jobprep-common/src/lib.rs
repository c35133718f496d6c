//! # jobprep Common Library
//!
//! Shared code for the jobprep services including:
//! - Error type shared by storage and configuration code
//! - Configuration file loading and resolution helpers
//! - SQLite pool initialization and schema creation
//! - Lock-contention retry for single-row writes
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
