//! Cliplab Common Utilities
//!
//! Shared infrastructure for all Cliplab crates:
//! - Error types and result aliases
//! - Configuration loading
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
