//! Utility modules for codeforge
//!
//! This module provides various utility functions and helpers including:
//! - Structured logging setup and configuration

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
