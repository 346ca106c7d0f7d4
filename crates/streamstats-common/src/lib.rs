//! # streamstats common
//!
//! Shared types, utilities, and common functionality for streamstats.
//!
//! This crate provides the foundational types and utilities used across
//! all other crates in the streamstats workspace: the play event model,
//! the workspace error type, logging bootstrap and timestamp handling.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{Result, StatsError};
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingGuard};
pub use types::*;
pub use utils::*;
