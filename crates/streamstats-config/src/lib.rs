//! # streamstats config
//!
//! Type-safe configuration management for streamstats.
//!
//! This crate provides the configuration schema and its defaults, loading
//! from YAML or TOML files with environment variable overrides, validation,
//! and a lock-free cache for sharing the active configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cache::*;
pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validation::*;
