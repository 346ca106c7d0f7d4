//! # streamstats
//!
//! Command line front end over the streamstats engine: imports
//! streaming-history exports, prints the full or filtered summary and
//! resolves artwork through the Spotify catalog.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cli;
pub mod error;
pub mod render;

pub use app::App;
pub use cli::{ArtworkArgs, Cli, Command, ImportArgs, OutputFormat};
pub use error::{CliError, CliResult};
