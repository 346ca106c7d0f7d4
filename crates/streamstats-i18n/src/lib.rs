//! # streamstats i18n
//!
//! Internationalization support using the Fluent localization system.
//!
//! Translations are embedded at compile time, one Fluent resource per
//! locale. `en-US` is the default and the fallback for missing messages;
//! `fr-FR` is also shipped.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod loader;
pub mod messages;

pub use error::{I18nError, I18nResult};
pub use loader::*;
pub use messages::*;

/// Re-exported so callers can build message arguments.
pub use fluent_bundle::{FluentArgs, FluentValue};
