//! # streamstats engine
//!
//! The listening-history engine behind streamstats.
//!
//! Raw export files go through the [`parser`], are batched by the
//! [`importer`], and are reduced by the [`aggregator`] into an
//! [`AggregatedSummary`]. The [`filter`] module recomputes summaries over
//! subsets, the [`session`] store holds the working dataset, and
//! [`artwork`] resolves display images through the [`spotify`] client.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod artwork;
pub mod error;
pub mod filter;
pub mod importer;
pub mod parser;
pub mod session;
pub mod source;
pub mod spotify;
pub mod summary;

pub use aggregator::Aggregator;
pub use artwork::{ArtworkCache, ArtworkCacheConfig, ArtworkQuery, CatalogSearch};
pub use error::ImportError;
pub use filter::{FilteredView, PlayFilter};
pub use importer::{BatchEntry, FileStatus, ImportBatch, ImportOptions, ImportProgress, ImportReport};
pub use parser::{parse_file, SourceFormat};
pub use session::{SessionSnapshot, SessionStore};
pub use source::{DiskFile, FileSource, MemoryFile};
pub use spotify::{SpotifyClient, SpotifyClientConfig, StaticToken, TokenProvider};
pub use summary::*;
