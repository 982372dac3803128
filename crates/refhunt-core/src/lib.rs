/// RefHunt Core: reverse-dependency index, orphan classification and queries.
///
/// This crate contains all business logic with zero UI dependencies. The
/// asset source, build roots, settings persistence and deletion are reached
/// through traits so any frontend (CLI, editor plugin, test) can plug in.
///
/// # Modules
///
/// - [`model`]: Asset records, the reverse index and analysis results.
/// - [`provider`]: Collaborator traits plus a JSON manifest implementation.
/// - [`index`]: Reverse index construction with progress reporting.
/// - [`rules`]: Ignore patterns and asset classification.
/// - [`query`]: Filtering, sorting, pagination and export.
/// - [`settings`]: Key-value settings stores and analysis configuration.
/// - [`monitor`]: Repository change feed that invalidates cached state.
/// - [`engine`]: `HuntEngine`, which ties the above together.
pub mod engine;
pub mod error;
pub mod index;
pub mod model;
pub mod monitor;
pub mod provider;
pub mod query;
pub mod rules;
pub mod settings;

pub use engine::{HuntEngine, ReferenceReport};
pub use error::{HuntError, Result};
