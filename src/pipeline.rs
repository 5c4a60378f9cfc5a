//! The cleaning pipeline.
//!
//! Stages run in a fixed order, each taking ownership of the table and
//! handing back the transformed table with a [`StageReport`](crate::report::StageReport):
//!
//! ```text
//! load -> assess -> deduplicate -> impute -> standardize -> derive -> export
//! ```
//!
//! Assessment only reads. Deduplication is the only stage that removes rows,
//! and derivation the only one that adds columns.
//!
//! # Example
//!
//! ```no_run
//! use hrclean::config::CleanerConfig;
//! use hrclean::pipeline::run_pipeline;
//!
//! let config = CleanerConfig::resolve(None)?;
//! let outcome = run_pipeline(&config)?;
//! println!("Kept {} of {} rows", outcome.report.final_shape.0, outcome.report.original_shape.0);
//! # Ok::<(), hrclean::error::CleanError>(())
//! ```

pub mod assess;
pub mod dedup;
pub mod derive;
pub mod executor;
pub mod impute;
pub mod loader;
pub mod standardize;

pub use assess::{QualityAssessment, assess};
pub use dedup::deduplicate;
pub use derive::derive_features;
pub use executor::{RunOutcome, clean_table, run_pipeline};
pub use impute::impute;
pub use loader::load_table;
pub use standardize::standardize;
