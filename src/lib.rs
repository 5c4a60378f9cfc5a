//! # hrclean - HR dataset cleaning
//!
//! Turns a raw HR extract into an analysis-ready table. The pipeline loads a
//! delimited file, assesses its quality, removes duplicate records, fills
//! missing values, standardizes categorical spellings, derives bucketed
//! features and writes the cleaned data together with a processing report.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hrclean::config::CleanerConfig;
//! use hrclean::pipeline::run_pipeline;
//! use hrclean::report::render_text;
//!
//! let config = CleanerConfig::resolve(None)?;
//! let outcome = run_pipeline(&config)?;
//! println!("{}", render_text(&outcome.report));
//! # Ok::<(), hrclean::error::CleanError>(())
//! ```
//!
//! Stages can also be run one at a time on an in-memory table:
//!
//! ```no_run
//! use hrclean::config::StandardizeConfig;
//! use hrclean::pipeline::standardize;
//! use polars::prelude::*;
//!
//! let df = df!("Department" => ["sales", "R&D", "hr"])?;
//! let (df, report) = standardize(df, &StandardizeConfig::default())?;
//! assert_eq!(report.total_standardized(), 3);
//! # Ok::<(), hrclean::error::CleanError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`config`]: JSON configuration with defaults for every setting
//! - [`pipeline`]: the stages and the executor that runs them
//! - [`report`]: per-stage counters and the rendered processing report
//! - [`export`]: CSV and spreadsheet output
//! - [`verify`]: post-run check of a cleaned file
//! - [`error`]: error types and handling utilities
//! - [`logging`]: tracing setup for the binary

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod verify;
