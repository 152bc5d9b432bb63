//! Review ingestion layer for tutorbot.
//!
//! Parses review artifact filenames, scans review directories, aggregates
//! per-student feedback counts and persists them as CSV, together with a
//! ledger of the review files already counted.

pub mod aggregator;
pub mod filename;
pub mod ledger;
pub mod persistence;
pub mod reader;

pub use tutor_core as core;
