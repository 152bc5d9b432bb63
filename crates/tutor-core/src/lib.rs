//! Core types shared by the tutorbot crates.
//!
//! Holds the feedback data model, the error type, CLI settings with the
//! persisted directory configuration, and text formatting for reports.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{Result, TutorError};
