use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by tutorbot.
#[derive(Error, Debug)]
pub enum TutorError {
    /// The review directory does not exist or is not a directory.
    #[error("Review directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// A persisted feedback file does not exist.
    #[error("Feedback file not found: {0}")]
    FileNotFound(PathBuf),

    /// A persisted feedback file exists but contains zero bytes.
    #[error("Feedback file is empty: {0}")]
    EmptyFile(PathBuf),

    /// The first line of a feedback file is not the expected column header.
    #[error("Missing header in {path}: expected \"{expected}\", found \"{found}\"")]
    MissingHeader {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A count column could not be parsed as a non-negative integer.
    #[error("Malformed {column} count \"{value}\" in {path} at line {line}")]
    MalformedCount {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },

    /// A data line does not carry exactly the expected number of columns.
    #[error("Malformed row in {path} at line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The same student identifier appears on more than one line.
    #[error("Duplicate student \"{student_id}\" in {path} at line {line}")]
    DuplicateStudent {
        path: PathBuf,
        line: u64,
        student_id: String,
    },

    /// Adding to a student's count would exceed the `u32` range.
    #[error("Count overflow for student \"{student_id}\"")]
    CountOverflow { student_id: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer rejected a record.
    #[error("Failed to process CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the tutorbot crates.
pub type Result<T> = std::result::Result<T, TutorError>;
