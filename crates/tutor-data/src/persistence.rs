//! CSV persistence of feedback tables.
//!
//! The persisted format is a literal header followed by one line per student,
//! sorted by student id so files stay diff-stable between runs:
//!
//! ```text
//! studentId,reviewsGiven,reviewsReceived
//! s1,1,3
//! s2,3,3
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};
use tutor_core::error::{Result, TutorError};
use tutor_core::models::{normalize_student_id, FeedbackCount, FeedbackTable};

/// Column header of every persisted feedback table.
pub const CSV_HEADER: [&str; 3] = ["studentId", "reviewsGiven", "reviewsReceived"];

// ── Reading ───────────────────────────────────────────────────────────────────

/// Load a feedback table from the CSV file at `path`.
///
/// Errors are distinct per violated rule: [`TutorError::FileNotFound`],
/// [`TutorError::EmptyFile`], [`TutorError::MissingHeader`],
/// [`TutorError::MalformedRow`], [`TutorError::MalformedCount`] and
/// [`TutorError::DuplicateStudent`]. Bad values are never coerced.
pub fn read_feedback_count_from_csv(path: &Path) -> Result<FeedbackTable> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(TutorError::FileNotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(TutorError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if metadata.len() == 0 {
        return Err(TutorError::EmptyFile(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| TutorError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_feedback_table(file, path)?;

    debug!("Loaded {} students from {}", table.len(), path.display());
    Ok(table)
}

/// Parse a feedback table from any reader. `source` only labels errors.
pub fn read_feedback_table<R: Read>(input: R, source: &Path) -> Result<FeedbackTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let mut records = reader.records();

    let header = records.next().transpose()?;
    let header_matches = header
        .as_ref()
        .is_some_and(|h| h.iter().eq(CSV_HEADER.iter().copied()));
    if !header_matches {
        let found = header
            .map(|h| h.iter().collect::<Vec<_>>().join(","))
            .unwrap_or_default();
        return Err(TutorError::MissingHeader {
            path: source.to_path_buf(),
            expected: CSV_HEADER.join(","),
            found,
        });
    }

    let mut table = FeedbackTable::new();
    for result in records {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() != CSV_HEADER.len() {
            return Err(TutorError::MalformedRow {
                path: source.to_path_buf(),
                line,
                expected: CSV_HEADER.len(),
                found: record.len(),
            });
        }

        let student_id = normalize_student_id(&record[0]);
        let count = FeedbackCount::new(
            parse_count(&record[1], CSV_HEADER[1], line, source)?,
            parse_count(&record[2], CSV_HEADER[2], line, source)?,
        );

        if table.insert(&student_id, count).is_some() {
            return Err(TutorError::DuplicateStudent {
                path: source.to_path_buf(),
                line,
                student_id,
            });
        }
    }

    Ok(table)
}

// ── Writing ───────────────────────────────────────────────────────────────────

/// Atomically write `table` to `path`, creating parent directories if needed.
pub fn write_feedback_count_to_csv(path: &Path, table: &FeedbackTable) -> Result<()> {
    write_atomically(path, |file| write_feedback_table(file, table))?;
    info!("Wrote {} students to {}", table.len(), path.display());
    Ok(())
}

/// Fill a temporary file next to `path` with `write`, then rename it over
/// `path`. The temporary file is removed on every failure.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|source| TutorError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| TutorError::FileWrite {
        path: parent.to_path_buf(),
        source,
    })?;
    write(tmp.as_file_mut())?;
    tmp.persist(path).map_err(|e| TutorError::FileWrite {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Serialize `table` to any writer: header first, then rows sorted by id.
pub fn write_feedback_table<W: Write>(output: W, table: &FeedbackTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(CSV_HEADER)?;
    for (student_id, count) in table.iter() {
        writer.write_record([
            student_id.to_string(),
            count.reviews_given.to_string(),
            count.reviews_received.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Parse a non-negative base-10 count. Signs, blanks and overflow are errors.
fn parse_count(value: &str, column: &'static str, line: u64, source: &Path) -> Result<u32> {
    let malformed = || TutorError::MalformedCount {
        path: source.to_path_buf(),
        line,
        column,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    value.parse::<u32>().map_err(|_| malformed())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
