//! Review artifact filename parsing.
//!
//! Review documents are named `<reviewer>-<submitter>.pdf` by the learning
//! platform's download scheme. Anything else is not a review and is rejected
//! with a [`ParseFailure`] so the scanner can skip it.

use thiserror::Error;
use tutor_core::models::{is_student_id, normalize_student_id, ReviewRelationship};

/// Extension of accepted review documents (compared case-insensitively).
pub const REVIEW_EXTENSION: &str = "pdf";

/// Separator between the reviewer and submitter tokens.
pub const ID_SEPARATOR: char = '-';

/// Why a filename is not a review artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("extension is not .pdf")]
    UnsupportedExtension,

    #[error("expected 2 student ids, found {0} tokens")]
    WrongTokenCount(usize),

    #[error("empty student id")]
    EmptyToken,

    #[error("\"{0}\" is not a student id")]
    InvalidStudentId(String),
}

/// Parse a bare filename (not a path) into a [`ReviewRelationship`].
///
/// ```
/// use tutor_data::filename::parse_review_file_name;
///
/// let review = parse_review_file_name("S1-S2.pdf").unwrap();
/// assert_eq!(review.reviewer_id, "s1");
/// assert_eq!(review.submitter_id, "s2");
/// assert!(parse_review_file_name("review.pdf").is_err());
/// ```
pub fn parse_review_file_name(file_name: &str) -> Result<ReviewRelationship, ParseFailure> {
    let (stem, extension) = file_name
        .rsplit_once('.')
        .ok_or(ParseFailure::UnsupportedExtension)?;
    if !extension.eq_ignore_ascii_case(REVIEW_EXTENSION) {
        return Err(ParseFailure::UnsupportedExtension);
    }

    let tokens: Vec<&str> = stem.split(ID_SEPARATOR).collect();
    let [reviewer, submitter] = tokens.as_slice() else {
        return Err(ParseFailure::WrongTokenCount(tokens.len()));
    };

    for token in [reviewer, submitter] {
        if token.is_empty() {
            return Err(ParseFailure::EmptyToken);
        }
        if !is_student_id(token) {
            return Err(ParseFailure::InvalidStudentId((*token).to_string()));
        }
    }

    Ok(ReviewRelationship {
        reviewer_id: normalize_student_id(reviewer),
        submitter_id: normalize_student_id(submitter),
        source_file_name: file_name.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
