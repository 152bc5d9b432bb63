//! Review directory scanning.
//!
//! Lists the direct entries of a review directory and turns every file whose
//! name follows the `<reviewer>-<submitter>.pdf` convention into a
//! [`ReviewRelationship`]. Stray files and subdirectories are skipped.

use std::path::Path;

use tracing::{debug, warn};
use tutor_core::error::{Result, TutorError};
use tutor_core::models::ReviewRelationship;

use crate::filename::parse_review_file_name;

// ── Public API ────────────────────────────────────────────────────────────────

/// Read all review relationships from `dir`, ordered by filename.
///
/// Fails with [`TutorError::DirectoryNotFound`] when `dir` is missing or not a
/// directory. An empty directory yields an empty vector.
pub fn read_all_reviews_from_dir(dir: &Path) -> Result<Vec<ReviewRelationship>> {
    if !dir.is_dir() {
        return Err(TutorError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut reviews = Vec::new();
    let mut skipped = 0usize;

    let walker = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        // Follows symlinks; a dangling link is not a file.
        if !entry.path().is_file() {
            debug!("Skipping non-file entry {}", entry.path().display());
            skipped += 1;
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            debug!("Skipping non UTF-8 file name {}", entry.path().display());
            skipped += 1;
            continue;
        };

        match parse_review_file_name(file_name) {
            Ok(review) => {
                if review.is_self_review() {
                    warn!(
                        "{} is a self-review by {}; counting it anyway",
                        file_name, review.reviewer_id
                    );
                }
                reviews.push(review);
            }
            Err(reason) => {
                debug!("Skipping {}: {}", file_name, reason);
                skipped += 1;
            }
        }
    }

    debug!(
        "Read {} reviews from {} ({} entries skipped)",
        reviews.len(),
        dir.display(),
        skipped
    );

    Ok(reviews)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Convert a walkdir failure into a path-carrying read error.
fn walk_error(dir: &Path, err: walkdir::Error) -> TutorError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.to_path_buf());
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop while reading directory"));
    TutorError::FileRead { path, source }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
