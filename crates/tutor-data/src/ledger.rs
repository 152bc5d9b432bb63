//! Record of the review files already merged into a feedback table.
//!
//! The ledger lives next to the CSV it belongs to (`feedback.csv` →
//! `feedback.merged.json`) and maps each reviews directory to the file names
//! that were counted from it. Merging the same directory again only adds the
//! files that are not listed yet, so repeated runs leave the table unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use tutor_core::error::{Result, TutorError};
use tutor_core::models::ReviewRelationship;

use crate::persistence::write_atomically;

/// Review files already counted, keyed by reviews directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeLedger {
    #[serde(default)]
    merged: BTreeMap<String, BTreeSet<String>>,
}

impl MergeLedger {
    /// Sidecar path of the ledger for the feedback table at `csv_path`.
    pub fn path_for(csv_path: &Path) -> PathBuf {
        csv_path.with_extension("merged.json")
    }

    /// Stable key for a reviews directory: its canonical path.
    pub fn source_key(reviews_dir: &Path) -> Result<String> {
        let canonical =
            std::fs::canonicalize(reviews_dir).map_err(|source| TutorError::FileRead {
                path: reviews_dir.to_path_buf(),
                source,
            })?;
        Ok(canonical.to_string_lossy().into_owned())
    }

    /// Load the ledger at `path`. A missing file is an empty ledger.
    ///
    /// An unparsable ledger is an error rather than an empty one: treating it
    /// as empty would count every listed review a second time.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(TutorError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let ledger: Self = serde_json::from_str(&content)?;
        debug!("Loaded merge ledger {} ({} sources)", path.display(), ledger.merged.len());
        Ok(ledger)
    }

    /// Atomically write the ledger to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        write_atomically(path, |file| {
            serde_json::to_writer_pretty(&mut *file, self)?;
            Ok(())
        })
    }

    /// `true` if `review` from `source` has already been counted.
    pub fn contains(&self, source: &str, review: &ReviewRelationship) -> bool {
        self.merged
            .get(source)
            .is_some_and(|files| files.contains(&review.source_file_name))
    }

    /// The subset of `reviews` from `source` that has not been counted yet.
    pub fn unmerged<'a>(
        &self,
        source: &str,
        reviews: &'a [ReviewRelationship],
    ) -> Vec<&'a ReviewRelationship> {
        reviews
            .iter()
            .filter(|review| !self.contains(source, review))
            .collect()
    }

    /// Record `reviews` from `source` as counted.
    pub fn mark_merged<'a, I>(&mut self, source: &str, reviews: I)
    where
        I: IntoIterator<Item = &'a ReviewRelationship>,
    {
        let files = self.merged.entry(source.to_string()).or_default();
        files.extend(reviews.into_iter().map(|r| r.source_file_name.clone()));
    }

    /// Number of review files recorded for `source`.
    pub fn merged_count(&self, source: &str) -> usize {
        self.merged.get(source).map_or(0, BTreeSet::len)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
