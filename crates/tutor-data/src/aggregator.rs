//! Folding review relationships into per-student feedback counts.

use std::path::Path;

use tracing::debug;
use tutor_core::error::Result;
use tutor_core::models::{FeedbackTable, FeedbackTotals, ReviewRelationship};

use crate::reader::read_all_reviews_from_dir;

// ── FeedbackAggregator ────────────────────────────────────────────────────────

/// Stateless entry point for feedback aggregation.
///
/// Aggregation is a reduction in the [`FeedbackTable`] monoid (identity: the
/// empty table, operation: key-wise addition). The result does not depend on
/// review order or on how the reviews are chunked.
pub struct FeedbackAggregator;

impl FeedbackAggregator {
    /// Count reviews given and received per student.
    pub fn aggregate<'a, I>(reviews: I) -> Result<FeedbackTable>
    where
        I: IntoIterator<Item = &'a ReviewRelationship>,
    {
        reviews
            .into_iter()
            .try_fold(FeedbackTable::new(), |mut table, review| {
                table.record(review)?;
                Ok(table)
            })
    }

    /// Aggregate `reviews` in chunks of `chunk_size` and merge the partial
    /// tables. Yields the same table as [`FeedbackAggregator::aggregate`].
    pub fn aggregate_chunks(
        reviews: &[ReviewRelationship],
        chunk_size: usize,
    ) -> Result<FeedbackTable> {
        let partials = reviews
            .chunks(chunk_size.max(1))
            .map(|chunk| Self::aggregate(chunk))
            .collect::<Result<Vec<_>>>()?;
        Self::merge_all(&partials)
    }

    /// Key-wise sum of all `tables`. The empty table for no input.
    pub fn merge_all<'a, I>(tables: I) -> Result<FeedbackTable>
    where
        I: IntoIterator<Item = &'a FeedbackTable>,
    {
        tables
            .into_iter()
            .try_fold(FeedbackTable::new(), |acc, table| acc.merged(table))
    }

    /// Scan `dir` and aggregate the reviews found there.
    pub fn read_feedback_count_from_reviews(dir: &Path) -> Result<FeedbackTable> {
        let reviews = read_all_reviews_from_dir(dir)?;
        let table = Self::aggregate(&reviews)?;
        debug!(
            "Aggregated {} reviews into {} students",
            reviews.len(),
            table.len()
        );
        Ok(table)
    }

    /// Column sums of `table`.
    pub fn calculate_totals(table: &FeedbackTable) -> FeedbackTotals {
        table.totals()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tutor_core::error::TutorError;
    use tutor_core::models::FeedbackCount;

    fn review(reviewer: &str, submitter: &str) -> ReviewRelationship {
        ReviewRelationship {
            reviewer_id: reviewer.to_string(),
            submitter_id: submitter.to_string(),
            source_file_name: format!("{reviewer}-{submitter}.pdf"),
        }
    }

    fn scenario() -> Vec<ReviewRelationship> {
        vec![
            review("s1", "s2"),
            review("s2", "s1"),
            review("s3", "s1"),
            review("s4", "s2"),
        ]
    }

    fn expected_scenario_table() -> FeedbackTable {
        let mut table = FeedbackTable::new();
        table.insert("s1", FeedbackCount::new(1, 2));
        table.insert("s2", FeedbackCount::new(1, 2));
        table.insert("s3", FeedbackCount::new(1, 0));
        table.insert("s4", FeedbackCount::new(1, 0));
        table
    }

    // ── aggregate ─────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_scenario() {
        let table = FeedbackAggregator::aggregate(&scenario()).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get("s1"), Some(&FeedbackCount::new(1, 2)));
        assert_eq!(table.get("s2"), Some(&FeedbackCount::new(1, 2)));
        assert_eq!(table.get("s3"), Some(&FeedbackCount::new(1, 0)));
        assert_eq!(table.get("s4"), Some(&FeedbackCount::new(1, 0)));
        assert_eq!(table, expected_scenario_table());
    }

    #[test]
    fn test_aggregate_empty() {
        let table = FeedbackAggregator::aggregate(&Vec::<ReviewRelationship>::new()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_aggregate_submitter_only_student_has_zero_given() {
        let table = FeedbackAggregator::aggregate(&[review("s1", "s7")]).unwrap();
        assert_eq!(table.get("s7"), Some(&FeedbackCount::new(0, 1)));
        assert_eq!(table.get("s1"), Some(&FeedbackCount::new(1, 0)));
    }

    #[test]
    fn test_aggregate_totals_match_review_count() {
        let reviews = scenario();
        let totals = FeedbackAggregator::calculate_totals(&FeedbackAggregator::aggregate(&reviews).unwrap());

        assert_eq!(totals.reviews_given, reviews.len() as u64);
        assert_eq!(totals.reviews_received, reviews.len() as u64);
    }

    #[test]
    fn test_aggregate_order_independent() {
        let reviews = scenario();
        let expected = FeedbackAggregator::aggregate(&reviews).unwrap();

        let mut reversed = reviews.clone();
        reversed.reverse();
        assert_eq!(FeedbackAggregator::aggregate(&reversed).unwrap(), expected);

        for shift in 1..reviews.len() {
            let mut rotated = reviews.clone();
            rotated.rotate_left(shift);
            assert_eq!(FeedbackAggregator::aggregate(&rotated).unwrap(), expected);
        }

        let mut swapped = reviews.clone();
        swapped.swap(0, 2);
        assert_eq!(FeedbackAggregator::aggregate(&swapped).unwrap(), expected);
    }

    // ── aggregate_chunks / merge_all ─────────────────────────────────────────

    #[test]
    fn test_aggregate_chunks_matches_aggregate() {
        let reviews = scenario();
        let expected = FeedbackAggregator::aggregate(&reviews).unwrap();

        for chunk_size in 0..=reviews.len() + 1 {
            assert_eq!(
                FeedbackAggregator::aggregate_chunks(&reviews, chunk_size).unwrap(),
                expected,
                "chunk size {chunk_size}"
            );
        }
    }

    #[test]
    fn test_merge_all_empty_is_identity() {
        let none: Vec<FeedbackTable> = Vec::new();
        assert!(FeedbackAggregator::merge_all(&none).unwrap().is_empty());
    }

    #[test]
    fn test_merge_all_with_persisted_counts() {
        let scanned = FeedbackAggregator::aggregate(&scenario()).unwrap();
        let mut persisted = FeedbackTable::new();
        persisted.insert("s1", FeedbackCount::new(1, 3));
        persisted.insert("s5", FeedbackCount::new(2, 2));

        let merged = FeedbackAggregator::merge_all([&persisted, &scanned]).unwrap();

        assert_eq!(merged.get("s1"), Some(&FeedbackCount::new(2, 5)));
        assert_eq!(merged.get("s5"), Some(&FeedbackCount::new(2, 2)));
        assert_eq!(
            merged,
            FeedbackAggregator::merge_all([&scanned, &persisted]).unwrap()
        );
    }

    #[test]
    fn test_merge_all_reports_overflow() {
        let scanned = FeedbackAggregator::aggregate(&scenario()).unwrap();
        let mut persisted = FeedbackTable::new();
        persisted.insert("s1", FeedbackCount::new(u32::MAX, 0));

        let err = FeedbackAggregator::merge_all([&persisted, &scanned]).unwrap_err();
        assert!(matches!(err, TutorError::CountOverflow { ref student_id } if student_id == "s1"));
    }

    // ── read_feedback_count_from_reviews ─────────────────────────────────────

    #[test]
    fn test_read_feedback_count_from_reviews() {
        let dir = TempDir::new().unwrap();
        for name in [
            "S1-S2.pdf",
            "s1-s4.pdf",
            "s3-s2.pdf",
            "s4-S2210101010.pdf",
            "review.pdf",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let table = FeedbackAggregator::read_feedback_count_from_reviews(dir.path()).unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.get("s1"), Some(&FeedbackCount::new(2, 0)));
        assert_eq!(table.get("s2"), Some(&FeedbackCount::new(0, 2)));
        assert_eq!(table.get("s3"), Some(&FeedbackCount::new(1, 0)));
        assert_eq!(table.get("s4"), Some(&FeedbackCount::new(1, 1)));
        assert_eq!(table.get("s2210101010"), Some(&FeedbackCount::new(0, 1)));
    }

    #[test]
    fn test_read_feedback_count_from_empty_dir() {
        let dir = TempDir::new().unwrap();
        let table = FeedbackAggregator::read_feedback_count_from_reviews(dir.path()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_read_feedback_count_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = FeedbackAggregator::read_feedback_count_from_reviews(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, TutorError::DirectoryNotFound(_)));
    }
}
