use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, TutorError};

static STUDENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[sS]\d+$").expect("regex is valid"));

/// Normalize a student identifier to its canonical form.
///
/// Surrounding whitespace is removed and the identifier is lower-cased. This
/// is the only place the casing rule lives; the filename parser and every
/// [`FeedbackTable`] insertion go through it.
///
/// # Examples
///
/// ```
/// use tutor_core::models::normalize_student_id;
///
/// assert_eq!(normalize_student_id("S2210101010"), "s2210101010");
/// assert_eq!(normalize_student_id(" s1 "), "s1");
/// ```
pub fn normalize_student_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Returns `true` when `token` has the shape of a student number (`s` followed
/// by digits, either case).
pub fn is_student_id(token: &str) -> bool {
    STUDENT_ID.is_match(token)
}

/// One review artifact: `reviewer_id` reviewed the submission of `submitter_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRelationship {
    /// Normalized id of the student who wrote the review.
    pub reviewer_id: String,
    /// Normalized id of the student whose submission was reviewed.
    pub submitter_id: String,
    /// File the relationship was read from. Diagnostic only.
    pub source_file_name: String,
}

impl ReviewRelationship {
    /// `true` when a student reviewed their own submission.
    pub fn is_self_review(&self) -> bool {
        self.reviewer_id == self.submitter_id
    }
}

/// Review participation of a single student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackCount {
    /// Number of submissions this student reviewed.
    pub reviews_given: u32,
    /// Number of reviews this student's submission received.
    pub reviews_received: u32,
}

impl FeedbackCount {
    pub fn new(reviews_given: u32, reviews_received: u32) -> Self {
        Self {
            reviews_given,
            reviews_received,
        }
    }

    /// Column-wise sum, or `None` if either column leaves the `u32` range.
    pub fn checked_add(self, rhs: FeedbackCount) -> Option<FeedbackCount> {
        Some(FeedbackCount {
            reviews_given: self.reviews_given.checked_add(rhs.reviews_given)?,
            reviews_received: self.reviews_received.checked_add(rhs.reviews_received)?,
        })
    }
}

/// Column sums over a whole [`FeedbackTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackTotals {
    pub students: usize,
    pub reviews_given: u64,
    pub reviews_received: u64,
}

/// Mapping from normalized student id to [`FeedbackCount`].
///
/// Forms a commutative monoid under [`FeedbackTable::merge`] with the empty
/// table as identity, so tables built from disjoint chunks of reviews can be
/// combined in any order. Iteration is sorted by student id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackTable {
    entries: BTreeMap<String, FeedbackCount>,
}

impl FeedbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, student_id: &str) -> Option<&FeedbackCount> {
        self.entries.get(&normalize_student_id(student_id))
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.get(student_id).is_some()
    }

    /// Insert or replace the count for `student_id`, returning the previous one.
    pub fn insert(&mut self, student_id: &str, count: FeedbackCount) -> Option<FeedbackCount> {
        self.entries.insert(normalize_student_id(student_id), count)
    }

    /// Mutable access to a student's count, creating a zeroed entry if absent.
    pub fn count_mut(&mut self, student_id: &str) -> &mut FeedbackCount {
        self.entries
            .entry(normalize_student_id(student_id))
            .or_default()
    }

    /// Count one review: `reviewer` gave one, `submitter` received one.
    ///
    /// Fails with [`TutorError::CountOverflow`] and leaves the table unchanged
    /// if either count is already at `u32::MAX`.
    pub fn record(&mut self, review: &ReviewRelationship) -> Result<()> {
        let given = self.add_to(&review.reviewer_id, FeedbackCount::new(1, 0))?;
        let received = self.add_to(&review.submitter_id, FeedbackCount::new(0, 1))?;
        self.count_mut(&review.reviewer_id).reviews_given = given.reviews_given;
        self.count_mut(&review.submitter_id).reviews_received = received.reviews_received;
        Ok(())
    }

    /// Add every count of `other` into `self`, key by key.
    ///
    /// All or nothing: on [`TutorError::CountOverflow`] `self` is unchanged.
    pub fn merge(&mut self, other: &FeedbackTable) -> Result<()> {
        let mut sums = Vec::with_capacity(other.len());
        for (student_id, count) in &other.entries {
            sums.push((student_id, self.add_to(student_id, *count)?));
        }
        for (student_id, sum) in sums {
            self.entries.insert(student_id.clone(), sum);
        }
        Ok(())
    }

    /// Consuming form of [`FeedbackTable::merge`].
    pub fn merged(mut self, other: &FeedbackTable) -> Result<Self> {
        self.merge(other)?;
        Ok(self)
    }

    fn add_to(&self, student_id: &str, count: FeedbackCount) -> Result<FeedbackCount> {
        self.get(student_id)
            .copied()
            .unwrap_or_default()
            .checked_add(count)
            .ok_or_else(|| TutorError::CountOverflow {
                student_id: normalize_student_id(student_id),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeedbackCount)> {
        self.entries.iter().map(|(id, count)| (id.as_str(), count))
    }

    pub fn totals(&self) -> FeedbackTotals {
        self.entries.values().fold(
            FeedbackTotals {
                students: self.entries.len(),
                ..Default::default()
            },
            |mut totals, count| {
                totals.reviews_given += u64::from(count.reviews_given);
                totals.reviews_received += u64::from(count.reviews_received);
                totals
            },
        )
    }

    /// The `n` students who received the fewest reviews.
    ///
    /// Ties are broken by fewest reviews given, then by student id.
    pub fn least_reviewed(&self, n: usize) -> Vec<(&str, FeedbackCount)> {
        let mut ranked: Vec<(&str, FeedbackCount)> =
            self.iter().map(|(id, count)| (id, *count)).collect();
        ranked.sort_by(|a, b| {
            a.1.reviews_received
                .cmp(&b.1.reviews_received)
                .then(a.1.reviews_given.cmp(&b.1.reviews_given))
                .then(a.0.cmp(b.0))
        });
        ranked.truncate(n);
        ranked
    }
}

impl<'a> IntoIterator for &'a FeedbackTable {
    type Item = (&'a String, &'a FeedbackCount);
    type IntoIter = btree_map::Iter<'a, String, FeedbackCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
