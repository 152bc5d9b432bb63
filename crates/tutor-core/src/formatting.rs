//! Plain-text rendering of feedback tables for the terminal.

use chrono::NaiveDateTime;
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

use crate::models::{FeedbackCount, FeedbackTable};

const STUDENT_HEADER: &str = "Student";
const GIVEN_HEADER: &str = "Reviews given";
const RECEIVED_HEADER: &str = "Reviews received";

/// Render `table` as an aligned text table with a totals line.
///
/// ```
/// use chrono::NaiveDate;
/// use tutor_core::formatting::format_feedback_report;
/// use tutor_core::models::{FeedbackCount, FeedbackTable};
///
/// let mut table = FeedbackTable::new();
/// table.insert("s1", FeedbackCount::new(1, 2));
/// let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 30, 0).unwrap();
///
/// let report = format_feedback_report(&table, at);
/// assert!(report.starts_with("Feedback report (2024-03-01 09:30)"));
/// ```
pub fn format_feedback_report(table: &FeedbackTable, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Feedback report ({})",
        generated_at.format("%Y-%m-%d %H:%M")
    );

    if table.is_empty() {
        let _ = writeln!(out, "No reviews recorded.");
        return out;
    }

    let rows: Vec<(&str, FeedbackCount)> = table.iter().map(|(id, c)| (id, *c)).collect();
    write_rows(&mut out, &rows);

    let totals = table.totals();
    let _ = writeln!(
        out,
        "{} students, {} reviews given, {} reviews received",
        totals.students, totals.reviews_given, totals.reviews_received
    );
    out
}

/// Render the result of [`FeedbackTable::least_reviewed`].
pub fn format_least_reviewed(rows: &[(&str, FeedbackCount)]) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        let _ = writeln!(out, "No students recorded.");
        return out;
    }
    write_rows(&mut out, rows);
    out
}

/// Pad `text` with trailing spaces to `width` display columns.
pub fn pad_right(text: &str, width: usize) -> String {
    let current = text.width();
    if current >= width {
        return text.to_string();
    }
    format!("{}{}", text, " ".repeat(width - current))
}

/// Pad `text` with leading spaces to `width` display columns.
pub fn pad_left(text: &str, width: usize) -> String {
    let current = text.width();
    if current >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat(width - current), text)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn write_rows(out: &mut String, rows: &[(&str, FeedbackCount)]) {
    let id_width = rows
        .iter()
        .map(|(id, _)| id.width())
        .max()
        .unwrap_or(0)
        .max(STUDENT_HEADER.width());
    let given_width = GIVEN_HEADER.width();
    let received_width = RECEIVED_HEADER.width();

    let _ = writeln!(
        out,
        "{}  {}  {}",
        pad_right(STUDENT_HEADER, id_width),
        GIVEN_HEADER,
        RECEIVED_HEADER
    );
    let _ = writeln!(
        out,
        "{}  {}  {}",
        "-".repeat(id_width),
        "-".repeat(given_width),
        "-".repeat(received_width)
    );

    for (id, count) in rows {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            pad_right(id, id_width),
            pad_left(&count.reviews_given.to_string(), given_width),
            pad_left(&count.reviews_received.to_string(), received_width)
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
