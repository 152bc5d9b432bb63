use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tutor_core::formatting::{format_feedback_report, format_least_reviewed};
use tutor_core::models::FeedbackTable;
use tutor_core::settings::TutorConfig;
use tutor_data::aggregator::FeedbackAggregator;
use tutor_data::ledger::MergeLedger;
use tutor_data::persistence::{read_feedback_count_from_csv, write_feedback_count_to_csv};
use tutor_data::reader::read_all_reviews_from_dir;

/// Options of the `feedback` subcommand.
#[derive(Debug, Clone, Default)]
pub struct FeedbackOptions {
    pub reviews_dir: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub fresh: bool,
    pub dry_run: bool,
}

/// Scan the review directory, merge with the persisted table and write back.
///
/// Review files already counted into the table (per the merge ledger next to
/// the CSV) are skipped, so running twice over the same directory leaves the
/// table unchanged. `fresh` discards both the table and the ledger.
///
/// Returns the table that was (or, with `dry_run`, would have been) written.
pub fn run_feedback(
    config: &TutorConfig,
    options: &FeedbackOptions,
    out: &mut impl Write,
) -> Result<FeedbackTable> {
    let reviews_dir = config.reviews_dir(options.reviews_dir.as_deref())?;
    let csv_path = config.feedback_csv(options.csv.as_deref())?;
    let ledger_path = MergeLedger::path_for(&csv_path);

    tracing::info!("Reading reviews from {}", reviews_dir.display());
    let reviews = read_all_reviews_from_dir(&reviews_dir)?;
    if reviews.is_empty() {
        tracing::warn!("No reviews found in {}", reviews_dir.display());
    }
    let source = MergeLedger::source_key(&reviews_dir)?;

    let (mut table, mut ledger) = if options.fresh || !csv_path.exists() {
        tracing::info!("Starting a new feedback table");
        (FeedbackTable::new(), MergeLedger::default())
    } else {
        tracing::info!("Merging with {}", csv_path.display());
        let persisted = read_feedback_count_from_csv(&csv_path)
            .with_context(|| format!("loading previous counts from {}", csv_path.display()))?;
        let ledger = MergeLedger::load_from(&ledger_path)
            .with_context(|| format!("loading merge ledger {}", ledger_path.display()))?;
        (persisted, ledger)
    };

    let pending = ledger.unmerged(&source, &reviews);
    if pending.len() < reviews.len() {
        tracing::info!(
            "Skipping {} reviews already counted in {}",
            reviews.len() - pending.len(),
            csv_path.display()
        );
    }
    let scanned = FeedbackAggregator::aggregate(pending.iter().copied())?;
    table
        .merge(&scanned)
        .with_context(|| format!("adding reviews from {}", reviews_dir.display()))?;
    ledger.mark_merged(&source, pending.iter().copied());

    if options.dry_run {
        tracing::info!("Dry run; {} left untouched", csv_path.display());
    } else {
        write_feedback_count_to_csv(&csv_path, &table)?;
        ledger.save_to(&ledger_path)?;
    }

    write!(out, "{}", format_feedback_report(&table, now()))?;
    Ok(table)
}

/// Print the persisted table, as text or JSON.
pub fn run_show(
    config: &TutorConfig,
    csv: Option<&Path>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let table = load_table(config, csv)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&table)?)?;
    } else {
        write!(out, "{}", format_feedback_report(&table, now()))?;
    }
    Ok(())
}

/// Print the `count` students whose submissions received the fewest reviews.
pub fn run_least(
    config: &TutorConfig,
    csv: Option<&Path>,
    count: usize,
    out: &mut impl Write,
) -> Result<()> {
    let table = load_table(config, csv)?;
    write!(out, "{}", format_least_reviewed(&table.least_reviewed(count)))?;
    Ok(())
}

/// Apply `update` to the stored configuration (or clear it) and print it.
pub fn run_config(
    config_path: &Path,
    update: TutorConfig,
    clear: bool,
    out: &mut impl Write,
) -> Result<()> {
    if clear {
        TutorConfig::clear_at(config_path)?;
        writeln!(out, "Cleared {}", config_path.display())?;
        return Ok(());
    }

    let mut config = TutorConfig::load_from(config_path);
    if update != TutorConfig::default() {
        config.apply(update);
        config.save_to(config_path)?;
        tracing::info!("Saved configuration to {}", config_path.display());
    }
    writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
    Ok(())
}

fn load_table(config: &TutorConfig, csv: Option<&Path>) -> Result<FeedbackTable> {
    let csv_path = config.feedback_csv(csv)?;
    Ok(read_feedback_count_from_csv(&csv_path)?)
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
