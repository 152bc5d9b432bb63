mod bootstrap;
mod commands;

use anyhow::Result;
use tutor_core::settings::{Command, Settings, TutorConfig};

use crate::commands::FeedbackOptions;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("tutorbot v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = settings.config_path();
    let config = TutorConfig::load_from(&config_path);
    let mut stdout = std::io::stdout().lock();

    match settings.command {
        Command::Feedback {
            reviews_dir,
            csv,
            fresh,
            dry_run,
        } => {
            let options = FeedbackOptions {
                reviews_dir,
                csv,
                fresh,
                dry_run,
            };
            commands::run_feedback(&config, &options, &mut stdout)?;
        }

        Command::Show { csv, json } => {
            commands::run_show(&config, csv.as_deref(), json, &mut stdout)?;
        }

        Command::Least { csv, count } => {
            commands::run_least(&config, csv.as_deref(), count, &mut stdout)?;
        }

        Command::Config {
            base_dir,
            exercise,
            reviews_subdir,
            csv_name,
            clear,
        } => {
            let update = TutorConfig {
                base_dir,
                exercise,
                reviews_subdir,
                csv_name,
            };
            commands::run_config(&config_path, update, clear, &mut stdout)?;
        }
    }

    Ok(())
}
