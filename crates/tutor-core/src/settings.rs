use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TutorError};

/// Default name of the reviews folder inside an exercise directory.
pub const DEFAULT_REVIEWS_SUBDIR: &str = "reviews";

/// Default name of the persisted feedback table inside the base directory.
pub const DEFAULT_FEEDBACK_CSV: &str = "feedback.csv";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Peer-review bookkeeping for course tutors
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tutorbot",
    about = "Peer-review bookkeeping for course tutors",
    version
)]
pub struct Settings {
    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path (logs go to stderr when unset)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Alternative configuration file
    #[arg(long = "config", global = true, env = "TUTORBOT_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Count reviews in a review directory and update the feedback table
    Feedback {
        /// Directory holding `<reviewer>-<submitter>.pdf` files
        #[arg(long)]
        reviews_dir: Option<PathBuf>,

        /// Persisted feedback table
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Ignore the persisted table and start from zero
        #[arg(long)]
        fresh: bool,

        /// Print the result without writing the feedback table
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a persisted feedback table
    Show {
        /// Persisted feedback table
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print as JSON instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// List the students whose submissions received the fewest reviews
    Least {
        /// Persisted feedback table
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Number of students to list
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Show or update the stored directory configuration
    Config {
        /// Course base directory
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Exercise folder below the base directory
        #[arg(long)]
        exercise: Option<String>,

        /// Reviews folder below the exercise folder
        #[arg(long)]
        reviews_subdir: Option<String>,

        /// File name of the feedback table inside the base directory
        #[arg(long)]
        csv_name: Option<String>,

        /// Delete the stored configuration
        #[arg(long)]
        clear: bool,
    },
}

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Path of the configuration file in effect for this run.
    pub fn config_path(&self) -> PathBuf {
        self.config_file.clone().unwrap_or_else(TutorConfig::config_path)
    }
}

// ── TutorConfig ────────────────────────────────────────────────────────────────

/// Directory layout persisted to `~/.tutorbot/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct TutorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_subdir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_name: Option<String>,
}

impl TutorConfig {
    /// Return the default path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".tutorbot").join("config.json")
    }

    /// Load the config from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Atomically write the config, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| TutorError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|source| TutorError::FileWrite {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| TutorError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|source| TutorError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Overwrite the fields that are `Some` in `update`.
    pub fn apply(&mut self, update: TutorConfig) {
        if update.base_dir.is_some() {
            self.base_dir = update.base_dir;
        }
        if update.exercise.is_some() {
            self.exercise = update.exercise;
        }
        if update.reviews_subdir.is_some() {
            self.reviews_subdir = update.reviews_subdir;
        }
        if update.csv_name.is_some() {
            self.csv_name = update.csv_name;
        }
    }

    /// `base_dir/exercise/reviews_subdir`, or the explicit directory when given.
    pub fn reviews_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(dir.to_path_buf());
        }
        let base = self.require_base_dir()?;
        let exercise = self.exercise.as_deref().ok_or_else(|| {
            TutorError::Config("no reviews directory given and no exercise configured".to_string())
        })?;
        let subdir = self
            .reviews_subdir
            .as_deref()
            .unwrap_or(DEFAULT_REVIEWS_SUBDIR);
        Ok(base.join(exercise).join(subdir))
    }

    /// `base_dir/csv_name`, or the explicit file when given.
    pub fn feedback_csv(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(file) = explicit {
            return Ok(file.to_path_buf());
        }
        let base = self.require_base_dir()?;
        let name = self.csv_name.as_deref().unwrap_or(DEFAULT_FEEDBACK_CSV);
        Ok(base.join(name))
    }

    fn require_base_dir(&self) -> Result<&Path> {
        self.base_dir.as_deref().ok_or_else(|| {
            TutorError::Config("no base directory configured; run `tutorbot config --base-dir <dir>`".to_string())
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        TutorConfig::config_path_in(tmp.path())
    }

    fn full_config() -> TutorConfig {
        TutorConfig {
            base_dir: Some(PathBuf::from("/course")),
            exercise: Some("ue03".to_string()),
            reviews_subdir: Some("peer".to_string()),
            csv_name: Some("counts.csv".to_string()),
        }
    }

    // ── TutorConfig persistence ───────────────────────────────────────────────

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        full_config().save_to(&path).expect("save");
        let loaded = TutorConfig::load_from(&path);

        assert_eq!(loaded, full_config());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_config_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = TutorConfig::load_from(&tmp_config_path(&tmp));
        assert_eq!(loaded, TutorConfig::default());
    }

    #[test]
    fn test_config_default_when_unparsable() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write");

        assert_eq!(TutorConfig::load_from(&path), TutorConfig::default());
    }

    #[test]
    fn test_config_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        full_config().save_to(&path).expect("save");
        assert!(path.exists());

        TutorConfig::clear_at(&path).expect("clear");
        assert!(!path.exists());

        // Clearing again is not an error.
        TutorConfig::clear_at(&path).expect("clear twice");
    }

    #[test]
    fn test_config_apply_only_overrides_given_fields() {
        let mut config = full_config();
        config.apply(TutorConfig {
            exercise: Some("ue04".to_string()),
            ..Default::default()
        });

        assert_eq!(config.exercise.as_deref(), Some("ue04"));
        assert_eq!(config.base_dir, Some(PathBuf::from("/course")));
        assert_eq!(config.csv_name.as_deref(), Some("counts.csv"));
    }

    // ── path resolution ───────────────────────────────────────────────────────

    #[test]
    fn test_reviews_dir_from_config() {
        let dir = full_config().reviews_dir(None).expect("resolved");
        assert_eq!(dir, PathBuf::from("/course/ue03/peer"));
    }

    #[test]
    fn test_reviews_dir_default_subdir() {
        let config = TutorConfig {
            reviews_subdir: None,
            ..full_config()
        };
        let dir = config.reviews_dir(None).expect("resolved");
        assert_eq!(dir, PathBuf::from("/course/ue03/reviews"));
    }

    #[test]
    fn test_reviews_dir_explicit_wins() {
        let dir = full_config()
            .reviews_dir(Some(Path::new("/elsewhere")))
            .expect("resolved");
        assert_eq!(dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_reviews_dir_requires_exercise() {
        let config = TutorConfig {
            exercise: None,
            ..full_config()
        };
        assert!(matches!(config.reviews_dir(None), Err(TutorError::Config(_))));
    }

    #[test]
    fn test_feedback_csv_resolution() {
        assert_eq!(
            full_config().feedback_csv(None).expect("resolved"),
            PathBuf::from("/course/counts.csv")
        );
        let config = TutorConfig {
            csv_name: None,
            ..full_config()
        };
        assert_eq!(
            config.feedback_csv(None).expect("resolved"),
            PathBuf::from("/course/feedback.csv")
        );
    }

    #[test]
    fn test_feedback_csv_requires_base_dir() {
        let err = TutorConfig::default().feedback_csv(None).unwrap_err();
        assert!(err.to_string().contains("no base directory configured"));
    }

    // ── CLI parsing ───────────────────────────────────────────────────────────

    #[test]
    fn test_settings_feedback_defaults() {
        let settings = Settings::load_from_args(["tutorbot", "feedback"]);

        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert_eq!(
            settings.command,
            Command::Feedback {
                reviews_dir: None,
                csv: None,
                fresh: false,
                dry_run: false,
            }
        );
    }

    #[test]
    fn test_settings_feedback_flags() {
        let settings = Settings::load_from_args([
            "tutorbot",
            "feedback",
            "--reviews-dir",
            "/tmp/reviews",
            "--csv",
            "/tmp/f.csv",
            "--fresh",
            "--dry-run",
        ]);

        assert_eq!(
            settings.command,
            Command::Feedback {
                reviews_dir: Some(PathBuf::from("/tmp/reviews")),
                csv: Some(PathBuf::from("/tmp/f.csv")),
                fresh: true,
                dry_run: true,
            }
        );
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings = Settings::load_from_args(["tutorbot", "show", "--debug"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_settings_least_count() {
        let settings = Settings::load_from_args(["tutorbot", "least", "-n", "3"]);
        assert_eq!(settings.command, Command::Least { csv: None, count: 3 });
    }

    #[test]
    fn test_settings_explicit_config_path() {
        let settings =
            Settings::load_from_args(["tutorbot", "--config", "/tmp/tb.json", "show"]);
        assert_eq!(settings.config_path(), PathBuf::from("/tmp/tb.json"));
    }
}
