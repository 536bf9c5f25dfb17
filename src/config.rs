use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::answer::InputMode;
use crate::app_dirs::AppDirs;
use crate::error::ConfigurationError;
use crate::problem::Operator;

pub const MIN_TERMS: usize = 2;
pub const MAX_TERMS: usize = 10;
pub const MIN_DIGITS: u32 = 1;
pub const MAX_DIGITS: u32 = 3;
pub const MIN_DELAY_SECS: f64 = 0.1;
pub const MAX_DELAY_SECS: f64 = 2.0;

/// Everything needed to generate and pace one problem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub term_count: usize,
    pub min_digits: u32,
    pub max_digits: u32,
    pub operator: Operator,
    pub reveal_delay_secs: f64,
    pub input_mode: InputMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            term_count: 2,
            min_digits: 1,
            max_digits: 1,
            operator: Operator::Add,
            reveal_delay_secs: 1.0,
            input_mode: InputMode::Keypad,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(MIN_TERMS..=MAX_TERMS).contains(&self.term_count) {
            return Err(ConfigurationError::TermCountOutOfRange {
                got: self.term_count,
                min: MIN_TERMS,
                max: MAX_TERMS,
            });
        }

        for (field, got) in [
            ("minimum digits", self.min_digits),
            ("maximum digits", self.max_digits),
        ] {
            if !(MIN_DIGITS..=MAX_DIGITS).contains(&got) {
                return Err(ConfigurationError::DigitsOutOfRange {
                    field,
                    got,
                    min: MIN_DIGITS,
                    max: MAX_DIGITS,
                });
            }
        }

        if self.min_digits > self.max_digits {
            return Err(ConfigurationError::InvertedDigitRange {
                min: self.min_digits,
                max: self.max_digits,
            });
        }

        if !(self.reveal_delay_secs.is_finite() && self.reveal_delay_secs > 0.0) {
            return Err(ConfigurationError::InvalidDelay(self.reveal_delay_secs));
        }

        Ok(())
    }

    /// Move the reveal delay by `steps` increments of 0.1s, clamped to the
    /// range offered by the settings screen.
    pub fn step_delay(&mut self, steps: i32) {
        let tenths = (self.reveal_delay_secs * 10.0).round() + f64::from(steps);
        self.reveal_delay_secs = (tenths / 10.0).clamp(MIN_DELAY_SECS, MAX_DELAY_SECS);
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("anzan_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing, unreadable or invalid files all yield the defaults
    fn load(&self) -> Settings {
        let Ok(bytes) = fs::read(&self.path) else {
            return Settings::default();
        };

        match serde_json::from_slice::<Settings>(&bytes) {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "ignoring invalid settings file");
                    Settings::default()
                }
            },
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable settings file");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}
