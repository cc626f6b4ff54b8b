use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::dsp::pipeline::Pipeline;
use crate::dsp::source::SineGenerator;
use crate::error::{MAX_BLOCK_SIZE, PipelineError};

pub mod stage;

pub use stage::StageConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Samples per second, used for the oscillator phase increment.
    pub sample_rate: u32,
    /// Samples per block, fixed for the whole run.
    pub block_size: usize,
    /// Source frequency in Hz.
    pub frequency: f64,
    /// Pause between two block cycles.
    pub cadence_ms: u64,
    /// Ordered stage chain.
    pub stages: Vec<StageConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 480,
            frequency: 1000.0,
            cadence_ms: 10,
            stages: vec![
                StageConfig::Gain { gain: 2.0 },
                StageConfig::Delay {
                    length: 4800,
                    fill: 0.0,
                },
            ],
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sample Rate: {}", self.sample_rate)?;
        writeln!(f, "Block Size: {}", self.block_size)?;
        writeln!(f, "Frequency: {} Hz", self.frequency)?;
        writeln!(f, "Cadence: {} ms", self.cadence_ms)?;
        write!(f, "Stages:")?;
        if self.stages.is_empty() {
            write!(f, " (none)")?;
        }
        for stage in &self.stages {
            write!(f, " {stage}")?;
        }
        Ok(())
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults when no path is
    /// given or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(path),
            Some(path) => {
                info!(
                    "No settings file at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                debug!("No settings file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self =
            serde_json::from_str(&contents).context("Failed to parse settings")?;
        debug!("Loaded settings from {path:?}");
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).context("Failed to write settings file")?;

        debug!("Saved settings to {path:?}");
        Ok(())
    }

    /// Checks every construction-time parameter and returns the first problem.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(1..=MAX_BLOCK_SIZE).contains(&self.block_size) {
            return Err(PipelineError::InvalidBlockSize(self.block_size));
        }
        SineGenerator::new(self.frequency, self.sample_rate)?;
        for stage in &self.stages {
            stage.validate()?;
        }
        Ok(())
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    pub fn build_source(&self) -> Result<SineGenerator, PipelineError> {
        SineGenerator::new(self.frequency, self.sample_rate)
    }

    pub fn build_pipeline(&self) -> Result<Pipeline, PipelineError> {
        self.stages.iter().map(StageConfig::to_stage).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_describe_reference_chain() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.cadence(), Duration::from_millis(10));

        let pipeline = settings.build_pipeline().unwrap();
        assert_eq!(pipeline.stage_names(), ["gain", "delay"]);
    }

    #[test]
    fn validate_reports_each_error_kind() {
        let settings = Settings {
            block_size: 0,
            ..Settings::default()
        };
        assert_eq!(settings.validate(), Err(PipelineError::InvalidBlockSize(0)));

        let settings = Settings {
            block_size: usize::MAX,
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(PipelineError::InvalidBlockSize(usize::MAX))
        );

        let settings = Settings {
            stages: vec![StageConfig::Delay {
                length: i64::MAX,
                fill: 0.0,
            }],
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(PipelineError::InvalidDelayLength(i64::MAX))
        );

        let settings = Settings {
            sample_rate: 0,
            ..Settings::default()
        };
        assert_eq!(settings.validate(), Err(PipelineError::InvalidSampleRate(0)));

        let settings = Settings {
            stages: vec![StageConfig::Delay {
                length: -10,
                fill: 0.0,
            }],
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(PipelineError::InvalidDelayLength(-10))
        );
        assert!(settings.build_pipeline().is_err());
    }

    #[test]
    fn save_and_load_from_disk() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("settings.json");

        let settings = Settings {
            frequency: 440.0,
            block_size: 128,
            stages: vec![
                StageConfig::Clip { threshold: 0.9 },
                StageConfig::Gain { gain: 0.5 },
            ],
            ..Settings::default()
        };
        settings.save_to(&path)?;

        let loaded = Settings::load(Some(&path))?;
        assert_eq!(loaded, settings);
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("absent.json");

        assert_eq!(Settings::load(Some(&path))?, Settings::default());
        assert_eq!(Settings::load(None)?, Settings::default());
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{ "block_size": 64 }"#)?;

        let loaded = Settings::load_from(&path)?;
        assert_eq!(loaded.block_size, 64);
        assert_eq!(loaded.sample_rate, 48_000);
        assert_eq!(loaded.stages, Settings::default().stages);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json")?;

        assert!(Settings::load_from(&path).is_err());
        Ok(())
    }
}
