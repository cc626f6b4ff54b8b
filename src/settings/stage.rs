use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::dsp::stages::StageNode;
use crate::dsp::stages::clip::ClipStage;
use crate::dsp::stages::delay::DelayStage;
use crate::dsp::stages::gain::GainStage;
use crate::error::PipelineError;

// Stage configurations, tagged by kind in the settings file:
// { "kind": "delay", "length": 4800 }
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageConfig {
    Gain {
        gain: f32,
    },
    Delay {
        /// Delay in samples.
        length: i64,
        #[serde(default)]
        fill: f32,
    },
    Clip {
        threshold: f32,
    },
}

impl StageConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gain { .. } => "gain",
            Self::Delay { .. } => "delay",
            Self::Clip { .. } => "clip",
        }
    }

    /// Checks the parameters without building the stage, so no delay history
    /// is allocated.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match *self {
            Self::Gain { gain } => GainStage::new(gain).map(drop),
            Self::Delay { length, .. } => DelayStage::checked_length(length).map(drop),
            Self::Clip { threshold } => ClipStage::new(threshold).map(drop),
        }
    }

    pub fn to_stage(&self) -> Result<StageNode, PipelineError> {
        Ok(match *self {
            Self::Gain { gain } => GainStage::new(gain)?.into(),
            Self::Delay { length, fill } => DelayStage::from_signed(length, fill)?.into(),
            Self::Clip { threshold } => ClipStage::new(threshold)?.into(),
        })
    }
}

impl std::fmt::Display for StageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gain { gain } => write!(f, "gain:{gain}"),
            Self::Delay { length, fill } if *fill == 0.0 => write!(f, "delay:{length}"),
            Self::Delay { length, fill } => write!(f, "delay:{length}:{fill}"),
            Self::Clip { threshold } => write!(f, "clip:{threshold}"),
        }
    }
}

/// Parses the command line form `kind:param[:param]`, e.g. `gain:2.0`,
/// `delay:4800`, `delay:4800:0.1`, `clip:0.8`.
impl FromStr for StageConfig {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PipelineError::MalformedStage(s.to_string());

        let mut parts = s.trim().split(':');
        let kind = parts.next().unwrap_or_default().to_ascii_lowercase();
        let params: Vec<&str> = parts.collect();

        let float = |text: &str| text.trim().parse::<f32>().map_err(|_| malformed());

        let config = match (kind.as_str(), params.as_slice()) {
            ("gain", [gain]) => Self::Gain { gain: float(*gain)? },
            ("delay", [length] | [length, _]) => Self::Delay {
                length: length.trim().parse::<i64>().map_err(|_| malformed())?,
                fill: params.get(1).map_or(Ok(0.0), |fill| float(*fill))?,
            },
            ("clip", [threshold]) => Self::Clip {
                threshold: float(*threshold)?,
            },
            ("gain" | "delay" | "clip", _) => return Err(malformed()),
            _ => return Err(PipelineError::UnknownStage(kind)),
        };

        config.validate()?;
        Ok(config)
    }
}
