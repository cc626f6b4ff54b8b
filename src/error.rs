use std::fmt;

use crate::dsp::stages::delay::MAX_DELAY_LENGTH;

/// Largest block the engine will allocate, in samples.
pub const MAX_BLOCK_SIZE: usize = 1 << 20;

/// Construction-time failures. Block processing itself never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    InvalidBlockSize(usize),
    InvalidSampleRate(u32),
    InvalidDelayLength(i64),
    InvalidFrequency(f64),
    InvalidGain(f32),
    InvalidClipThreshold(f32),
    UnknownStage(String),
    MalformedStage(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBlockSize(n) => write!(
                f,
                "block size must be between 1 and {MAX_BLOCK_SIZE}, got {n}"
            ),
            Self::InvalidSampleRate(r) => write!(f, "sample rate must be positive, got {r}"),
            Self::InvalidDelayLength(l) => write!(
                f,
                "delay length must be between 0 and {MAX_DELAY_LENGTH}, got {l}"
            ),
            Self::InvalidFrequency(hz) => {
                write!(f, "frequency must be finite and non-negative, got {hz}")
            }
            Self::InvalidGain(g) => write!(f, "gain must be finite, got {g}"),
            Self::InvalidClipThreshold(t) => {
                write!(f, "clip threshold must be finite and positive, got {t}")
            }
            Self::UnknownStage(kind) => write!(f, "unknown stage kind '{kind}'"),
            Self::MalformedStage(spec) => write!(f, "malformed stage spec '{spec}'"),
        }
    }
}

impl std::error::Error for PipelineError {}
