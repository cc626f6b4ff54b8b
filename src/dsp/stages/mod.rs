pub mod clip;
pub mod delay;
pub mod gain;

use clip::ClipStage;
use delay::DelayStage;
use gain::GainStage;

// The core trait that all processing stages must implement
pub trait Stage: Send + 'static {
    // Short human-readable name, used in logs
    fn name(&self) -> &'static str;

    // Process a single sample through this stage
    fn process(&mut self, input: f32) -> f32;

    // Process a block of samples in place. The block length is never changed.
    fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

/// The closed set of stages a pipeline can hold.
#[derive(Debug, Clone)]
pub enum StageNode {
    Gain(GainStage),
    Delay(DelayStage),
    Clip(ClipStage),
}

impl Stage for StageNode {
    fn name(&self) -> &'static str {
        match self {
            Self::Gain(s) => s.name(),
            Self::Delay(s) => s.name(),
            Self::Clip(s) => s.name(),
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        match self {
            Self::Gain(s) => s.process(input),
            Self::Delay(s) => s.process(input),
            Self::Clip(s) => s.process(input),
        }
    }

    fn process_block(&mut self, block: &mut [f32]) {
        match self {
            Self::Gain(s) => s.process_block(block),
            Self::Delay(s) => s.process_block(block),
            Self::Clip(s) => s.process_block(block),
        }
    }
}

impl From<GainStage> for StageNode {
    fn from(stage: GainStage) -> Self {
        Self::Gain(stage)
    }
}

impl From<DelayStage> for StageNode {
    fn from(stage: DelayStage) -> Self {
        Self::Delay(stage)
    }
}

impl From<ClipStage> for StageNode {
    fn from(stage: ClipStage) -> Self {
        Self::Clip(stage)
    }
}
