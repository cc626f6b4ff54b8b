use crate::dsp::stages::Stage;
use crate::error::PipelineError;

/// Symmetric hard clipper with a sharp cutoff at `±threshold`.
#[derive(Debug, Clone)]
pub struct ClipStage {
    threshold: f32,
}

impl ClipStage {
    pub fn new(threshold: f32) -> Result<Self, PipelineError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(PipelineError::InvalidClipThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Stage for ClipStage {
    fn name(&self) -> &'static str {
        "clip"
    }

    fn process(&mut self, input: f32) -> f32 {
        input.clamp(-self.threshold, self.threshold)
    }
}
