use crate::dsp::stages::Stage;
use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct GainStage {
    gain: f32,
}

impl GainStage {
    pub fn new(gain: f32) -> Result<Self, PipelineError> {
        if !gain.is_finite() {
            return Err(PipelineError::InvalidGain(gain));
        }
        Ok(Self { gain })
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl Stage for GainStage {
    fn name(&self) -> &'static str {
        "gain"
    }

    fn process(&mut self, input: f32) -> f32 {
        input * self.gain
    }

    fn process_block(&mut self, block: &mut [f32]) {
        let gain = self.gain;
        block.iter_mut().for_each(|s| *s *= gain);
    }
}
