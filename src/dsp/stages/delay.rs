use crate::dsp::stages::Stage;
use crate::error::PipelineError;

/// Longest delay line that configuration may ask for, in samples
/// (about 5.8 minutes at 48 kHz).
pub const MAX_DELAY_LENGTH: usize = 1 << 24;

/// Fixed-length delay line.
///
/// Each sample first reads the slot under the write cursor, then overwrites it
/// with the incoming sample and advances the cursor, so the output lags the
/// input by exactly `length` samples. History and cursor live as long as the
/// stage, so the delay is continuous across block boundaries whatever the
/// relation between `length` and the block size.
///
/// A length of zero is a pass-through.
#[derive(Debug, Clone)]
pub struct DelayStage {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayStage {
    pub fn new(length: usize) -> Self {
        Self::with_fill(length, 0.0)
    }

    /// Delay line whose history is primed with `fill` instead of silence.
    pub fn with_fill(length: usize, fill: f32) -> Self {
        Self {
            buffer: vec![fill; length],
            write_pos: 0,
        }
    }

    /// Validating constructor for lengths coming from untyped configuration.
    pub fn from_signed(length: i64, fill: f32) -> Result<Self, PipelineError> {
        let length = Self::checked_length(length)?;
        Ok(Self::with_fill(length, fill))
    }

    /// Accepts lengths in `0..=MAX_DELAY_LENGTH` without allocating anything.
    pub fn checked_length(length: i64) -> Result<usize, PipelineError> {
        usize::try_from(length)
            .ok()
            .filter(|&len| len <= MAX_DELAY_LENGTH)
            .ok_or(PipelineError::InvalidDelayLength(length))
    }

    /// Delay in samples.
    #[inline]
    pub fn length(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Stage for DelayStage {
    fn name(&self) -> &'static str {
        "delay"
    }

    fn process(&mut self, input: f32) -> f32 {
        if self.is_passthrough() {
            return input;
        }

        let delayed = std::mem::replace(&mut self.buffer[self.write_pos], input);

        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }

        delayed
    }

    fn process_block(&mut self, block: &mut [f32]) {
        if self.is_passthrough() {
            return;
        }

        for sample in block.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}
