//! Sine wave signal source.

use std::f64::consts::TAU;

use crate::error::PipelineError;

/// Phase-continuous sine oscillator that fills one block per call.
///
/// Phase is kept in `f64` so that long runs don't drift; samples are emitted
/// as `f32`.
#[derive(Debug, Clone)]
pub struct SineGenerator {
    frequency: f64,
    sample_rate: u32,
    phase: f64,
    phase_inc: f64,
}

impl SineGenerator {
    pub fn new(frequency: f64, sample_rate: u32) -> Result<Self, PipelineError> {
        if sample_rate == 0 {
            return Err(PipelineError::InvalidSampleRate(sample_rate));
        }
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(PipelineError::InvalidFrequency(frequency));
        }

        Ok(Self {
            frequency,
            sample_rate,
            phase: 0.0,
            // Reduced so a single subtraction keeps the phase wrapped
            phase_inc: (TAU * frequency / f64::from(sample_rate)).rem_euclid(TAU),
        })
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current phase in `[0, 2π)`.
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Phase advance per sample, in radians.
    #[inline]
    pub fn phase_increment(&self) -> f64 {
        self.phase_inc
    }

    /// Fills `block` with the next `block.len()` samples of the waveform.
    pub fn generate_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.phase.sin() as f32;

            self.phase += self.phase_inc;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
        }
    }
}
