//! Voice level metering for the orb's audio coupling.
//!
//! The meter turns raw sample blocks into a smoothed `[0, 1]` level. Speech
//! is favoured over rumble and hiss by weighting the block RMS with the share
//! of spectral energy that falls in the telephone voice band.

use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{config::AudioConfig, OrbError, Result};

const VOICE_BAND_HZ: (f32, f32) = (300.0, 3400.0);
const MIN_TIME_CONSTANT: f32 = 1e-4;

pub struct AudioLevelMeter {
    config: AudioConfig,
    level: f32,
    fft_planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl AudioLevelMeter {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            level: 0.0,
            fft_planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// The smoothed level, in `[0, 1]`.
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }

    /// Meters one block of mono samples and returns the updated level.
    pub fn process_block(&mut self, samples: &[f32]) -> Result<f32> {
        if samples.is_empty() {
            return Err(OrbError::InvalidInput("empty audio block"));
        }

        let rms = block_rms(samples);
        let voice = self.voice_fraction(samples)?;
        let target = (rms * self.config.gain * (0.5 + 0.5 * voice)).clamp(0.0, 1.0);
        Ok(self.follow(target, self.block_seconds(samples.len())))
    }

    /// Feeds an RMS measured elsewhere, covering `seconds` of audio.
    pub fn push_rms(&mut self, rms: f32, seconds: f32) -> f32 {
        let rms = if rms.is_finite() { rms.max(0.0) } else { 0.0 };
        let target = (rms * self.config.gain).clamp(0.0, 1.0);
        self.follow(target, seconds.max(0.0))
    }

    /// Share of spectral energy between 300 Hz and 3.4 kHz.
    pub fn voice_fraction(&mut self, samples: &[f32]) -> Result<f32> {
        let len = samples.len();
        if len < 2 {
            return Ok(0.0);
        }
        let bin_hz = self.config.sample_rate as f32 / len as f32;
        let fft = self.prepare_fft(len)?;

        for (index, value) in samples.iter().enumerate() {
            let value = if value.is_finite() { *value } else { 0.0 };
            fft.input[index] = value * hann_value(index, len);
        }
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let mut total = 0.0;
        let mut voice = 0.0;
        for (i, bin) in fft.spectrum.iter().enumerate() {
            let energy = bin.norm_sqr();
            total += energy;
            let hz = i as f32 * bin_hz;
            if (VOICE_BAND_HZ.0..=VOICE_BAND_HZ.1).contains(&hz) {
                voice += energy;
            }
        }

        if total <= f32::EPSILON {
            Ok(0.0)
        } else {
            Ok((voice / total).clamp(0.0, 1.0))
        }
    }

    fn block_seconds(&self, len: usize) -> f32 {
        len as f32 / self.config.sample_rate.max(1) as f32
    }

    fn follow(&mut self, target: f32, seconds: f32) -> f32 {
        let tau = if target > self.level {
            self.config.attack_seconds
        } else {
            self.config.release_seconds
        };
        let coeff = 1.0 - (-seconds / tau.max(MIN_TIME_CONSTANT)).exp();
        self.level = (self.level + (target - self.level) * coeff).clamp(0.0, 1.0);
        self.level
    }

    fn prepare_fft(&mut self, size: usize) -> Result<&mut FftResources> {
        let stale = self.fft.as_ref().map_or(true, |fft| fft.size != size);
        if stale {
            let plan = self.fft_planner.plan_fft_forward(size);
            self.fft = Some(FftResources {
                size,
                scratch: plan.make_scratch_vec(),
                spectrum: plan.make_output_vec(),
                input: plan.make_input_vec(),
                plan,
            });
        }
        self.fft
            .as_mut()
            .ok_or_else(|| OrbError::msg("fft resources missing"))
    }
}

impl fmt::Debug for AudioLevelMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioLevelMeter")
            .field("config", &self.config)
            .field("level", &self.level)
            .field("fft_size", &self.fft.as_ref().map(|fft| fft.size))
            .finish()
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

fn block_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples
        .iter()
        .map(|s| if s.is_finite() { s * s } else { 0.0 })
        .sum();
    (sum / samples.len() as f32).sqrt()
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
