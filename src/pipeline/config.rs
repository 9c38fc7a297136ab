use crate::core::channels::Channels;
use crate::core::config::FilterConfig;
use crate::core::error::Error;
use crate::core::sample_block::SampleFormat;
use crate::core::simd::SimdCaps;
use crate::resampler::{ResamplerQuality, DEFAULT_RESAMPLER};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Largest accepted `output_rate / input_rate` before slow motion.
pub const MAX_RATIO: f64 = 16.0;
/// Bounds of the slow-motion factor.
pub const MIN_SLOWMOTION_RATIO: f32 = 1.0;
pub const MAX_SLOWMOTION_RATIO: f32 = 10.0;

pub const DEFAULT_RATE_CONTROL_DELTA: f64 = 0.005;
pub const DEFAULT_SLOWMOTION_RATIO: f32 = 3.0;
pub const DEFAULT_MAX_BLOCK_FRAMES: usize = 1024;

/// What to do with the part of a block the sink did not accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WritePolicy {
    /// Offer the remainder again, up to `attempts` more times, then drop it.
    Retry { attempts: u32 },
    /// Drop the remainder immediately.
    Drop,
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::Retry { attempts: 8 }
    }
}

/// One entry of the filter chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterSpec {
    pub ident: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub config: FilterConfig,
}

/// Everything needed to build a [`Pipeline`](super::Pipeline).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Rate the core produces, in Hz.
    pub input_rate: f64,
    /// Rate the output device consumes, in Hz.
    pub output_rate: f64,
    /// Channel layout of the core's samples.
    pub channels: Channels,
    /// Sample format handed to the sink.
    pub output_format: SampleFormat,
    /// Largest block, in input frames, processed in one pass. Bigger input
    /// is split.
    pub max_block_frames: usize,
    pub resampler: String,
    pub quality: ResamplerQuality,
    /// Settings handed to the resampler's constructor.
    pub resampler_config: FilterConfig,
    /// Passband scale handed to the resampler's constructor.
    pub bandwidth_mod: f64,
    /// Host capabilities used to pick SIMD variants.
    #[cfg_attr(feature = "serde", serde(skip, default = "SimdCaps::detect"))]
    pub caps: SimdCaps,
    /// Output volume in decibels.
    pub volume_db: f32,
    /// Dynamic rate control strength, if enabled.
    pub rate_control_delta: Option<f64>,
    /// Ratio multiplier while slow motion is active.
    pub slowmotion_ratio: f32,
    pub write_policy: WritePolicy,
    /// Filters in processing order.
    pub filters: Vec<FilterSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_rate: 44100.0,
            output_rate: 48000.0,
            channels: Channels::Stereo,
            output_format: SampleFormat::S16,
            max_block_frames: DEFAULT_MAX_BLOCK_FRAMES,
            resampler: String::from(DEFAULT_RESAMPLER),
            quality: ResamplerQuality::default(),
            resampler_config: FilterConfig::new(),
            bandwidth_mod: 1.0,
            caps: SimdCaps::detect(),
            volume_db: 0.0,
            rate_control_delta: None,
            slowmotion_ratio: DEFAULT_SLOWMOTION_RATIO,
            write_policy: WritePolicy::default(),
            filters: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn new(input_rate: f64, output_rate: f64) -> Self {
        PipelineConfig {
            input_rate,
            output_rate,
            ..Self::default()
        }
    }

    pub fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_output_format(mut self, format: SampleFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_max_block_frames(mut self, frames: usize) -> Self {
        self.max_block_frames = frames;
        self
    }

    pub fn with_resampler(mut self, ident: &str, quality: ResamplerQuality) -> Self {
        self.resampler = String::from(ident);
        self.quality = quality;
        self
    }

    pub fn with_resampler_config(mut self, config: FilterConfig, bandwidth_mod: f64) -> Self {
        self.resampler_config = config;
        self.bandwidth_mod = bandwidth_mod;
        self
    }

    pub fn with_caps(mut self, caps: SimdCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_volume_db(mut self, db: f32) -> Self {
        self.volume_db = db;
        self
    }

    /// Enables dynamic rate control with strength `delta`.
    pub fn with_rate_control(mut self, delta: f64) -> Self {
        self.rate_control_delta = Some(delta);
        self
    }

    pub fn with_slowmotion_ratio(mut self, ratio: f32) -> Self {
        self.slowmotion_ratio = ratio;
        self
    }

    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Appends a filter to the chain.
    pub fn with_filter(mut self, ident: &str, config: FilterConfig) -> Self {
        self.filters.push(FilterSpec {
            ident: String::from(ident),
            config,
        });
        self
    }

    /// `output_rate / input_rate`.
    pub fn ratio(&self) -> f64 {
        self.output_rate / self.input_rate
    }

    /// Rejects settings no pipeline can run with.
    pub fn validate(&self) -> Result<(), Error> {
        check_rate("input_rate", self.input_rate)?;
        check_rate("output_rate", self.output_rate)?;

        check_ratio(self.ratio())?;

        if !(self.bandwidth_mod.is_finite() && self.bandwidth_mod > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "bandwidth_mod must be positive, got {}",
                self.bandwidth_mod
            )));
        }

        if self.max_block_frames == 0 {
            return Err(Error::InvalidConfig(String::from(
                "max_block_frames must be at least 1",
            )));
        }

        if !self.volume_db.is_finite() {
            return Err(Error::InvalidConfig(String::from("volume_db must be finite")));
        }

        if let Some(delta) = self.rate_control_delta {
            if !(0.0..1.0).contains(&delta) {
                return Err(Error::InvalidConfig(format!(
                    "rate_control_delta {delta} must be in 0..1"
                )));
            }
        }

        if !(MIN_SLOWMOTION_RATIO..=MAX_SLOWMOTION_RATIO).contains(&self.slowmotion_ratio) {
            return Err(Error::InvalidConfig(format!(
                "slowmotion_ratio {} is outside {MIN_SLOWMOTION_RATIO}..={MAX_SLOWMOTION_RATIO}",
                self.slowmotion_ratio
            )));
        }

        Ok(())
    }
}

pub(crate) fn check_ratio(ratio: f64) -> Result<(), Error> {
    if (1.0 / MAX_RATIO..=MAX_RATIO).contains(&ratio) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "rate ratio {ratio} is outside 1/{MAX_RATIO}..={MAX_RATIO}"
        )))
    }
}

pub(crate) fn check_rate(name: &str, rate: f64) -> Result<(), Error> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be positive, got {rate}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resampler, DEFAULT_RESAMPLER);
        assert_eq!(config.write_policy, WritePolicy::Retry { attempts: 8 });
    }

    #[test]
    fn test_rejects_bad_settings() {
        let cases = [
            PipelineConfig::new(0.0, 48000.0),
            PipelineConfig::new(48000.0, f64::NAN),
            PipelineConfig::new(1000.0, 48000.0),
            PipelineConfig::default().with_max_block_frames(0),
            PipelineConfig::default().with_slowmotion_ratio(0.5),
            PipelineConfig::default().with_rate_control(1.5),
            PipelineConfig::default().with_volume_db(f32::INFINITY),
            PipelineConfig::default().with_resampler_config(FilterConfig::new(), 0.0),
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_ratio_bounds_are_inclusive() {
        assert!(check_ratio(MAX_RATIO).is_ok());
        assert!(check_ratio(1.0 / MAX_RATIO).is_ok());
        assert!(matches!(check_ratio(17.0), Err(Error::InvalidConfig(_))));
        assert!(matches!(check_ratio(1.0 / 17.0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_collects_filters() {
        let config = PipelineConfig::new(32000.0, 48000.0)
            .with_filter("panning", FilterConfig::new())
            .with_filter("crystalizer", FilterConfig::new().with_float("intensity", 2.0));
        assert_eq!(config.filters.len(), 2);
        assert_eq!(config.filters[1].ident, "crystalizer");
        assert_eq!(config.ratio(), 1.5);
    }
}
