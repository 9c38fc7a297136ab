//! The per-block driver: decode, filter, resample, hand off.

pub mod config;
pub mod sink;

pub use config::{FilterSpec, PipelineConfig, WritePolicy};
pub use sink::{NullSink, OutputSink};

use crate::convert::{db_to_gain, Converter};
use crate::core::channels::{upmix_mono, Channels};
use crate::core::dsp_chain::FilterChain;
use crate::core::dsp_filter::FilterDescriptor;
use crate::core::error::{Error, SinkError};
use crate::core::parameter::{Parameter, Watched};
use crate::core::registry::Registry;
use crate::core::sample_block::{SampleBlock, SampleFormat};
use crate::resampler::{ResampleRequest, Resampler, ResamplerDescriptor};
use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use config::{check_rate, check_ratio, MAX_SLOWMOTION_RATIO, MIN_SLOWMOTION_RATIO};
use sink::write_with_policy;
use log::{debug, error, info, warn};

/// Extra output frames reserved beyond the worst-case ratio estimate.
const RESAMPLE_HEADROOM: usize = 16;

/// Running counters, for drift and underrun checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Input frames that went through the pipeline.
    pub frames_in: u64,
    /// Frames offered to the sink.
    pub frames_out: u64,
    pub bytes_written: u64,
    /// Bytes the sink did not take within the write policy.
    pub bytes_dropped: u64,
}

enum Source<'a> {
    S16(&'a [i16]),
    F32(&'a [f32]),
}

impl Source<'_> {
    fn samples(&self) -> usize {
        match self {
            Source::S16(s) => s.len(),
            Source::F32(s) => s.len(),
        }
    }
}

/// Final stage: format conversion and the sink write.
struct Delivery {
    format: SampleFormat,
    converter: Converter,
    converted: SampleBlock,
    policy: WritePolicy,
    stats: PipelineStats,
}

impl Delivery {
    fn emit(&mut self, samples: &[f32], sink: &mut dyn OutputSink) -> Result<(), SinkError> {
        match self.format {
            SampleFormat::F32 => self.write(bytemuck::cast_slice(samples), sink),
            SampleFormat::S16 => {
                let piece_len = self.converted.capacity() * 2;
                for piece in samples.chunks(piece_len) {
                    let Some(storage) = self.converted.s16_storage_mut() else {
                        break;
                    };
                    let count = (self.converter.float_to_s16)(storage, piece);
                    self.converted.set_frames(count / 2);

                    let data = self.converted.as_bytes();
                    let dropped = write_with_policy(sink, data, self.policy)?;
                    record(&mut self.stats, data.len(), dropped);
                }
                Ok(())
            }
        }
    }

    fn write(&mut self, data: &[u8], sink: &mut dyn OutputSink) -> Result<(), SinkError> {
        let dropped = write_with_policy(sink, data, self.policy)?;
        record(&mut self.stats, data.len(), dropped);
        Ok(())
    }
}

fn record(stats: &mut PipelineStats, offered: usize, dropped: usize) {
    stats.bytes_written += (offered - dropped) as u64;
    stats.bytes_dropped += dropped as u64;
    if dropped > 0 {
        warn!("Audio sink dropped {} of {} bytes", dropped, offered);
    }
}

/// The audio conversion pipeline.
///
/// Each call decodes core samples to stereo float, runs the filter chain,
/// resamples to the device rate and writes the result to an [`OutputSink`].
/// All buffers are sized at construction; processing never allocates.
///
/// A pipeline is driven from one thread. Volume and the slow-motion factor
/// are [`Parameter`]s and may be changed from anywhere; the new value is
/// picked up at the next call.
pub struct Pipeline {
    input_rate: f64,
    output_rate: f64,
    base_ratio: f64,
    channels: Channels,
    max_block_frames: usize,
    rate_control_delta: Option<f64>,
    converter: Converter,
    volume_db: Watched,
    gain: f32,
    slowmotion: Watched,
    slowmotion_active: bool,
    muted: bool,
    paused: bool,
    active: bool,
    chain: FilterChain,
    resampler: Box<dyn Resampler>,
    work: SampleBlock,
    spare: SampleBlock,
    resampled: SampleBlock,
    staged: Vec<i16>,
    delivery: Delivery,
}

impl Pipeline {
    /// Builds a pipeline, instantiating its resampler and filters from the
    /// given registries.
    ///
    /// Fails without side effects if the configuration is invalid or any
    /// named plugin is unknown or fails to initialize.
    pub fn new(
        config: &PipelineConfig,
        resamplers: &Registry<ResamplerDescriptor>,
        filters: &Registry<FilterDescriptor>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let base_ratio = config.ratio();
        let descriptor = resamplers.get_implementation(&config.resampler, config.caps)?;
        let resampler = descriptor.instantiate(
            &config.resampler_config,
            config.bandwidth_mod,
            config.quality,
            config.caps,
        )?;
        if resampler.is_passthrough() && base_ratio != 1.0 {
            return Err(Error::InvalidConfig(format!(
                "resampler \"{}\" cannot convert {} Hz to {} Hz",
                config.resampler,
                config.input_rate,
                config.output_rate
            )));
        }
        debug!(
            "Resampler \"{}\" selected (accel {:?})",
            descriptor.ident, descriptor.accel
        );

        let chain = FilterChain::from_registry(
            filters,
            config.caps,
            config.input_rate as f32,
            config
                .filters
                .iter()
                .map(|spec| (spec.ident.as_str(), &spec.config)),
        )?;

        let block = config.max_block_frames;
        let peak = chain.peak_frames(block);
        let worst_ratio = base_ratio
            * (1.0 + config.rate_control_delta.unwrap_or(0.0))
            * f64::from(config.slowmotion_ratio);
        let out_frames = libm::ceil(peak as f64 * worst_ratio) as usize + RESAMPLE_HEADROOM;

        let work = SampleBlock::with_capacity(SampleFormat::F32, 2, peak, "pipeline")?;
        let spare = SampleBlock::with_capacity(SampleFormat::F32, 2, peak, "pipeline")?;
        let resampled = SampleBlock::with_capacity(SampleFormat::F32, 2, out_frames, "pipeline")?;
        let converted = SampleBlock::with_capacity(
            config.output_format,
            2,
            if config.output_format == SampleFormat::S16 {
                out_frames.max(peak)
            } else {
                0
            },
            "pipeline",
        )?;

        let mut staged = Vec::new();
        staged
            .try_reserve_exact(block * config.channels.count())
            .map_err(|_| Error::allocation("pipeline"))?;

        let converter = Converter::select(config.caps);
        let volume = Parameter::new(config.volume_db);
        let slowmotion = Parameter::new(config.slowmotion_ratio);

        info!(
            "Audio pipeline: {} Hz -> {} Hz, resampler \"{}\", {} filter(s), {} converter",
            config.input_rate,
            config.output_rate,
            config.resampler,
            chain.len(),
            converter.ident
        );

        Ok(Pipeline {
            input_rate: config.input_rate,
            output_rate: config.output_rate,
            base_ratio,
            channels: config.channels,
            max_block_frames: block,
            rate_control_delta: config.rate_control_delta,
            converter,
            volume_db: volume.watch(),
            gain: db_to_gain(config.volume_db),
            slowmotion: slowmotion.watch(),
            slowmotion_active: false,
            muted: false,
            paused: false,
            active: true,
            chain,
            resampler,
            work,
            spare,
            resampled,
            staged,
            delivery: Delivery {
                format: config.output_format,
                converter,
                converted,
                policy: config.write_policy,
                stats: PipelineStats::default(),
            },
        })
    }

    /// Processes interleaved s16 samples in the configured channel layout.
    ///
    /// Returns the number of frames accepted, which is always every whole
    /// frame offered. Input is silently discarded while muted, paused or
    /// after the sink failed.
    pub fn process_s16(
        &mut self,
        samples: &[i16],
        sink: &mut dyn OutputSink,
    ) -> Result<usize, Error> {
        self.process(Source::S16(samples), sink)
    }

    /// Processes interleaved float samples in the configured channel layout.
    pub fn process_f32(
        &mut self,
        samples: &[f32],
        sink: &mut dyn OutputSink,
    ) -> Result<usize, Error> {
        self.process(Source::F32(samples), sink)
    }

    /// Queues a single frame, flushing once a full block has accumulated.
    ///
    /// For mono pipelines only `left` is used.
    pub fn push_frame(
        &mut self,
        left: i16,
        right: i16,
        sink: &mut dyn OutputSink,
    ) -> Result<(), Error> {
        self.staged.push(left);
        if self.channels == Channels::Stereo {
            self.staged.push(right);
        }

        if self.staged.len() == self.staged.capacity() {
            self.flush_staged(sink)?;
        }
        Ok(())
    }

    /// Processes whatever [`push_frame`](Self::push_frame) has queued.
    pub fn flush_staged(&mut self, sink: &mut dyn OutputSink) -> Result<(), Error> {
        let staged = core::mem::take(&mut self.staged);
        let result = self.process(Source::S16(&staged), sink);
        self.staged = staged;
        self.staged.clear();
        result.map(|_| ())
    }

    fn process(&mut self, source: Source<'_>, sink: &mut dyn OutputSink) -> Result<usize, Error> {
        let channels = self.channels.count();
        let frames = source.samples() / channels;

        if self.paused || self.muted || !self.active {
            return Ok(frames);
        }

        if let Some(db) = self.volume_db.poll() {
            self.gain = db_to_gain(db);
            debug!("Audio volume set to {} dB", db);
        }
        let ratio = self.current_ratio(sink);

        let mut offset = 0;
        while offset < frames {
            let count = (frames - offset).min(self.max_block_frames);
            let range = offset * channels..(offset + count) * channels;
            let chunk = match &source {
                Source::S16(s) => Source::S16(&s[range]),
                Source::F32(s) => Source::F32(&s[range]),
            };

            if let Err(e) = self.run_block(chunk, count, ratio, sink) {
                error!("Audio sink failed to write ({}). Will continue without sound.", e);
                self.active = false;
                return Err(Error::Sink(e));
            }
            offset += count;
        }

        Ok(frames)
    }

    fn run_block(
        &mut self,
        source: Source<'_>,
        frames: usize,
        ratio: f64,
        sink: &mut dyn OutputSink,
    ) -> Result<(), SinkError> {
        let Pipeline {
            converter,
            gain,
            chain,
            resampler,
            work,
            spare,
            resampled,
            delivery,
            ..
        } = self;

        let (Some(current), Some(scratch)) = (work.f32_storage_mut(), spare.f32_storage_mut())
        else {
            return Ok(());
        };

        let stereo = frames * 2;
        match source {
            Source::S16(input) if input.len() == stereo => {
                (converter.s16_to_float)(&mut current[..stereo], input, *gain);
            }
            Source::S16(input) => {
                (converter.s16_to_float)(&mut scratch[..frames], input, *gain);
                upmix_mono(current, &scratch[..frames]);
            }
            Source::F32(input) => {
                if input.len() == stereo {
                    current[..stereo].copy_from_slice(input);
                } else {
                    upmix_mono(current, input);
                }
                if *gain != 1.0 {
                    (converter.apply_gain)(&mut current[..stereo], *gain);
                }
            }
        }
        delivery.stats.frames_in += frames as u64;

        let (filtered, frames) = chain.process(current, scratch, frames);
        let filtered = &filtered[..frames * 2];

        if frames == 0 {
            return Ok(());
        }
        if resampler.is_passthrough() {
            delivery.stats.frames_out += frames as u64;
            return delivery.emit(filtered, sink);
        }

        let Some(output) = resampled.f32_storage_mut() else {
            return Ok(());
        };

        let mut offset = 0;
        while offset < frames {
            let mut request = ResampleRequest::new(&filtered[offset * 2..], output, ratio);
            resampler.process(&mut request);
            let (consumed, produced) = (request.frames_consumed, request.frames_produced);

            if produced > 0 {
                delivery.stats.frames_out += produced as u64;
                delivery.emit(&output[..produced * 2], sink)?;
            }
            if consumed == 0 && produced == 0 {
                break;
            }
            offset += consumed;
        }

        Ok(())
    }

    /// Ratio for this call: base ratio, nudged by rate control, stretched by
    /// slow motion.
    fn current_ratio(&mut self, sink: &dyn OutputSink) -> f64 {
        let mut ratio = self.base_ratio;

        if let Some(delta) = self.rate_control_delta {
            if let (Some(avail), Some(size)) = (sink.write_avail(), sink.buffer_size()) {
                let half = size as f64 / 2.0;
                if half > 0.0 {
                    let direction = (avail as f64 - half) / half;
                    ratio *= 1.0 + delta * direction.clamp(-1.0, 1.0);
                }
            }
        }

        if let Some(factor) = self.slowmotion.poll() {
            debug!("Slow motion ratio set to {}", factor);
        }
        if self.slowmotion_active {
            let factor = self
                .slowmotion
                .current()
                .clamp(MIN_SLOWMOTION_RATIO, MAX_SLOWMOTION_RATIO);
            ratio *= f64::from(factor);
        }

        ratio
    }

    /// Changes the device rate. Takes effect on the next call; resampler
    /// history is kept.
    pub fn set_output_rate(&mut self, rate: f64) -> Result<(), Error> {
        check_rate("output_rate", rate)?;
        check_ratio(rate / self.input_rate)?;
        if self.resampler.is_passthrough() && rate != self.input_rate {
            return Err(Error::InvalidConfig(format!(
                "passthrough resampler cannot convert {} Hz to {} Hz",
                self.input_rate,
                rate
            )));
        }
        self.output_rate = rate;
        self.base_ratio = rate / self.input_rate;
        debug!("Audio output rate set to {} Hz", rate);
        Ok(())
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    pub fn input_rate(&self) -> f64 {
        self.input_rate
    }

    /// Ratio before rate control and slow motion.
    pub fn base_ratio(&self) -> f64 {
        self.base_ratio
    }

    /// Volume in dB, shared with other threads.
    pub fn volume(&self) -> Parameter {
        self.volume_db.parameter().clone()
    }

    /// Slow-motion factor, shared with other threads.
    pub fn slowmotion_ratio(&self) -> Parameter {
        self.slowmotion.parameter().clone()
    }

    pub fn set_slowmotion(&mut self, active: bool) {
        self.slowmotion_active = active;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// False once the sink has failed.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Re-enables output after a sink failure, clearing signal history.
    pub fn reactivate(&mut self) {
        self.reset();
        self.active = true;
        info!("Audio output re-enabled");
    }

    /// Clears resampler and filter history.
    pub fn reset(&mut self) {
        self.resampler.reset();
        self.chain.reset();
        self.staged.clear();
    }

    pub fn filters(&self) -> &FilterChain {
        &self.chain
    }

    pub fn filters_mut(&mut self) -> &mut FilterChain {
        &mut self.chain
    }

    /// Delay through filters and resampler, in input frames.
    pub fn latency_frames(&self) -> usize {
        self.chain.latency_frames() + self.resampler.latency_frames()
    }

    pub fn stats(&self) -> PipelineStats {
        self.delivery.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::simd::SimdCaps;
    use crate::core::config::FilterConfig;
    use crate::resampler::ResamplerQuality;
    use alloc::vec;

    fn registries() -> (Registry<ResamplerDescriptor>, Registry<FilterDescriptor>) {
        (
            crate::resampler::builtin_registry().unwrap(),
            crate::filters::builtin_registry().unwrap(),
        )
    }

    fn build(config: PipelineConfig) -> Result<Pipeline, Error> {
        let (resamplers, filters) = registries();
        Pipeline::new(&config.with_caps(SimdCaps::empty()), &resamplers, &filters)
    }

    fn passthrough(rate: f64) -> PipelineConfig {
        PipelineConfig::new(rate, rate).with_resampler("null", ResamplerQuality::DontCare)
    }

    fn as_i16(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    fn as_f32(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    fn ramp(frames: usize) -> Vec<i16> {
        (0..frames * 2)
            .map(|i| ((i as i32 * 977) % 65536 - 32768) as i16)
            .collect()
    }

    struct Broken {
        calls: usize,
    }

    impl OutputSink for Broken {
        fn write(&mut self, _data: &[u8]) -> Result<usize, SinkError> {
            self.calls += 1;
            Err(SinkError::Closed)
        }
    }

    struct Device {
        avail: usize,
        size: usize,
    }

    impl OutputSink for Device {
        fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
            Ok(data.len())
        }

        fn write_avail(&self) -> Option<usize> {
            Some(self.avail)
        }

        fn buffer_size(&self) -> Option<usize> {
            Some(self.size)
        }
    }

    #[test]
    fn test_passthrough_s16_is_lossless() {
        let mut pipeline = build(passthrough(48000.0)).unwrap();
        let input = ramp(700);
        let mut sink = Vec::new();

        assert_eq!(pipeline.process_s16(&input, &mut sink).unwrap(), 700);
        assert_eq!(as_i16(&sink), input);

        let stats = pipeline.stats();
        assert_eq!(stats.frames_in, 700);
        assert_eq!(stats.frames_out, 700);
        assert_eq!(stats.bytes_written, 700 * 4);
        assert_eq!(stats.bytes_dropped, 0);
    }

    #[test]
    fn test_float_output_and_mono_upmix() {
        let config = passthrough(32000.0)
            .with_channels(Channels::Mono)
            .with_output_format(SampleFormat::F32);
        let mut pipeline = build(config).unwrap();
        let mut sink = Vec::new();

        assert_eq!(pipeline.process_s16(&[16384, -8192, 0], &mut sink).unwrap(), 3);
        assert_eq!(as_f32(&sink), vec![0.5, 0.5, -0.25, -0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_volume_and_live_change() {
        let config = passthrough(48000.0)
            .with_output_format(SampleFormat::F32)
            .with_volume_db(-20.0);
        let mut pipeline = build(config).unwrap();
        let mut sink = Vec::new();

        pipeline.process_f32(&[1.0, -1.0], &mut sink).unwrap();
        let out = as_f32(&sink);
        assert!((out[0] - 0.1).abs() < 1e-6);
        assert!((out[1] + 0.1).abs() < 1e-6);

        pipeline.volume().set(0.0);
        sink.clear();
        pipeline.process_f32(&[0.75, 0.25], &mut sink).unwrap();
        assert_eq!(as_f32(&sink), vec![0.75, 0.25]);
    }

    #[test]
    fn test_muted_and_paused_discard_input() {
        let mut pipeline = build(passthrough(48000.0)).unwrap();
        let mut sink = Vec::new();

        pipeline.set_muted(true);
        assert_eq!(pipeline.process_s16(&ramp(10), &mut sink).unwrap(), 10);
        pipeline.set_muted(false);
        pipeline.set_paused(true);
        assert_eq!(pipeline.process_s16(&ramp(10), &mut sink).unwrap(), 10);

        assert!(sink.is_empty());
        assert_eq!(pipeline.stats().frames_in, 0);

        pipeline.set_paused(false);
        pipeline.process_s16(&ramp(10), &mut sink).unwrap();
        assert_eq!(sink.len(), 40);
    }

    #[test]
    fn test_sink_failure_disables_audio() {
        let mut pipeline = build(passthrough(48000.0)).unwrap();
        let mut sink = Broken { calls: 0 };

        let result = pipeline.process_s16(&ramp(16), &mut sink);
        assert!(matches!(result, Err(Error::Sink(SinkError::Closed))));
        assert!(!pipeline.active());

        assert_eq!(pipeline.process_s16(&ramp(16), &mut sink).unwrap(), 16);
        assert_eq!(sink.calls, 1);

        pipeline.reactivate();
        assert!(pipeline.active());
    }

    #[test]
    fn test_drop_policy_counts_bytes() {
        struct Half;
        impl OutputSink for Half {
            fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
                Ok(data.len() / 2)
            }
        }

        let mut pipeline = build(passthrough(48000.0).with_write_policy(WritePolicy::Drop)).unwrap();
        pipeline.process_s16(&ramp(100), &mut Half).unwrap();
        let stats = pipeline.stats();
        assert_eq!(stats.bytes_written, 200);
        assert_eq!(stats.bytes_dropped, 200);
    }

    #[cfg(feature = "nearest")]
    #[test]
    fn test_large_input_is_chunked() {
        let config = PipelineConfig::new(44100.0, 44100.0)
            .with_resampler("nearest", ResamplerQuality::Lowest)
            .with_max_block_frames(256);
        let mut pipeline = build(config).unwrap();
        let input = ramp(3000);
        let mut sink = Vec::new();

        assert_eq!(pipeline.process_s16(&input, &mut sink).unwrap(), 3000);
        assert_eq!(as_i16(&sink), input);
        assert_eq!(pipeline.stats().frames_in, 3000);
    }

    #[cfg(feature = "nearest")]
    #[test]
    fn test_push_frame_flushes_full_blocks() {
        let config = PipelineConfig::new(48000.0, 48000.0)
            .with_resampler("nearest", ResamplerQuality::Lowest)
            .with_max_block_frames(4);
        let mut pipeline = build(config).unwrap();
        let mut sink = Vec::new();

        for i in 0..3 {
            pipeline.push_frame(i, -i, &mut sink).unwrap();
        }
        assert!(sink.is_empty());
        pipeline.push_frame(3, -3, &mut sink).unwrap();
        assert_eq!(as_i16(&sink), vec![0, 0, 1, -1, 2, -2, 3, -3]);

        pipeline.push_frame(9, 9, &mut sink).unwrap();
        pipeline.flush_staged(&mut sink).unwrap();
        assert_eq!(sink.len(), 5 * 4);
    }

    #[cfg(feature = "hermite")]
    #[test]
    fn test_hermite_32k_to_48k_frame_count() {
        let config = PipelineConfig::new(32000.0, 48000.0)
            .with_resampler("hermite", ResamplerQuality::Normal)
            .with_output_format(SampleFormat::F32)
            .with_max_block_frames(100);
        let mut pipeline = build(config).unwrap();
        let mut sink = Vec::new();

        for block in 0..10 {
            let input: Vec<f32> = (0..100)
                .flat_map(|i| {
                    let t = (block * 100 + i) as f32 / 32000.0;
                    let v = 0.5 * libm::sinf(2.0 * core::f32::consts::PI * 440.0 * t);
                    [v, v]
                })
                .collect();
            pipeline.process_f32(&input, &mut sink).unwrap();
        }

        let stats = pipeline.stats();
        assert_eq!(stats.frames_in, 1000);
        assert!(stats.frames_out.abs_diff(1500) <= 2);
        assert_eq!(sink.len() as u64, stats.frames_out * 8);
        assert_eq!(pipeline.latency_frames(), crate::resampler::hermite::LATENCY_FRAMES);
    }

    #[cfg(feature = "hermite")]
    #[test]
    fn test_rate_control_and_slow_motion() {
        let config = PipelineConfig::new(32000.0, 48000.0)
            .with_resampler("hermite", ResamplerQuality::Normal)
            .with_rate_control(0.005);
        let mut pipeline = build(config).unwrap();

        let empty = Device { avail: 1000, size: 1000 };
        assert!((pipeline.current_ratio(&empty) - 1.5 * 1.005).abs() < 1e-12);
        let full = Device { avail: 0, size: 1000 };
        assert!((pipeline.current_ratio(&full) - 1.5 * 0.995).abs() < 1e-12);
        let half = Device { avail: 500, size: 1000 };
        assert!((pipeline.current_ratio(&half) - 1.5).abs() < 1e-12);

        pipeline.set_slowmotion(true);
        assert!((pipeline.current_ratio(&half) - 4.5).abs() < 1e-9);
        pipeline.slowmotion_ratio().set(2.0);
        assert!((pipeline.current_ratio(&half) - 3.0).abs() < 1e-9);
        pipeline.slowmotion_ratio().set(50.0);
        assert!((pipeline.current_ratio(&half) - 15.0).abs() < 1e-9);

        pipeline.set_slowmotion(false);
        assert!((pipeline.current_ratio(&NullSink) - 1.5).abs() < 1e-12);
    }

    #[cfg(feature = "hermite")]
    #[test]
    fn test_set_output_rate() {
        let config = PipelineConfig::new(32000.0, 48000.0)
            .with_resampler("hermite", ResamplerQuality::Normal);
        let mut pipeline = build(config).unwrap();
        pipeline.set_output_rate(44100.0).unwrap();
        assert!((pipeline.base_ratio() - 44100.0 / 32000.0).abs() < 1e-12);
        assert!(pipeline.set_output_rate(-1.0).is_err());

        assert!(matches!(
            pipeline.set_output_rate(48_000_000.0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            pipeline.set_output_rate(32000.0 / 17.0),
            Err(Error::InvalidConfig(_))
        ));
        assert!((pipeline.output_rate() - 44100.0).abs() < 1e-9);
        pipeline.set_output_rate(32000.0 * 16.0).unwrap();

        let mut null = build(passthrough(48000.0)).unwrap();
        assert!(matches!(
            null.set_output_rate(44100.0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_filters_run_before_output() {
        let swap = FilterConfig::new()
            .with_float_array("left_mix", &[0.0, 1.0])
            .with_float_array("right_mix", &[1.0, 0.0]);
        let mut pipeline = build(passthrough(48000.0).with_filter("panning", swap)).unwrap();
        let mut sink = Vec::new();

        pipeline.process_s16(&[100, -200, 300, -400], &mut sink).unwrap();
        assert_eq!(as_i16(&sink), vec![-200, 100, -400, 300]);
        assert_eq!(pipeline.filters().names(), vec!["Panning"]);
    }

    #[cfg(feature = "eq")]
    #[test]
    fn test_buffered_filter_in_pipeline() {
        let mut pipeline = build(passthrough(48000.0).with_filter("eq", FilterConfig::new())).unwrap();
        let mut sink = Vec::new();

        pipeline.process_s16(&ramp(100), &mut sink).unwrap();
        assert!(sink.is_empty());
        pipeline.process_s16(&ramp(100), &mut sink).unwrap();
        assert_eq!(sink.len(), 128 * 4);
        assert_eq!(pipeline.latency_frames(), 128);
    }

    #[test]
    fn test_resampler_receives_init_settings() {
        use crate::core::registry::RegistryBuilder;
        use crate::resampler::{null, RESAMPLER_API_VERSION};

        fn picky(
            config: &FilterConfig,
            bandwidth_mod: f64,
            quality: ResamplerQuality,
            caps: SimdCaps,
        ) -> Result<Box<dyn Resampler>, Error> {
            if bandwidth_mod != 0.5 || config.get_float("cutoff", 0.0) != 0.9 {
                return Err(Error::InvalidConfig(alloc::string::String::from("picky")));
            }
            (null::DESCRIPTOR.init)(config, bandwidth_mod, quality, caps)
        }

        let resamplers = RegistryBuilder::new()
            .register(ResamplerDescriptor {
                ident: "picky",
                api_version: RESAMPLER_API_VERSION,
                accel: SimdCaps::empty(),
                init: picky,
            })
            .unwrap()
            .build();
        let filters = crate::filters::builtin_registry().unwrap();
        let base = PipelineConfig::new(48000.0, 48000.0)
            .with_resampler("picky", ResamplerQuality::DontCare)
            .with_caps(SimdCaps::empty());

        assert!(matches!(
            Pipeline::new(&base, &resamplers, &filters),
            Err(Error::PluginInit { .. })
        ));

        let tuned = base.with_resampler_config(FilterConfig::new().with_float("cutoff", 0.9), 0.5);
        assert!(Pipeline::new(&tuned, &resamplers, &filters).is_ok());
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            build(PipelineConfig::default().with_resampler("sinc", ResamplerQuality::Highest)),
            Err(Error::UnknownPlugin { .. })
        ));
        assert!(matches!(
            build(PipelineConfig::new(32000.0, 48000.0).with_resampler("null", ResamplerQuality::DontCare)),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            build(passthrough(48000.0).with_filter("flanger", FilterConfig::new())),
            Err(Error::UnknownPlugin { .. })
        ));
        #[cfg(feature = "eq")]
        assert!(matches!(
            build(passthrough(48000.0).with_filter("eq", FilterConfig::new().with_int_array("block_size_log2", &[4]))),
            Err(Error::PluginInit { .. })
        ));
    }
}
