use anyhow::{bail, Result};
use emuaudio_core::pipeline::{Pipeline, PipelineConfig};
use emuaudio_core::resampler::{ResamplerQuality, DEFAULT_RESAMPLER};
use emuaudio_core::{Channels, FilterConfig, SampleFormat};
use emuaudio_demos::init_logging;
use std::env;

/// Offline conversion: `render_wav <input.wav> <output.wav> [rate] [resampler]`.
fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: {} <input.wav> <output.wav> [rate] [resampler]", args[0]);
    }
    let output_rate: f64 = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(48000.0);
    let resampler = args.get(4).map(String::as_str).unwrap_or(DEFAULT_RESAMPLER);

    let mut reader = hound::WavReader::open(&args[1])?;
    let spec = reader.spec();
    let channels = match spec.channels {
        1 => Channels::Mono,
        2 => Channels::Stereo,
        n => bail!("{} channel input is not supported", n),
    };
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!("only 16-bit PCM input is supported");
    }

    let config = PipelineConfig::new(spec.sample_rate as f64, output_rate)
        .with_channels(channels)
        .with_output_format(SampleFormat::F32)
        .with_resampler(resampler, ResamplerQuality::Highest)
        .with_filter("panning", FilterConfig::new())
        .with_filter(
            "eq",
            FilterConfig::new()
                .with_float_array("frequencies", &[60.0, 1000.0, 8000.0])
                .with_float_array("gains", &[3.0, 0.0, -3.0]),
        );

    let resamplers = emuaudio_core::resampler::builtin_registry()?;
    let filters = emuaudio_core::filters::builtin_registry()?;
    let mut pipeline = Pipeline::new(&config, &resamplers, &filters)?;

    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    let mut rendered: Vec<u8> = Vec::new();
    pipeline.process_s16(&samples, &mut rendered)?;

    let out_spec = hound::WavSpec {
        channels: 2,
        sample_rate: output_rate as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args[2], out_spec)?;
    for bytes in rendered.chunks_exact(4) {
        writer.write_sample(f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))?;
    }
    writer.finalize()?;

    let stats = pipeline.stats();
    println!(
        "Rendered {} -> {} frames ({} Hz -> {} Hz, latency {} frames)",
        stats.frames_in,
        stats.frames_out,
        spec.sample_rate,
        output_rate,
        pipeline.latency_frames()
    );

    Ok(())
}
