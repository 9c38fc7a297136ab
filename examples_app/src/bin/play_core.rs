use anyhow::Result;
use cpal::traits::StreamTrait;
use emuaudio_core::pipeline::{Pipeline, PipelineConfig};
use emuaudio_core::resampler::ResamplerQuality;
use emuaudio_core::{FilterConfig, SampleFormat};
use emuaudio_demos::audio_backend::init_output;
use emuaudio_demos::{init_logging, ToneCore};
use std::thread;
use std::time::{Duration, Instant};

const CORE_RATE: f64 = 32040.0;
const FPS: f64 = 60.0;

fn main() -> Result<()> {
    init_logging();

    let (stream, device_rate, mut sink) = init_output(4096)?;

    let config = PipelineConfig::new(CORE_RATE, device_rate)
        .with_resampler("hermite", ResamplerQuality::Normal)
        .with_output_format(SampleFormat::F32)
        .with_rate_control(0.005)
        .with_filter("crystalizer", FilterConfig::new().with_float("intensity", 2.0))
        .with_filter(
            "echo",
            FilterConfig::new()
                .with_float_array("delay", &[180.0, 310.0])
                .with_float_array("feedback", &[0.4, 0.3])
                .with_float("amp", 0.25),
        );

    let resamplers = emuaudio_core::resampler::builtin_registry()?;
    let filters = emuaudio_core::filters::builtin_registry()?;
    let mut pipeline = Pipeline::new(&config, &resamplers, &filters)?;
    let slowmotion = pipeline.slowmotion_ratio();

    println!("Playing a {} Hz core through the pipeline at {} Hz...", CORE_RATE, device_rate);
    println!("Filters: {:?}", pipeline.filters().names());

    stream.play()?;

    let mut core = ToneCore::new(440.0, CORE_RATE as f32);
    let frames_per_video_frame = (CORE_RATE / FPS) as usize;
    let mut block = vec![0i16; frames_per_video_frame * 2];
    let frame_time = Duration::from_secs_f64(1.0 / FPS);

    for frame in 0..(FPS as usize * 8) {
        let start = Instant::now();

        if frame == FPS as usize * 3 {
            println!("Slow motion on");
            pipeline.set_slowmotion(true);
        }
        if frame == FPS as usize * 5 {
            slowmotion.set(1.5);
        }
        if frame == FPS as usize * 6 {
            println!("Slow motion off");
            pipeline.set_slowmotion(false);
        }

        core.render(&mut block);
        pipeline.process_s16(&block, &mut sink)?;

        if let Some(rest) = frame_time.checked_sub(start.elapsed()) {
            thread::sleep(rest);
        }
    }

    let stats = pipeline.stats();
    println!(
        "Done: {} frames in, {} frames out, {} bytes dropped, {} frames still queued",
        stats.frames_in,
        stats.frames_out,
        stats.bytes_dropped,
        sink.queued_frames()
    );

    Ok(())
}
