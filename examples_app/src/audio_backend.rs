use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait};
use emuaudio_core::{OutputSink, SinkError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Queue = Arc<Mutex<VecDeque<f32>>>;

/// Feeds a cpal output stream from a bounded sample queue.
///
/// The pipeline writes interleaved stereo f32 bytes; the device callback
/// drains the queue and plays silence when it runs dry.
pub struct CpalSink {
    queue: Queue,
    capacity: usize,
}

impl CpalSink {
    /// Frames waiting to be played.
    pub fn queued_frames(&self) -> usize {
        self.queue.lock().map(|q| q.len() / 2).unwrap_or(0)
    }
}

impl OutputSink for CpalSink {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        let mut queue = self.queue.lock().map_err(|_| SinkError::Closed)?;
        let free = self.capacity.saturating_sub(queue.len());
        let samples = (data.len() / 4).min(free);

        for bytes in data[..samples * 4].chunks_exact(4) {
            queue.push_back(f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        }
        Ok(samples * 4)
    }

    fn write_avail(&self) -> Option<usize> {
        let queue = self.queue.lock().ok()?;
        Some(self.capacity.saturating_sub(queue.len()) * 4)
    }

    fn buffer_size(&self) -> Option<usize> {
        Some(self.capacity * 4)
    }
}

/// Opens the default output device.
///
/// Returns the stream, its sample rate and the sink to write to.
pub fn init_output(buffer_frames: usize) -> Result<(cpal::Stream, f64, CpalSink)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;
    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate() as f64;

    let capacity = buffer_frames * 2;
    let queue: Queue = Arc::new(Mutex::new(VecDeque::with_capacity(capacity)));

    let err_fn = |err| eprintln!("an error occurred on stream: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => run::<f32>(&device, &config.into(), queue.clone(), err_fn)?,
        cpal::SampleFormat::I16 => run::<i16>(&device, &config.into(), queue.clone(), err_fn)?,
        cpal::SampleFormat::U16 => run::<u16>(&device, &config.into(), queue.clone(), err_fn)?,
        _ => return Err(anyhow::anyhow!("Unsupported sample format")),
    };

    Ok((stream, sample_rate, CpalSink { queue, capacity }))
}

fn run<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    queue: Queue,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let Ok(mut queue) = queue.lock() else {
                return;
            };

            for frame in data.chunks_mut(channels) {
                let left = queue.pop_front().unwrap_or(0.0);
                let right = queue.pop_front().unwrap_or(left);

                if channels >= 2 {
                    frame[0] = T::from_sample(left);
                    frame[1] = T::from_sample(right);
                    for extra in frame.iter_mut().skip(2) {
                        *extra = T::from_sample(0.0);
                    }
                } else {
                    frame[0] = T::from_sample((left + right) * 0.5);
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
