//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It opens the default input device and streams fixed-size chunks of 16-bit
//! samples to the analysis thread.
//!
//! ## Features
//! - Automatic audio device selection
//! - `i16` or `f32` devices (f32 is converted to i16)
//! - Mono downmix by keeping the first channel of each frame
//! - Re-blocking of callback data into chunks of exactly `chunk_size` samples

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample, SupportedStreamConfigRange};
use crossbeam_channel::{Sender, TrySendError};
use anyhow::{Result, anyhow};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;

/// One hardware chunk as delivered to the analysis thread.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

/// Starts audio capture from the default input device.
///
/// # Arguments
/// * `config` - Requested sample rate and chunk size
/// * `sender` - Channel sender for streaming chunks to the analysis thread
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and the sample rate the
///   device actually runs at, which may differ from the request
/// * `Err(e)` - Error if audio setup fails
pub fn start_audio_capture(
    config: &PipelineConfig,
    sender: Sender<AudioChunk>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    let device_name = device.name()?;
    info!(device = %device_name, "using audio input device");

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, config.sample_rate)
        .ok_or_else(|| anyhow!("No suitable i16 or f32 input format found"))?;

    let sample_rate = clamp_sample_rate(&supported_config, config.sample_rate);
    let sample_format = supported_config.sample_format();
    let supported = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));
    let channels = supported.channels() as usize;
    let stream_config: cpal::StreamConfig = supported.into();

    info!(sample_rate, channels, format = ?sample_format, "selected input configuration");

    let chunker = Chunker::new(config.chunk_size, sample_rate, sender);
    let stream = match sample_format {
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, channels, chunker)?,
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, channels, chunker)?,
        other => return Err(anyhow!("Unsupported sample format {other:?}")),
    };

    stream.play()?;

    Ok((stream, sample_rate))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    mut chunker: Chunker,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let err_fn = |err| error!("an error occurred on the audio stream: {}", err);
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            for frame in data.chunks(channels.max(1)) {
                chunker.push(frame[0].to_sample::<i16>());
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

/// Accumulates callback samples and emits fixed-size chunks.
struct Chunker {
    chunk_size: usize,
    sample_rate: u32,
    pending: Vec<i16>,
    sender: Sender<AudioChunk>,
}

impl Chunker {
    fn new(chunk_size: usize, sample_rate: u32, sender: Sender<AudioChunk>) -> Self {
        Self {
            chunk_size,
            sample_rate,
            pending: Vec::with_capacity(chunk_size),
            sender,
        }
    }

    fn push(&mut self, sample: i16) {
        self.pending.push(sample);
        if self.pending.len() < self.chunk_size {
            return;
        }

        let samples = std::mem::replace(&mut self.pending, Vec::with_capacity(self.chunk_size));
        let chunk = AudioChunk {
            samples,
            sample_rate: self.sample_rate,
        };
        match self.sender.try_send(chunk) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("analysis queue full, dropping audio chunk"),
            // The analysis thread has shut down; the stream is about to be stopped.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Prefers mono over multichannel, then the range closest to `target_rate`.
/// Only `i16` and `f32` formats are considered.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| matches!(c.sample_format(), cpal::SampleFormat::I16 | cpal::SampleFormat::F32))
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            let in_range = c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0;
            let rate_cost = if in_range { 0 } else { min_diff.min(max_diff) };
            (c.channels() != 1, rate_cost)
        })
}

fn clamp_sample_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunker_emits_fixed_size_chunks_in_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut chunker = Chunker::new(3, 8000, tx);
        for sample in 0..7 {
            chunker.push(sample);
        }
        let chunks: Vec<AudioChunk> = rx.try_iter().collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples, vec![0, 1, 2]);
        assert_eq!(chunks[1].samples, vec![3, 4, 5]);
        assert!(chunks.iter().all(|c| c.sample_rate == 8000));
    }

    #[test]
    fn chunker_drops_when_the_queue_is_full() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut chunker = Chunker::new(1, 8000, tx);
        chunker.push(1);
        chunker.push(2);
        assert_eq!(rx.try_recv().unwrap().samples, vec![1]);
        assert!(rx.try_recv().is_err());
    }
}
