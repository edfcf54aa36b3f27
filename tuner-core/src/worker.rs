//! Dedicated analysis thread.
//!
//! The worker drains audio chunks in arrival order, runs them through an
//! [`AnalysisPipeline`] and publishes every result to a [`ResultPublisher`].

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, trace, warn};

use crate::audio::AudioChunk;
use crate::handoff::{Delivery, ResultPublisher};
use crate::pipeline::AnalysisPipeline;

/// Analysis thread management structure.
///
/// Handles the dedicated analysis thread and provides a way to shut it
/// down gracefully and take the pipeline back.
#[derive(Debug)]
pub struct AnalysisWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<AnalysisPipeline>>,
}

impl AnalysisWorker {
    /// Spawns the analysis thread.
    ///
    /// The thread runs until [`AnalysisWorker::shutdown`] is called, the
    /// chunk channel disconnects, or the result subscriber is dropped.
    pub fn spawn(
        pipeline: AnalysisPipeline,
        chunks: Receiver<AudioChunk>,
        publisher: ResultPublisher,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let thread_handle = thread::Builder::new()
            .name("analysis".into())
            .spawn(move || run(pipeline, chunks, shutdown_rx, publisher));

        let thread_handle = match thread_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("failed to spawn analysis thread: {}", e);
                None
            }
        };
        Self {
            shutdown_tx,
            thread_handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the thread to stop and returns the pipeline, now Idle.
    ///
    /// Returns `None` if the thread could not be spawned or panicked.
    pub fn shutdown(mut self) -> Option<AnalysisPipeline> {
        let _ = self.shutdown_tx.try_send(());
        let handle = self.thread_handle.take()?;
        match handle.join() {
            Ok(pipeline) => Some(pipeline),
            Err(_) => {
                error!("analysis thread panicked");
                None
            }
        }
    }
}

fn run(
    mut pipeline: AnalysisPipeline,
    chunks: Receiver<AudioChunk>,
    shutdown_rx: Receiver<()>,
    publisher: ResultPublisher,
) -> AnalysisPipeline {
    info!("analysis thread started");
    loop {
        crossbeam_channel::select! {
            recv(chunks) -> msg => match msg {
                Ok(chunk) => {
                    let result = match pipeline.on_chunk(&chunk.samples, chunk.sample_rate) {
                        Ok(result) => result,
                        Err(e) => {
                            warn!("skipping audio chunk: {}", e);
                            continue;
                        }
                    };
                    match publisher.publish(result) {
                        Ok(Delivery::Delivered) => {}
                        Ok(Delivery::ReplacedStale) => trace!("consumer lagging, replaced stale result"),
                        Err(e) => {
                            debug!("{}", e);
                            break;
                        }
                    }
                }
                Err(_) => {
                    debug!("audio channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                debug!("received shutdown signal");
                break;
            },
        }
    }

    pipeline.stop_stream();
    info!("analysis thread finished");
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::handoff::result_channel;
    use std::time::Duration;

    fn config() -> PipelineConfig {
        PipelineConfig {
            sample_rate: 8000,
            chunk_size: 32,
            window_multiplier: 4,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn processes_chunks_in_arrival_order() {
        let pipeline = AnalysisPipeline::new(config()).unwrap();
        let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded();
        let (publisher, subscriber) = result_channel(16);
        let worker = AnalysisWorker::spawn(pipeline, chunk_rx, publisher);

        for _ in 0..5 {
            chunk_tx
                .send(AudioChunk {
                    samples: vec![0; 32],
                    sample_rate: 8000,
                })
                .unwrap();
        }
        let sequences: Vec<u64> = (0..5)
            .map(|_| {
                subscriber
                    .recv_timeout(Duration::from_secs(5))
                    .unwrap()
                    .sequence
            })
            .collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);

        let pipeline = worker.shutdown().unwrap();
        assert_eq!(pipeline.state(), crate::StreamState::Idle);
    }

    #[test]
    fn invalid_chunks_are_skipped() {
        let pipeline = AnalysisPipeline::new(config()).unwrap();
        let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded();
        let (publisher, subscriber) = result_channel(4);
        let worker = AnalysisWorker::spawn(pipeline, chunk_rx, publisher);

        chunk_tx
            .send(AudioChunk {
                samples: vec![0; 1000],
                sample_rate: 8000,
            })
            .unwrap();
        chunk_tx
            .send(AudioChunk {
                samples: vec![0; 32],
                sample_rate: 8000,
            })
            .unwrap();

        let result = subscriber.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.sequence, 0);
        worker.shutdown().unwrap();
    }

    #[test]
    fn stops_when_the_audio_channel_closes() {
        let pipeline = AnalysisPipeline::new(config()).unwrap();
        let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded::<AudioChunk>();
        let (publisher, _subscriber) = result_channel(4);
        let worker = AnalysisWorker::spawn(pipeline, chunk_rx, publisher);
        drop(chunk_tx);
        assert!(worker.shutdown().is_some());
    }
}
