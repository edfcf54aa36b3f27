//! Single-producer/single-consumer handoff of analysis results.
//!
//! A bounded crossbeam channel sits between the analysis thread and the
//! consumer. When the consumer falls behind, the oldest queued result is
//! evicted so the newest one always gets through.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use thiserror::Error;

use crate::AnalysisResult;

/// How a published result entered the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The queue was full and the oldest result was discarded.
    ReplacedStale,
}

/// The subscriber has been dropped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("result subscriber has been dropped")]
pub struct HandoffClosed;

/// Creates a handoff holding at most `capacity` undelivered results.
pub fn result_channel(capacity: usize) -> (ResultPublisher, ResultSubscriber) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    let closed = Arc::new(AtomicBool::new(false));
    let publisher = ResultPublisher {
        tx,
        evict: rx.clone(),
        closed: Arc::clone(&closed),
    };
    let subscriber = ResultSubscriber { rx, closed };
    (publisher, subscriber)
}

/// Producing half, owned by the analysis thread.
#[derive(Debug)]
pub struct ResultPublisher {
    tx: Sender<AnalysisResult>,
    evict: Receiver<AnalysisResult>,
    closed: Arc<AtomicBool>,
}

impl ResultPublisher {
    /// Queues `result`, evicting the oldest entry if the queue is full.
    pub fn publish(&self, mut result: AnalysisResult) -> Result<Delivery, HandoffClosed> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HandoffClosed);
        }
        let mut delivery = Delivery::Delivered;
        loop {
            match self.tx.try_send(result) {
                Ok(()) => return Ok(delivery),
                Err(TrySendError::Full(rejected)) => {
                    if self.evict.try_recv().is_ok() {
                        delivery = Delivery::ReplacedStale;
                    }
                    result = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return Err(HandoffClosed),
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Consuming half, owned by the presentation side.
#[derive(Debug)]
pub struct ResultSubscriber {
    rx: Receiver<AnalysisResult>,
    closed: Arc<AtomicBool>,
}

impl ResultSubscriber {
    /// Blocks until the next result; `None` once the publisher is gone.
    pub fn recv(&self) -> Option<AnalysisResult> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Result<AnalysisResult, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<AnalysisResult, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Drains the queue and returns only the newest result.
    pub fn latest(&self) -> Option<AnalysisResult> {
        self.rx.try_iter().last()
    }

    /// Underlying receiver, for use with `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<AnalysisResult> {
        &self.rx
    }
}

impl Drop for ResultSubscriber {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}
