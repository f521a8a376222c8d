//! Two-stage frame pipeline.
//!
//! A producer thread pulls frames from the source (which paces itself) and
//! hands them over a bounded channel. The calling thread detects, resolves and
//! publishes each frame in arrival order, so a rendered overlay always belongs
//! to the occupancy computed from the same frame. The loop ends at end of
//! stream, on an unreadable frame, or when the stop flag is raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::ingest::FrameSource;
use crate::render::SnapshotSink;
use crate::session::SessionController;

/// How often the consumer re-checks the stop flag while idle.
const STOP_POLL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineExit {
    EndOfStream,
    /// The source failed to deliver a frame.
    FrameUnavailable,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub frames_failed: u64,
    pub exit: PipelineExit,
}

/// Shared flag raised to stop a running pipeline.
pub fn stop_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

pub struct Pipeline {
    queue_depth: usize,
}

impl Pipeline {
    pub fn new(queue_depth: usize) -> Result<Self> {
        if queue_depth == 0 {
            return Err(anyhow!("queue depth must be >= 1"));
        }
        Ok(Self { queue_depth })
    }

    pub fn run(
        &self,
        mut source: Box<dyn FrameSource>,
        controller: &SessionController,
        sinks: &mut [Box<dyn SnapshotSink>],
        stop: Arc<AtomicBool>,
    ) -> Result<PipelineStats> {
        source.connect()?;
        let (tx, rx) = mpsc::sync_channel(self.queue_depth);
        let producer_stop = stop.clone();
        let producer = thread::Builder::new()
            .name("frame-producer".to_string())
            .spawn(move || -> PipelineExit {
                loop {
                    if producer_stop.load(Ordering::SeqCst) {
                        return PipelineExit::Stopped;
                    }
                    match source.next_frame() {
                        Ok(Some(frame)) => {
                            if tx.send(frame).is_err() {
                                return PipelineExit::Stopped;
                            }
                        }
                        Ok(None) => {
                            let stats = source.stats();
                            log::info!(
                                "end of stream after {} frames from {}",
                                stats.frames_captured,
                                stats.url
                            );
                            return PipelineExit::EndOfStream;
                        }
                        Err(e) => {
                            log::warn!("frame unavailable, stopping: {:#}", e);
                            return PipelineExit::FrameUnavailable;
                        }
                    }
                }
            })?;

        let mut frames_processed = 0u64;
        let mut frames_failed = 0u64;
        let mut stopped = false;
        loop {
            if stop.load(Ordering::SeqCst) {
                stopped = true;
                break;
            }
            let frame = match rx.recv_timeout(STOP_POLL) {
                Ok(frame) => frame,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            match controller.process_frame(&frame) {
                Ok(snapshot) => {
                    frames_processed += 1;
                    for sink in sinks.iter_mut() {
                        if let Err(e) = sink.publish(&snapshot) {
                            log::warn!("snapshot publish failed: {:#}", e);
                        }
                    }
                }
                Err(e) => {
                    frames_failed += 1;
                    log::error!("frame {} failed: {:#}", frame.sequence(), e);
                }
            }
        }
        drop(rx);

        let producer_exit = producer
            .join()
            .map_err(|_| anyhow!("frame producer thread panicked"))?;
        let exit = if stopped {
            PipelineExit::Stopped
        } else {
            producer_exit
        };
        Ok(PipelineStats {
            frames_processed,
            frames_failed,
            exit,
        })
    }
}
