//! Frame sources.
//!
//! This module provides the sources the monitoring loop pulls frames from:
//! - Synthetic frames (`stub://` URLs) for tests and dry runs
//! - Image sequences: a local directory of PNG/JPEG frames
//!
//! Resolving stream URLs and driving capture devices stays outside this
//! crate; anything with a network scheme is refused.
//!
//! Sources are responsible for:
//! - Numbering frames in capture order
//! - Rate limiting to the configured frame rate
//! - Reporting end of stream as `Ok(None)`

pub mod file;
pub mod synthetic;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub use file::ImageSequenceSource;
pub use synthetic::SyntheticSource;

/// Where frames come from and how fast.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// `stub://name` or a local directory path.
    pub url: String,
    /// Frames per second to produce; 0 disables pacing.
    pub target_fps: u32,
    /// Frame size for synthetic sources.
    pub width: u32,
    pub height: u32,
    /// Stop after this many frames; 0 means unbounded (synthetic only).
    pub frame_limit: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "stub://lot".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
            frame_limit: 0,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// A sequence of frames.
pub trait FrameSource: Send {
    /// Prepare the source. Called once before the first frame.
    fn connect(&mut self) -> Result<()>;

    /// The next frame, `Ok(None)` at end of stream. An `Err` means the
    /// frame could not be read; callers treat it as the end of the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn stats(&self) -> SourceStats;
}

/// Build the source named by `config.url`.
pub fn open_source(config: SourceConfig) -> Result<Box<dyn FrameSource>> {
    if config.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(config)));
    }
    if config.url.contains("://") {
        return Err(anyhow!(
            "unsupported frame source {}: only stub:// and local directories are accepted",
            config.url
        ));
    }
    Ok(Box::new(ImageSequenceSource::new(config)?))
}

/// Sleeps just enough to hold a target frame rate.
#[derive(Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl FramePacer {
    pub fn new(target_fps: u32) -> Self {
        let interval = (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / target_fps as f64));
        Self {
            interval,
            next_due: None,
        }
    }

    /// Block until the next frame is due.
    pub fn wait(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        let now = Instant::now();
        let due = match self.next_due {
            Some(due) if due > now => {
                thread::sleep(due - now);
                due
            }
            _ => now,
        };
        self.next_due = Some(due + interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_urls_are_refused() {
        let config = SourceConfig {
            url: "rtsp://camera/stream".to_string(),
            ..SourceConfig::default()
        };
        assert!(open_source(config).is_err());
    }

    #[test]
    fn stub_urls_open_synthetic_source() {
        let config = SourceConfig {
            url: "stub://test".to_string(),
            frame_limit: 1,
            ..SourceConfig::default()
        };
        let mut source = open_source(config).unwrap();
        source.connect().unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn pacer_without_rate_never_blocks() {
        let mut pacer = FramePacer::new(0);
        let start = Instant::now();
        for _ in 0..100 {
            pacer.wait();
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn pacer_spaces_frames_out() {
        let mut pacer = FramePacer::new(50);
        let start = Instant::now();
        for _ in 0..3 {
            pacer.wait();
        }
        // first frame is immediate, the next two wait 20ms each
        assert!(start.elapsed() >= Duration::from_millis(35));
    }
}
