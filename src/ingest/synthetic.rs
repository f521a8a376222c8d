//! Synthetic frame source (`stub://` URLs).
//!
//! Produces a slowly shifting gradient so consecutive frames differ. Used by
//! tests and by `parkwatchd` dry runs together with a stub or replay detector.

use anyhow::Result;
use image::{Rgb, RgbImage};

use super::{FramePacer, FrameSource, SourceConfig, SourceStats};
use crate::frame::Frame;

pub struct SyntheticSource {
    config: SourceConfig,
    pacer: FramePacer,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        let pacer = FramePacer::new(config.target_fps);
        Self {
            config,
            pacer,
            frame_count: 0,
        }
    }

    fn generate(&self) -> RgbImage {
        let shift = self.frame_count;
        RgbImage::from_fn(self.config.width, self.config.height, |x, y| {
            let v = ((x as u64 + y as u64 + shift) % 256) as u8;
            Rgb([v / 2, v / 2, v / 2])
        })
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.config.frame_limit > 0 && self.frame_count >= self.config.frame_limit {
            return Ok(None);
        }
        self.pacer.wait();
        self.frame_count += 1;
        Ok(Some(Frame::new(self.frame_count, self.generate())))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}
