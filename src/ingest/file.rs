//! Local image-sequence source.
//!
//! Reads a directory of still frames (`.png`, `.jpg`, `.jpeg`) in file-name
//! order, one frame per file. The directory listing is taken once at connect
//! time. A file that fails to decode ends the stream.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use super::{FramePacer, FrameSource, SourceConfig, SourceStats};
use crate::frame::Frame;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

pub struct ImageSequenceSource {
    config: SourceConfig,
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    pacer: FramePacer,
    frame_count: u64,
}

impl ImageSequenceSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        if !is_local_file_path(&config.url) {
            return Err(anyhow!(
                "image sequence source only supports local paths (no URL schemes)"
            ));
        }
        let dir = PathBuf::from(&config.url);
        let pacer = FramePacer::new(config.target_fps);
        Ok(Self {
            config,
            dir,
            files: Vec::new(),
            cursor: 0,
            pacer,
            frame_count: 0,
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len().saturating_sub(self.cursor)
    }
}

impl FrameSource for ImageSequenceSource {
    fn connect(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to open frame directory {}", self.dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_frame = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        log::info!(
            "ImageSequenceSource: {} frames in {}",
            files.len(),
            self.dir.display()
        );
        self.files = files;
        self.cursor = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.cursor).cloned() else {
            return Ok(None);
        };
        if self.config.frame_limit > 0 && self.frame_count >= self.config.frame_limit {
            return Ok(None);
        }
        self.cursor += 1;
        self.pacer.wait();
        let image = image::open(&path)
            .with_context(|| format!("failed to decode frame {}", path.display()))?
            .to_rgb8();
        self.frame_count += 1;
        Ok(Some(Frame::new(self.frame_count, image)))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}

fn is_local_file_path(path: &str) -> bool {
    !path.trim().is_empty() && !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn config_for(dir: &std::path::Path) -> SourceConfig {
        SourceConfig {
            url: dir.display().to_string(),
            target_fps: 0,
            ..SourceConfig::default()
        }
    }

    #[test]
    fn reads_frames_in_name_order_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([200, 0, 0]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbImage::from_pixel(4, 4, Rgb([0, 200, 0]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::new(config_for(dir.path())).unwrap();
        source.connect().unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.sequence(), 1);
        assert_eq!(first.image().get_pixel(0, 0).0, [0, 200, 0]);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.image().get_pixel(0, 0).0, [200, 0, 0]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn undecodable_frame_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"garbage").unwrap();
        let mut source = ImageSequenceSource::new(config_for(dir.path())).unwrap();
        source.connect().unwrap();
        assert!(source.next_frame().is_err());
    }

    #[test]
    fn missing_directory_fails_to_connect() {
        let mut source = ImageSequenceSource::new(SourceConfig {
            url: "/nonexistent/parkwatch/frames".to_string(),
            ..SourceConfig::default()
        })
        .unwrap();
        assert!(source.connect().is_err());
    }
}
