//! Video frames.
//!
//! A `Frame` is one decoded RGB raster plus the sequence number its source
//! assigned. Annotation never touches the frame a detector saw: the resolver
//! draws on a copy, so the sequence number ties a rendered overlay back to the
//! exact pixels and detections it was computed from.

use image::{Rgb, RgbImage};

#[derive(Clone, Debug)]
pub struct Frame {
    sequence: u64,
    image: RgbImage,
}

impl Frame {
    pub fn new(sequence: u64, image: RgbImage) -> Self {
        Self { sequence, image }
    }

    /// A frame filled with a single color.
    pub fn solid(sequence: u64, width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::new(sequence, RgbImage::from_pixel(width, height, Rgb(color)))
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Interleaved RGB bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }
}
