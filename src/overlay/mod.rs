//! Visual overlay for a processed frame.
//!
//! Vehicles get a box and a "Label: 0.87" caption above the top-left corner.
//! Each space gets a translucent fill keyed to occupancy, a solid border and
//! its 1-based spot number near the third vertex. Callers draw detections first,
//! then spaces in index order; later fills blend over earlier borders.
//!
//! Text needs a TrueType/OpenType font. Without one, shapes are still drawn
//! and captions and numbers are left out.

pub mod draw;

use std::fmt;
use std::path::Path;

use ab_glyph::FontArc;
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};

use crate::detect::{Detection, VehicleClasses};
use crate::geometry::Point;
use crate::space::{spot_number, Polygon};

/// Caption sits this many pixels above the box.
const DETECTION_LABEL_LIFT: i32 = 10;

/// Tried in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    FontArc::try_from_vec(bytes).map_err(|e| anyhow!("invalid font {}: {}", path.display(), e))
}

pub fn find_system_font() -> Option<FontArc> {
    SYSTEM_FONTS
        .iter()
        .map(Path::new)
        .filter(|p| p.is_file())
        .find_map(|p| load_font(p).ok())
}

/// The configured font, else the first system font found. A configured
/// font that cannot be loaded is an error; a missing system font is not.
pub fn resolve_font(configured: Option<&Path>) -> Result<Option<FontArc>> {
    if let Some(path) = configured {
        return Ok(Some(load_font(path)?));
    }
    let font = find_system_font();
    if font.is_none() {
        log::warn!("no overlay font found, spot numbers and captions will not be drawn");
    }
    Ok(font)
}

#[derive(Clone)]
pub struct OverlayStyle {
    pub occupied: Rgb<u8>,
    pub free: Rgb<u8>,
    pub detection: Rgb<u8>,
    pub label: Rgb<u8>,
    /// Weight of the fill color; the frame keeps `1 - fill_alpha`.
    pub fill_alpha: f32,
    pub border_thickness: i32,
    pub box_thickness: i32,
    /// Text height in pixels.
    pub text_px: f32,
    pub font: Option<FontArc>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            occupied: Rgb([255, 0, 0]),
            free: Rgb([0, 255, 0]),
            detection: Rgb([0, 255, 0]),
            label: Rgb([255, 255, 255]),
            fill_alpha: 0.3,
            border_thickness: 2,
            box_thickness: 2,
            text_px: 18.0,
            font: None,
        }
    }
}

impl fmt::Debug for OverlayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayStyle")
            .field("occupied", &self.occupied)
            .field("free", &self.free)
            .field("fill_alpha", &self.fill_alpha)
            .field("text_px", &self.text_px)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl OverlayStyle {
    pub fn with_font(mut self, font: Option<FontArc>) -> Self {
        self.font = font;
        self
    }

    pub fn space_color(&self, occupied: bool) -> Rgb<u8> {
        if occupied {
            self.occupied
        } else {
            self.free
        }
    }

    /// Box and caption for one vehicle detection. Malformed boxes draw nothing.
    pub fn draw_detection(&self, img: &mut RgbImage, det: &Detection) {
        let Some((top_left, bottom_right)) = det.bbox.pixel_corners() else {
            return;
        };
        draw::draw_rect(img, top_left, bottom_right, self.box_thickness, self.detection);
        if let Some(font) = &self.font {
            let caption = format!("{}: {:.2}", VehicleClasses::label(det.class_id), det.confidence);
            draw::draw_text(
                img,
                font,
                top_left.offset(0, -DETECTION_LABEL_LIFT),
                &caption,
                self.text_px,
                self.detection,
            );
        }
    }

    /// Fill, border and number for the space at `index`.
    pub fn draw_space(&self, img: &mut RgbImage, index: usize, polygon: &Polygon, occupied: bool) {
        let color = self.space_color(occupied);
        draw::blend_polygon(img, polygon.vertices(), color, self.fill_alpha);
        draw::draw_closed_polyline(img, polygon.vertices(), self.border_thickness, color);
        if let (Some(font), Some(anchor)) = (&self.font, polygon.label_anchor()) {
            draw::draw_text(
                img,
                font,
                anchor,
                &spot_number(index).to_string(),
                self.text_px,
                self.label,
            );
        }
    }
}

/// Pixel at `p`, if inside the image.
pub fn pixel_at(img: &RgbImage, p: Point) -> Option<Rgb<u8>> {
    if p.x < 0 || p.y < 0 {
        return None;
    }
    img.get_pixel_checked(p.x as u32, p.y as u32).copied()
}
