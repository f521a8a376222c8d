//! Shape and text drawing on `RgbImage`, on top of `imageproc`.
//!
//! imageproc steps through every pixel of a segment and bounds-checks each
//! one, so geometry is clipped to a small window around the image before it
//! is handed over. A box corner a billion pixels away costs the same as one
//! on screen.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut, draw_text_mut};
use imageproc::point::Point as PixelPoint;

use crate::geometry::Point;

/// Axis-aligned clip window in pixel coordinates, inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Window {
    /// The image area grown by `margin` pixels on every side.
    pub fn around(img: &RgbImage, margin: f64) -> Self {
        Self {
            x0: -margin,
            y0: -margin,
            x1: img.width() as f64 - 1.0 + margin,
            y1: img.height() as f64 - 1.0 + margin,
        }
    }
}

/// Liang-Barsky: the part of `a -> b` inside `win`, if any.
pub fn clip_segment(a: (f64, f64), b: (f64, f64), win: Window) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, a.0 - win.x0),
        (dx, win.x1 - a.0),
        (-dy, a.1 - win.y0),
        (dy, win.y1 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Sutherland-Hodgman: the polygon cut down to `win`.
pub fn clip_polygon(vertices: &[Point], win: Window) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = vertices.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    // (axis, bound, keep values >= bound)
    for (axis, bound, keep_above) in [
        (0, win.x0, true),
        (0, win.x1, false),
        (1, win.y0, true),
        (1, win.y1, false),
    ] {
        let input = std::mem::take(&mut out);
        let Some(&last) = input.last() else {
            break;
        };
        let coord = |p: (f64, f64)| if axis == 0 { p.0 } else { p.1 };
        let inside = |p: (f64, f64)| {
            if keep_above {
                coord(p) >= bound
            } else {
                coord(p) <= bound
            }
        };
        let crossing = |a: (f64, f64), b: (f64, f64)| {
            let t = (bound - coord(a)) / (coord(b) - coord(a));
            (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1))
        };
        let mut prev = last;
        for &cur in &input {
            match (inside(prev), inside(cur)) {
                (true, true) => out.push(cur),
                (true, false) => out.push(crossing(prev, cur)),
                (false, true) => {
                    out.push(crossing(prev, cur));
                    out.push(cur);
                }
                (false, false) => {}
            }
            prev = cur;
        }
    }
    out
}

/// Line with a `thickness`-wide square brush.
pub fn draw_line(img: &mut RgbImage, a: Point, b: Point, thickness: i32, color: Rgb<u8>) {
    let t = thickness.max(1);
    let win = Window::around(img, t as f64 + 1.0);
    let Some((ca, cb)) = clip_segment((a.x as f64, a.y as f64), (b.x as f64, b.y as f64), win) else {
        return;
    };
    let lo = -(t - 1) / 2;
    for oy in lo..lo + t {
        for ox in lo..lo + t {
            draw_line_segment_mut(
                img,
                ((ca.0 + ox as f64) as f32, (ca.1 + oy as f64) as f32),
                ((cb.0 + ox as f64) as f32, (cb.1 + oy as f64) as f32),
                color,
            );
        }
    }
}

/// Closed outline through `vertices`.
pub fn draw_closed_polyline(img: &mut RgbImage, vertices: &[Point], thickness: i32, color: Rgb<u8>) {
    match vertices {
        [] => {}
        [only] => draw_line(img, *only, *only, thickness, color),
        _ => {
            let mut prev = vertices[vertices.len() - 1];
            for &v in vertices {
                draw_line(img, prev, v, thickness, color);
                prev = v;
            }
        }
    }
}

pub fn draw_rect(img: &mut RgbImage, top_left: Point, bottom_right: Point, thickness: i32, color: Rgb<u8>) {
    let corners = [
        top_left,
        Point::new(bottom_right.x, top_left.y),
        bottom_right,
        Point::new(top_left.x, bottom_right.y),
    ];
    draw_closed_polyline(img, &corners, thickness, color);
}

/// Fill the polygon with `color` on a copy of the covered region and mix it
/// back: `out = alpha * fill + (1 - alpha) * pixel`, rounded. Pixels outside
/// the polygon come back unchanged.
pub fn blend_polygon(img: &mut RgbImage, vertices: &[Point], color: Rgb<u8>, alpha: f32) {
    if vertices.len() < 3 || img.width() == 0 || img.height() == 0 {
        return;
    }
    let clipped = clip_polygon(vertices, Window::around(img, 0.0));
    let mut poly: Vec<PixelPoint<i32>> = Vec::with_capacity(clipped.len());
    for (x, y) in clipped {
        let p = PixelPoint::new(x.round() as i32, y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return;
    }

    let x0 = poly.iter().map(|p| p.x).min().unwrap_or(0).max(0) as u32;
    let y0 = poly.iter().map(|p| p.y).min().unwrap_or(0).max(0) as u32;
    let x1 = poly.iter().map(|p| p.x).max().unwrap_or(0).min(img.width() as i32 - 1) as u32;
    let y1 = poly.iter().map(|p| p.y).max().unwrap_or(0).min(img.height() as i32 - 1) as u32;
    if x1 < x0 || y1 < y0 {
        return;
    }
    let mut layer = imageops::crop_imm(img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image();
    let local: Vec<PixelPoint<i32>> = poly
        .iter()
        .map(|p| PixelPoint::new(p.x - x0 as i32, p.y - y0 as i32))
        .collect();
    draw_polygon_mut(&mut layer, &local, color);

    let alpha = alpha.clamp(0.0, 1.0);
    for (lx, ly, fill) in layer.enumerate_pixels() {
        let px = img.get_pixel_mut(x0 + lx, y0 + ly);
        for c in 0..3 {
            let mixed = alpha * fill.0[c] as f32 + (1.0 - alpha) * px.0[c] as f32;
            px.0[c] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Draw `text` with its baseline-left corner at `origin`, `px` pixels tall.
pub fn draw_text(
    img: &mut RgbImage,
    font: &FontArc,
    origin: Point,
    text: &str,
    px: f32,
    color: Rgb<u8>,
) {
    let scale = PxScale::from(px);
    let ascent = font.as_scaled(scale).ascent().ceil() as i32;
    let top = origin.y.saturating_sub(ascent);
    if origin.x >= img.width() as i32 || top >= img.height() as i32 {
        return;
    }
    draw_text_mut(img, color, origin.x, top, scale, font, text);
}
