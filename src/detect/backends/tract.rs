#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;

const DEFAULT_NMS_IOU: f32 = 0.45;

/// Tract-based backend for YOLO-family ONNX detectors.
///
/// Expects a single output shaped `[1, 4 + classes, anchors]` where the first
/// four rows are `cx, cy, w, h` in model input pixels and the remaining rows
/// are per-class scores. Frames are stretched to the square model input; boxes
/// are scaled back to frame pixels.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
    confidence_threshold: f32,
    nms_iou: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            confidence_threshold: 0.25,
            nms_iou: DEFAULT_NMS_IOU,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let side = self.input_size;
        let resized = imageops::resize(frame.image(), side, side, FilterType::Triangle);
        let side = side as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0
        });
        input.into_tensor()
    }

    fn decode(&self, outputs: TVec<TValue>, frame: &Frame) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output is not [1, 4 + classes, anchors]")?;
        let rows = view.shape()[1];
        let anchors = view.shape()[2];
        if rows <= 4 {
            return Err(anyhow!("model output has {} rows, expected > 4", rows));
        }

        let sx = frame.width() as f32 / self.input_size as f32;
        let sy = frame.height() as f32 / self.input_size as f32;
        let mut candidates = Vec::new();
        for a in 0..anchors {
            let (class_id, score) = (4..rows)
                .map(|r| (r - 4, view[[0, r, a]]))
                .fold((0, f32::NEG_INFINITY), |best, cur| {
                    if cur.1 > best.1 {
                        cur
                    } else {
                        best
                    }
                });
            if score < self.confidence_threshold {
                continue;
            }
            let (cx, cy) = (view[[0, 0, a]], view[[0, 1, a]]);
            let (w, h) = (view[[0, 2, a]], view[[0, 3, a]]);
            candidates.push(Detection::new(
                BoundingBox::new(
                    (cx - w / 2.0) * sx,
                    (cy - h / 2.0) * sy,
                    (cx + w / 2.0) * sx,
                    (cy + h / 2.0) * sy,
                ),
                score,
                class_id as u32,
            ));
        }
        Ok(non_max_suppression(candidates, self.nms_iou))
    }
}

/// Greedy class-wise non-maximum suppression, highest confidence first.
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::new();
    for cand in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && k.bbox.iou(&cand.bbox) > iou);
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nms_keeps_best_overlapping_box_per_class() {
        let a = Detection::centered_at(50, 50, 10, 0.9, 2);
        let b = Detection::centered_at(51, 51, 10, 0.6, 2);
        let other_class = Detection::centered_at(51, 51, 10, 0.5, 7);
        let kept = non_max_suppression(vec![b, a.clone(), other_class.clone()], 0.45);
        assert_eq!(kept, vec![a, other_class]);
    }
}
