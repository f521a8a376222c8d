use std::path::Path;

use anyhow::{Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Replays detections recorded by an external detector.
///
/// The file is JSON lines: line N holds the detections for the N-th frame
/// processed, as a JSON array. Entries that do not parse as a detection are
/// dropped one by one; the rest of the line still counts. Frames past the end
/// of the recording get no detections.
pub struct ReplayBackend {
    frames: Vec<Vec<Detection>>,
    cursor: usize,
}

impl ReplayBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read detection replay {}", path.display()))?;
        let backend = Self::from_lines(&raw);
        log::info!(
            "ReplayBackend: loaded {} frames of detections from {}",
            backend.frames.len(),
            path.display()
        );
        Ok(backend)
    }

    pub fn from_lines(raw: &str) -> Self {
        let frames = raw.lines().map(parse_detections).collect();
        Self { frames, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        let Some(hits) = self.frames.get(self.cursor) else {
            return Ok(Vec::new());
        };
        self.cursor += 1;
        Ok(hits.clone())
    }
}

/// Parse one JSON array of detections, skipping malformed entries.
pub fn parse_detections(json: &str) -> Vec<Detection> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let values: Vec<serde_json::Value> = match serde_json::from_str(trimmed) {
        Ok(values) => values,
        Err(e) => {
            log::warn!("detection record is not a JSON array, ignoring: {}", e);
            return Vec::new();
        }
    };
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Detection>(value) {
            Ok(det) => Some(det),
            Err(e) => {
                log::debug!("skipping malformed detection: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = r#"[{"bbox":{"x1":0,"y1":0,"x2":10,"y2":10},"confidence":0.9,"class_id":2}]

[{"bbox":{"x1":0,"y1":0},"confidence":0.4,"class_id":2},{"bbox":{"x1":1,"y1":1,"x2":3,"y2":3},"confidence":0.7,"class_id":7}]
not json"#;

    #[test]
    fn replays_frames_in_order_then_runs_dry() {
        let mut backend = ReplayBackend::from_lines(RECORDING);
        let frame = Frame::solid(0, 4, 4, [0, 0, 0]);
        assert_eq!(backend.remaining(), 4);

        assert_eq!(backend.detect(&frame).unwrap().len(), 1);
        assert!(backend.detect(&frame).unwrap().is_empty());

        let third = backend.detect(&frame).unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].class_id, Some(7));

        assert!(backend.detect(&frame).unwrap().is_empty());
        assert!(backend.detect(&frame).unwrap().is_empty());
        assert_eq!(backend.remaining(), 0);
    }
}
