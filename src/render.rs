//! Where processed snapshots go.
//!
//! The presentation layer is external. These sinks are the two ends this
//! crate ships: a log line whenever the counts change, and a directory of
//! annotated frames plus status JSON that a dashboard can poll.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::session::{Counts, StatusSnapshot};

pub trait SnapshotSink: Send {
    fn publish(&mut self, snapshot: &StatusSnapshot) -> Result<()>;
}

/// Logs counts when they change.
#[derive(Default)]
pub struct LogSink {
    last: Option<Counts>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotSink for LogSink {
    fn publish(&mut self, snapshot: &StatusSnapshot) -> Result<()> {
        let counts = snapshot.report.counts;
        if self.last != Some(counts) {
            log::info!(
                "frame {}: total={} occupied={} available={}",
                snapshot.annotated.sequence(),
                counts.total,
                counts.occupied,
                counts.available
            );
            self.last = Some(counts);
        }
        Ok(())
    }
}

/// Writes `frame_<seq>.png`, `status_<seq>.json` and `latest.json`.
pub struct DirectorySink {
    dir: PathBuf,
    every_n_frames: u64,
}

impl DirectorySink {
    pub fn create(dir: impl Into<PathBuf>, every_n_frames: u64) -> Result<Self> {
        let dir = dir.into();
        if every_n_frames == 0 {
            return Err(anyhow!("every_n_frames must be >= 1"));
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self { dir, every_n_frames })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotSink for DirectorySink {
    fn publish(&mut self, snapshot: &StatusSnapshot) -> Result<()> {
        let seq = snapshot.annotated.sequence();
        if seq % self.every_n_frames != 0 {
            return Ok(());
        }
        let frame_path = self.dir.join(format!("frame_{seq:06}.png"));
        snapshot
            .annotated
            .image()
            .save(&frame_path)
            .with_context(|| format!("failed to write {}", frame_path.display()))?;

        let json = serde_json::to_string_pretty(&snapshot.report)?;
        let status_path = self.dir.join(format!("status_{seq:06}.json"));
        std::fs::write(&status_path, &json)
            .with_context(|| format!("failed to write {}", status_path.display()))?;
        let latest = self.dir.join("latest.json");
        let tmp = latest.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        // readers polling latest.json never see a partial write
        std::fs::rename(&tmp, &latest)
            .with_context(|| format!("failed to replace {}", latest.display()))?;
        Ok(())
    }
}
