use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::detect::{BackendRegistry, ReplayBackend, StubBackend, VehicleClasses, COCO_CAR};
use crate::ingest::SourceConfig;

const DEFAULT_SPACES_PATH: &str = "parking_spaces1.json";
const DEFAULT_SOURCE_URL: &str = "stub://lot";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_QUEUE_DEPTH: usize = 1;

#[derive(Debug, Deserialize, Default)]
struct ParkwatchConfigFile {
    spaces_path: Option<PathBuf>,
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    vehicle_classes: Option<Vec<u32>>,
    queue_depth: Option<usize>,
    output: Option<OutputConfigFile>,
    overlay: Option<OverlayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    replay_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    dir: Option<PathBuf>,
    every_n_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Stub,
    Replay,
    Tract,
}

impl FromStr for DetectorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(DetectorKind::Stub),
            "replay" => Ok(DetectorKind::Replay),
            "tract" => Ok(DetectorKind::Tract),
            other => Err(anyhow!(
                "unknown detector backend '{}' (expected stub, replay or tract)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: DetectorKind,
    pub replay_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub dir: Option<PathBuf>,
    pub every_n_frames: u64,
}

#[derive(Debug, Clone)]
pub struct ParkwatchConfig {
    pub spaces_path: PathBuf,
    pub source: SourceConfig,
    pub detector: DetectorSettings,
    pub vehicle_classes: Vec<u32>,
    pub queue_depth: usize,
    pub output: OutputSettings,
    /// Overlay text font; a system font is looked up when unset.
    pub font_path: Option<PathBuf>,
}

impl ParkwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PARKWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ParkwatchConfigFile) -> Result<Self> {
        let spaces_path = file
            .spaces_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SPACES_PATH));
        let source_file = file.source.unwrap_or_default();
        let source = SourceConfig {
            url: source_file
                .url
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            frame_limit: source_file.frames.unwrap_or(0),
        };
        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: match detector_file.backend.as_deref() {
                Some(name) => name.parse()?,
                None => DetectorKind::Stub,
            },
            replay_path: detector_file.replay_path,
            model_path: detector_file.model_path,
            input_size: detector_file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            confidence_threshold: detector_file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE),
        };
        let output = file
            .output
            .map(|o| OutputSettings {
                dir: o.dir,
                every_n_frames: o.every_n_frames.unwrap_or(1),
            })
            .unwrap_or(OutputSettings {
                dir: None,
                every_n_frames: 1,
            });
        Ok(Self {
            spaces_path,
            source,
            detector,
            vehicle_classes: file.vehicle_classes.unwrap_or_else(|| vec![COCO_CAR]),
            queue_depth: file.queue_depth.unwrap_or(DEFAULT_QUEUE_DEPTH),
            output,
            font_path: file.overlay.and_then(|o| o.font_path),
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("PARKWATCH_SPACES") {
            if !path.trim().is_empty() {
                self.spaces_path = PathBuf::from(path);
            }
        }
        if let Ok(url) = std::env::var("PARKWATCH_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(fps) = std::env::var("PARKWATCH_TARGET_FPS") {
            self.source.target_fps = fps
                .trim()
                .parse()
                .map_err(|_| anyhow!("PARKWATCH_TARGET_FPS must be a non-negative integer"))?;
        }
        if let Ok(backend) = std::env::var("PARKWATCH_DETECTOR") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.parse()?;
            }
        }
        if let Ok(path) = std::env::var("PARKWATCH_REPLAY_PATH") {
            if !path.trim().is_empty() {
                self.detector.replay_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("PARKWATCH_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(classes) = std::env::var("PARKWATCH_VEHICLE_CLASSES") {
            let parsed = split_csv(&classes)
                .iter()
                .map(|c| {
                    c.parse::<u32>().map_err(|_| {
                        anyhow!("PARKWATCH_VEHICLE_CLASSES must be comma-separated class ids")
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            if !parsed.is_empty() {
                self.vehicle_classes = parsed;
            }
        }
        if let Ok(dir) = std::env::var("PARKWATCH_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output.dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(path) = std::env::var("PARKWATCH_FONT") {
            if !path.trim().is_empty() {
                self.font_path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.vehicle_classes.sort_unstable();
        self.vehicle_classes.dedup();
        if self.vehicle_classes.is_empty() {
            return Err(anyhow!("vehicle_classes must name at least one class"));
        }
        if self.queue_depth == 0 {
            return Err(anyhow!("queue_depth must be at least 1"));
        }
        if self.output.every_n_frames == 0 {
            return Err(anyhow!("output.every_n_frames must be at least 1"));
        }
        let threshold = self.detector.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "detector.confidence_threshold must be within 0..=1, got {}",
                threshold
            ));
        }
        match self.detector.backend {
            DetectorKind::Replay if self.detector.replay_path.is_none() => {
                return Err(anyhow!("replay detector requires detector.replay_path"));
            }
            DetectorKind::Tract if self.detector.model_path.is_none() => {
                return Err(anyhow!("tract detector requires detector.model_path"));
            }
            _ => {}
        }
        Ok(())
    }

    pub fn vehicle_classes(&self) -> Result<VehicleClasses> {
        VehicleClasses::new(self.vehicle_classes.iter().copied())
    }
}

impl DetectorSettings {
    /// Registry holding the configured backend as its default.
    pub fn build_registry(&self) -> Result<BackendRegistry> {
        let mut registry = BackendRegistry::new();
        match self.backend {
            DetectorKind::Stub => registry.register(StubBackend::new()),
            DetectorKind::Replay => {
                let path = self
                    .replay_path
                    .as_ref()
                    .ok_or_else(|| anyhow!("replay detector requires a replay path"))?;
                registry.register(ReplayBackend::open(path)?);
            }
            DetectorKind::Tract => self.register_tract(&mut registry)?,
        }
        registry.warm_up_all()?;
        log::info!("detector backends ready: {}", registry.list().join(", "));
        Ok(registry)
    }

    #[cfg(feature = "backend-tract")]
    fn register_tract(&self, registry: &mut BackendRegistry) -> Result<()> {
        let path = self
            .model_path
            .as_ref()
            .ok_or_else(|| anyhow!("tract detector requires a model path"))?;
        let backend = crate::detect::TractBackend::new(path, self.input_size)?
            .with_threshold(self.confidence_threshold);
        registry.register(backend);
        Ok(())
    }

    #[cfg(not(feature = "backend-tract"))]
    fn register_tract(&self, _registry: &mut BackendRegistry) -> Result<()> {
        Err(anyhow!(
            "tract detector requested but parkwatch was built without the backend-tract feature"
        ))
    }
}

fn read_config_file(path: &Path) -> Result<ParkwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
