//! Parkwatch
//!
//! Parking-lot occupancy monitoring over a video feed.
//!
//! # Architecture
//!
//! Operators outline parking spaces as polygons over the camera view. For each
//! frame, a vehicle detector proposes bounding boxes; a space is occupied when
//! the center of a vehicle box falls inside its polygon (boundary included).
//! Spaces can be reserved while free, and an occupied space always reports as
//! occupied regardless of its reservation.
//!
//! # Module Structure
//!
//! - `geometry`, `space`: points, polygons, spaces with stable ids
//! - `storage`: persisted space configuration (JSON list of polygons)
//! - `frame`, `ingest`: frames and the sources that produce them
//! - `detect`: detection records, vehicle classes, detector backends
//! - `occupancy`, `overlay`: per-frame occupancy and annotation
//! - `booking`, `session`: reservations and the shared session state
//! - `pipeline`, `render`, `control`: the monitoring loop and its edges
//! - `config`: daemon configuration

pub mod booking;
pub mod config;
pub mod control;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod occupancy;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod space;
pub mod storage;

pub use booking::{BookingState, SpotStatus, ToggleOutcome, ToggleRejection};
pub use config::{DetectorKind, DetectorSettings, OutputSettings, ParkwatchConfig};
pub use control::ControlCommand;
pub use detect::{
    BackendRegistry, BoundingBox, Detection, DetectorBackend, ReplayBackend, StubBackend,
    VehicleClasses, COCO_CAR,
};
pub use frame::Frame;
pub use geometry::{point_in_polygon, Point};
pub use ingest::{open_source, FrameSource, SourceConfig};
pub use occupancy::{OccupancyResolver, OccupancySet, Resolution};
pub use overlay::OverlayStyle;
pub use pipeline::{Pipeline, PipelineExit, PipelineStats};
pub use render::{DirectorySink, LogSink, SnapshotSink};
pub use session::{Counts, Session, SessionController, SpotReport, StatusReport, StatusSnapshot};
pub use space::{ParkingSpace, Polygon, SpaceId, SpaceLayout};
pub use storage::{JsonSpaceStore, SpaceStore};
