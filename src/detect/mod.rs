mod backend;
pub mod backends;
mod classes;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{parse_detections, ReplayBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use classes::{VehicleClasses, COCO_CAR};
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection};
