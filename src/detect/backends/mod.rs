pub mod replay;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use replay::{parse_detections, ReplayBackend};
pub use stub::StubBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
