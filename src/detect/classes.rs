use std::collections::BTreeSet;

use anyhow::{anyhow, Result};

/// COCO class id for "car", the default vehicle class.
pub const COCO_CAR: u32 = 2;

const COCO_VEHICLE_LABELS: &[(u32, &str)] = &[
    (1, "Bike"),
    (2, "Car"),
    (3, "Moto"),
    (5, "Bus"),
    (7, "Truck"),
];

/// Detector class ids that count as a parked vehicle.
///
/// This is an agreement with whatever detector is plugged in, so it lives in
/// configuration rather than code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleClasses {
    accepted: BTreeSet<u32>,
}

impl VehicleClasses {
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Result<Self> {
        let accepted: BTreeSet<u32> = ids.into_iter().collect();
        if accepted.is_empty() {
            return Err(anyhow!("at least one vehicle class id is required"));
        }
        Ok(Self { accepted })
    }

    pub fn accepts(&self, class_id: Option<u32>) -> bool {
        class_id.is_some_and(|id| self.accepted.contains(&id))
    }

    /// Short label drawn next to a detection box.
    pub fn label(class_id: Option<u32>) -> &'static str {
        class_id
            .and_then(|id| {
                COCO_VEHICLE_LABELS
                    .iter()
                    .find(|(known, _)| *known == id)
                    .map(|(_, name)| *name)
            })
            .unwrap_or("Vehicle")
    }
}

impl Default for VehicleClasses {
    fn default() -> Self {
        Self {
            accepted: BTreeSet::from([COCO_CAR]),
        }
    }
}
