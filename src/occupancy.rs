//! Per-frame occupancy resolution.
//!
//! A space is occupied when the center of at least one vehicle box lies in
//! its polygon. Nothing carries over between frames: every call starts from an
//! empty set.

use std::collections::BTreeSet;

use crate::detect::{Detection, VehicleClasses};
use crate::frame::Frame;
use crate::overlay::OverlayStyle;
use crate::space::{ParkingSpace, SpaceId};

/// Spaces holding a vehicle in one frame, keyed by stable id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancySet {
    occupied: BTreeSet<SpaceId>,
}

impl OccupancySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SpaceId) -> bool {
        self.occupied.insert(id)
    }

    pub fn contains(&self, id: SpaceId) -> bool {
        self.occupied.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SpaceId> + '_ {
        self.occupied.iter().copied()
    }

    /// Positions of the occupied spaces within `spaces`. Ids not present in
    /// `spaces` are ignored.
    pub fn indices(&self, spaces: &[ParkingSpace]) -> BTreeSet<usize> {
        spaces
            .iter()
            .enumerate()
            .filter(|(_, s)| self.contains(s.id))
            .map(|(i, _)| i)
            .collect()
    }
}

impl FromIterator<SpaceId> for OccupancySet {
    fn from_iter<T: IntoIterator<Item = SpaceId>>(iter: T) -> Self {
        Self {
            occupied: iter.into_iter().collect(),
        }
    }
}

/// Output of resolving one frame.
#[derive(Clone, Debug)]
pub struct Resolution {
    /// Copy of the input frame with the overlay drawn on it.
    pub annotated: Frame,
    pub occupied: OccupancySet,
    /// Vehicle detections that took part (well-formed and class accepted).
    pub vehicles: usize,
}

#[derive(Clone, Debug, Default)]
pub struct OccupancyResolver {
    vehicles: VehicleClasses,
    style: OverlayStyle,
}

impl OccupancyResolver {
    pub fn new(vehicles: VehicleClasses) -> Self {
        Self {
            vehicles,
            style: OverlayStyle::default(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn vehicle_classes(&self) -> &VehicleClasses {
        &self.vehicles
    }

    /// Detections that count as vehicles: accepted class, usable box.
    fn vehicle_detections<'a>(
        &'a self,
        detections: &'a [Detection],
    ) -> impl Iterator<Item = &'a Detection> + 'a {
        detections.iter().filter(move |det| {
            if !self.vehicles.accepts(det.class_id) {
                return false;
            }
            if det.bbox.center().is_none() {
                log::debug!("skipping detection with malformed box {:?}", det.bbox);
                return false;
            }
            true
        })
    }

    /// Occupancy only, no drawing.
    pub fn occupied(&self, detections: &[Detection], spaces: &[ParkingSpace]) -> OccupancySet {
        let mut occupied = OccupancySet::new();
        for det in self.vehicle_detections(detections) {
            let Some(center) = det.bbox.center() else {
                continue;
            };
            for space in spaces {
                if space.polygon.contains(center) {
                    occupied.insert(space.id);
                }
            }
        }
        occupied
    }

    /// Occupancy plus the annotated frame. `frame`, `detections` and
    /// `spaces` are left untouched.
    pub fn resolve(
        &self,
        frame: &Frame,
        detections: &[Detection],
        spaces: &[ParkingSpace],
    ) -> Resolution {
        let occupied = self.occupied(detections, spaces);
        let mut annotated = frame.clone();
        let img = annotated.image_mut();

        let mut vehicles = 0;
        for det in self.vehicle_detections(detections) {
            self.style.draw_detection(img, det);
            vehicles += 1;
        }
        for (index, space) in spaces.iter().enumerate() {
            self.style
                .draw_space(img, index, &space.polygon, occupied.contains(space.id));
        }

        Resolution {
            annotated,
            occupied,
            vehicles,
        }
    }
}
