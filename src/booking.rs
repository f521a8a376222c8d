//! Reservations reconciled against live occupancy.
//!
//! Only the reservation flag is stored. The visible status is derived each
//! time from the flag and the occupancy set supplied by the caller, with
//! `Occupied` winning over `Reserved`. A flag stays set underneath an
//! occupied space and shows again once the vehicle leaves.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::occupancy::OccupancySet;
use crate::space::SpaceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Free,
    Reserved,
    Occupied,
}

impl fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpotStatus::Free => "free",
            SpotStatus::Reserved => "reserved",
            SpotStatus::Occupied => "occupied",
        };
        f.write_str(s)
    }
}

/// Why a toggle request did not change anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleRejection {
    /// A vehicle is in the space right now.
    Occupied,
    /// No space at that index or id.
    UnknownSpace,
}

impl fmt::Display for ToggleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleRejection::Occupied => f.write_str("cannot book an occupied spot"),
            ToggleRejection::UnknownSpace => f.write_str("no such spot"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Free -> Reserved.
    Reserved,
    /// Reserved -> Free.
    Released,
    Rejected(ToggleRejection),
}

impl ToggleOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ToggleOutcome::Rejected(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingState {
    reserved: BTreeSet<SpaceId>,
}

impl BookingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_reserved(&self, id: SpaceId) -> bool {
        self.reserved.contains(&id)
    }

    pub fn status(&self, id: SpaceId, occupancy: &OccupancySet) -> SpotStatus {
        if occupancy.contains(id) {
            SpotStatus::Occupied
        } else if self.is_reserved(id) {
            SpotStatus::Reserved
        } else {
            SpotStatus::Free
        }
    }

    /// Apply a user toggle, evaluated against `occupancy`.
    pub fn toggle(&mut self, id: SpaceId, occupancy: &OccupancySet) -> ToggleOutcome {
        if occupancy.contains(id) {
            return ToggleOutcome::Rejected(ToggleRejection::Occupied);
        }
        if self.reserved.remove(&id) {
            ToggleOutcome::Released
        } else {
            self.reserved.insert(id);
            ToggleOutcome::Reserved
        }
    }

    /// Drop any flag for a space that no longer exists.
    pub fn forget(&mut self, id: SpaceId) -> bool {
        self.reserved.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }
}
