//! Monitoring session.
//!
//! `Session` is a cloneable handle to one `SessionState` behind a mutex. The
//! processing loop publishes each frame's occupancy through it and UI or
//! control threads toggle and remove spaces through it. Every operation takes
//! the lock once, so a toggle is judged against the occupancy of the last
//! fully processed frame and never against a half-applied one.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::booking::{BookingState, SpotStatus, ToggleOutcome, ToggleRejection};
use crate::detect::BackendRegistry;
use crate::frame::Frame;
use crate::occupancy::{OccupancyResolver, OccupancySet};
use crate::space::{spot_number, ParkingSpace, SpaceId, SpaceLayout};
use crate::storage::SpaceStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpotReport {
    /// 0-based position in the layout.
    pub index: usize,
    /// 1-based number shown to operators.
    pub number: usize,
    pub id: SpaceId,
    pub status: SpotStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: usize,
    pub occupied: usize,
    pub available: usize,
}

/// Per-space status and totals, ready for a renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Frame the occupancy came from; `None` before the first frame.
    pub frame_sequence: Option<u64>,
    pub spots: Vec<SpotReport>,
    pub counts: Counts,
}

impl StatusReport {
    pub fn status_of(&self, index: usize) -> Option<SpotStatus> {
        self.spots.get(index).map(|s| s.status)
    }
}

/// What one processed frame produced.
#[derive(Clone, Debug)]
pub struct StatusSnapshot {
    pub report: StatusReport,
    pub annotated: Frame,
    pub vehicles: usize,
}

#[derive(Debug, Default)]
struct SessionState {
    layout: SpaceLayout,
    occupancy: OccupancySet,
    bookings: BookingState,
    frame_sequence: Option<u64>,
}

impl SessionState {
    fn report(&self) -> StatusReport {
        let spots: Vec<SpotReport> = self
            .layout
            .iter()
            .enumerate()
            .map(|(index, space)| SpotReport {
                index,
                number: spot_number(index),
                id: space.id,
                status: self.bookings.status(space.id, &self.occupancy),
            })
            .collect();
        let total = spots.len();
        let occupied = spots
            .iter()
            .filter(|s| s.status == SpotStatus::Occupied)
            .count();
        StatusReport {
            frame_sequence: self.frame_sequence,
            spots,
            counts: Counts {
                total,
                occupied,
                available: total - occupied,
            },
        }
    }

    fn toggle(&mut self, id: SpaceId) -> ToggleOutcome {
        let Some(index) = self.layout.index_of(id) else {
            return ToggleOutcome::Rejected(ToggleRejection::UnknownSpace);
        };
        let outcome = self.bookings.toggle(id, &self.occupancy);
        match outcome {
            ToggleOutcome::Reserved => log::info!("spot {} reserved", spot_number(index)),
            ToggleOutcome::Released => log::info!("spot {} released", spot_number(index)),
            ToggleOutcome::Rejected(reason) => {
                log::warn!("spot {}: {}", spot_number(index), reason)
            }
        }
        outcome
    }

    /// Persist the layout without `id`, then drop it and its flag.
    /// Spaces after it shift down one position and keep their own flags.
    fn remove(
        &mut self,
        store: &dyn SpaceStore,
        id: SpaceId,
    ) -> Result<Option<(usize, ParkingSpace)>> {
        let Some(index) = self.layout.index_of(id) else {
            return Ok(None);
        };
        let mut remaining = self.layout.clone();
        let removed = remaining.remove(id);
        store.save(&remaining.polygons())?;
        self.layout = remaining;
        self.bookings.forget(id);
        log::info!(
            "removed spot {} ({}), {} spaces left",
            spot_number(index),
            id,
            self.layout.len()
        );
        Ok(removed)
    }
}

/// Shared handle to the session state.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn SpaceStore>,
}

impl Session {
    /// Start a session from the spaces currently in `store`.
    pub fn open(store: Arc<dyn SpaceStore>) -> Result<Self> {
        let polygons = store.load()?;
        log::info!(
            "session opened with {} spaces from {}",
            polygons.len(),
            store.describe()
        );
        let state = SessionState {
            layout: SpaceLayout::from_polygons(polygons),
            ..SessionState::default()
        };
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            store,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))
    }

    /// Copy of the current space list.
    pub fn spaces(&self) -> Result<Vec<ParkingSpace>> {
        Ok(self.lock()?.layout.spaces().to_vec())
    }

    pub fn space_count(&self) -> Result<usize> {
        Ok(self.lock()?.layout.len())
    }

    pub fn id_at(&self, index: usize) -> Result<Option<SpaceId>> {
        Ok(self.lock()?.layout.id_at(index))
    }

    /// Replace the occupancy set with one frame's result.
    pub fn apply_occupancy(&self, frame_sequence: u64, occupancy: OccupancySet) -> Result<StatusReport> {
        let mut state = self.lock()?;
        state.occupancy = occupancy;
        state.frame_sequence = Some(frame_sequence);
        Ok(state.report())
    }

    pub fn report(&self) -> Result<StatusReport> {
        Ok(self.lock()?.report())
    }

    /// Toggle the reservation of the space at 0-based `index`.
    pub fn toggle_space(&self, index: usize) -> Result<ToggleOutcome> {
        let mut state = self.lock()?;
        let Some(id) = state.layout.id_at(index) else {
            log::warn!("toggle for spot {}: no such spot", spot_number(index));
            return Ok(ToggleOutcome::Rejected(ToggleRejection::UnknownSpace));
        };
        Ok(state.toggle(id))
    }

    /// Remove a space by id and persist the shortened list.
    pub fn remove_space(&self, id: SpaceId) -> Result<Option<(usize, ParkingSpace)>> {
        let mut state = self.lock()?;
        state.remove(self.store.as_ref(), id)
    }

    /// Remove the last configured space. Compatibility path for the
    /// positional editor.
    pub fn remove_last_space(&self) -> Result<Option<ParkingSpace>> {
        let mut state = self.lock()?;
        let Some(id) = state.layout.spaces().last().map(|s| s.id) else {
            log::info!("no spaces to remove");
            return Ok(None);
        };
        Ok(state.remove(self.store.as_ref(), id)?.map(|(_, space)| space))
    }

    pub fn is_reserved(&self, id: SpaceId) -> Result<bool> {
        Ok(self.lock()?.bookings.is_reserved(id))
    }
}

/// Runs detection and occupancy for frames and feeds the session.
pub struct SessionController {
    session: Session,
    detectors: BackendRegistry,
    resolver: OccupancyResolver,
}

impl SessionController {
    pub fn new(session: Session, detectors: BackendRegistry, resolver: OccupancyResolver) -> Self {
        Self {
            session,
            detectors,
            resolver,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Detect, resolve and publish one frame.
    ///
    /// Detection and drawing run outside the session lock against a copy of
    /// the space list; only the final occupancy swap holds it.
    pub fn process_frame(&self, frame: &Frame) -> Result<StatusSnapshot> {
        let detections = self.detectors.detect(frame)?;
        let spaces = self.session.spaces()?;
        let resolution = self.resolver.resolve(frame, &detections, &spaces);
        log::debug!(
            "frame {}: {} detections, {} vehicles, {} occupied",
            frame.sequence(),
            detections.len(),
            resolution.vehicles,
            resolution.occupied.len()
        );
        let report = self
            .session
            .apply_occupancy(frame.sequence(), resolution.occupied)?;
        Ok(StatusSnapshot {
            report,
            annotated: resolution.annotated,
            vehicles: resolution.vehicles,
        })
    }

    pub fn toggle_space(&self, index: usize) -> Result<ToggleOutcome> {
        self.session.toggle_space(index)
    }

    pub fn remove_last_space(&self) -> Result<Option<ParkingSpace>> {
        self.session.remove_last_space()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, StubBackend, COCO_CAR};
    use crate::space::Polygon;
    use crate::storage::InMemorySpaceStore;

    fn squares(n: i32) -> Vec<Polygon> {
        (0..n)
            .map(|i| {
                let x = i * 20;
                Polygon::from_pairs(&[(x, 0), (x + 10, 0), (x + 10, 10), (x, 10)])
            })
            .collect()
    }

    fn open(n: i32) -> (Session, Arc<InMemorySpaceStore>) {
        let store = Arc::new(InMemorySpaceStore::new(squares(n)));
        let session = Session::open(store.clone()).unwrap();
        (session, store)
    }

    #[test]
    fn empty_frame_counts_everything_available() {
        let (session, _) = open(3);
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        let controller = SessionController::new(session, registry, OccupancyResolver::default());

        let snap = controller.process_frame(&Frame::solid(1, 64, 16, [0, 0, 0])).unwrap();
        assert_eq!(
            snap.report.counts,
            Counts {
                total: 3,
                occupied: 0,
                available: 3
            }
        );
        assert_eq!(snap.report.frame_sequence, Some(1));
    }

    #[test]
    fn toggle_is_judged_against_last_published_occupancy() {
        let (session, _) = open(2);
        let id0 = session.id_at(0).unwrap().unwrap();
        session
            .apply_occupancy(1, [id0].into_iter().collect())
            .unwrap();
        assert_eq!(
            session.toggle_space(0).unwrap(),
            ToggleOutcome::Rejected(ToggleRejection::Occupied)
        );
        assert_eq!(session.toggle_space(1).unwrap(), ToggleOutcome::Reserved);

        let report = session.apply_occupancy(2, OccupancySet::new()).unwrap();
        assert_eq!(report.status_of(0), Some(SpotStatus::Free));
        assert_eq!(report.status_of(1), Some(SpotStatus::Reserved));
    }

    #[test]
    fn toggle_out_of_range_is_rejected() {
        let (session, _) = open(1);
        assert_eq!(
            session.toggle_space(5).unwrap(),
            ToggleOutcome::Rejected(ToggleRejection::UnknownSpace)
        );
    }

    #[test]
    fn remove_last_persists_and_keeps_earlier_flags() {
        let (session, store) = open(3);
        session.toggle_space(1).unwrap();
        let removed = session.remove_last_space().unwrap().unwrap();
        assert_eq!(removed.polygon, squares(3)[2]);
        assert_eq!(store.snapshot(), squares(2));

        let report = session.report().unwrap();
        assert_eq!(report.counts.total, 2);
        assert_eq!(report.status_of(1), Some(SpotStatus::Reserved));
    }

    #[test]
    fn concurrent_remove_last_takes_distinct_spaces() {
        let (session, store) = open(4);
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let session = session.clone();
                std::thread::spawn(move || session.remove_last_space().unwrap())
            })
            .collect();
        let mut removed: Vec<Polygon> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap().polygon)
            .collect();
        removed.sort_by_key(|p| p.vertices()[0].x);
        assert_eq!(removed, squares(4)[1..].to_vec());
        assert_eq!(session.space_count().unwrap(), 1);
        assert_eq!(store.snapshot(), squares(1));
    }

    #[test]
    fn remove_last_on_empty_layout_is_a_no_op() {
        let (session, _) = open(0);
        assert!(session.remove_last_space().unwrap().is_none());
    }

    #[test]
    fn controller_marks_vehicle_space_occupied() {
        let (session, _) = open(2);
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::repeating(vec![Detection::centered_at(
            25, 5, 2, 0.9, COCO_CAR,
        )]));
        let controller = SessionController::new(session, registry, OccupancyResolver::default());
        let snap = controller.process_frame(&Frame::solid(4, 64, 16, [0, 0, 0])).unwrap();
        assert_eq!(snap.report.status_of(0), Some(SpotStatus::Free));
        assert_eq!(snap.report.status_of(1), Some(SpotStatus::Occupied));
        assert_eq!(snap.report.counts.available, 1);
        assert_eq!(snap.annotated.sequence(), 4);
        assert_eq!(
            controller.toggle_space(1).unwrap(),
            ToggleOutcome::Rejected(ToggleRejection::Occupied)
        );
    }
}
