//! Parking space configuration.
//!
//! Spaces are polygons in frame pixel coordinates. Operators refer to them by
//! position ("Spot 3" is index 2), but every space also carries a `SpaceId`
//! allocated when the layout is built. Bookings and occupancy key on the id so
//! that removing a space never moves state onto its neighbours.

use serde::{Deserialize, Serialize};

use crate::geometry::{point_in_polygon, Bounds, Point};

/// Offset of the spot number from the label vertex, in pixels.
pub const LABEL_OFFSET: (i32, i32) = (-20, 20);

/// Vertex the spot number is anchored to.
pub const LABEL_VERTEX: usize = 2;

/// An ordered vertex list. Serialized as `[[x, y], ...]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn from_pairs(pairs: &[(i32, i32)]) -> Self {
        Self::new(pairs.iter().copied().map(Point::from).collect())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Fewer than three vertices: drawable as a line at best, never occupied.
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.vertices)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(&self.vertices)
    }

    /// Where the spot number is drawn (text origin, bottom-left).
    pub fn label_anchor(&self) -> Option<Point> {
        self.vertices
            .get(LABEL_VERTEX)
            .map(|v| v.offset(LABEL_OFFSET.0, LABEL_OFFSET.1))
    }
}

/// Session-local stable identifier of a space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(pub u64);

impl std::fmt::Display for SpaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "space#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParkingSpace {
    pub id: SpaceId,
    pub polygon: Polygon,
}

/// 1-based spot number shown to operators for a 0-based index.
pub fn spot_number(index: usize) -> usize {
    index + 1
}

/// Ordered list of configured spaces.
#[derive(Clone, Debug, Default)]
pub struct SpaceLayout {
    spaces: Vec<ParkingSpace>,
    next_id: u64,
}

impl SpaceLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon>) -> Self {
        let mut layout = Self::new();
        for polygon in polygons {
            layout.push(polygon);
        }
        layout
    }

    /// Append a space and return its freshly allocated id.
    pub fn push(&mut self, polygon: Polygon) -> SpaceId {
        let id = SpaceId(self.next_id);
        self.next_id += 1;
        self.spaces.push(ParkingSpace { id, polygon });
        id
    }

    pub fn remove_last(&mut self) -> Option<ParkingSpace> {
        self.spaces.pop()
    }

    /// Remove a space by id, returning the index it occupied.
    pub fn remove(&mut self, id: SpaceId) -> Option<(usize, ParkingSpace)> {
        let index = self.index_of(id)?;
        Some((index, self.spaces.remove(index)))
    }

    pub fn get(&self, index: usize) -> Option<&ParkingSpace> {
        self.spaces.get(index)
    }

    pub fn id_at(&self, index: usize) -> Option<SpaceId> {
        self.spaces.get(index).map(|s| s.id)
    }

    pub fn index_of(&self, id: SpaceId) -> Option<usize> {
        self.spaces.iter().position(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn spaces(&self) -> &[ParkingSpace] {
        &self.spaces
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParkingSpace> {
        self.spaces.iter()
    }

    /// Polygons in order, as written back to the configuration file.
    pub fn polygons(&self) -> Vec<Polygon> {
        self.spaces.iter().map(|s| s.polygon.clone()).collect()
    }
}
