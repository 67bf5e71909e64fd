//! Core data model for segment-based levels
//!
//! A level is a graph of convex six-sided cells ("segments") sharing
//! quadrilateral faces. Vertices live in one global store; a segment names
//! eight of them and every side picks four through [`SIDE_TO_VERTS`].

use serde::{Serialize, Deserialize};
use crate::math::{Aabb, Vec3, PLANE_DIST_TOLERANCE};

/// Sides per segment
pub const SIDE_COUNT: usize = 6;
/// Vertices per segment
pub const SEGMENT_VERTEX_COUNT: usize = 8;

pub const SIDE_LEFT: usize = 0;
pub const SIDE_TOP: usize = 1;
pub const SIDE_RIGHT: usize = 2;
pub const SIDE_BOTTOM: usize = 3;
pub const SIDE_BACK: usize = 4;
pub const SIDE_FRONT: usize = 5;

/// Which of a segment's eight vertices make up each side, wound so that the
/// derived normal faces into the segment.
///
/// Vertex layout (x right, y up, z back):
/// 0 = (+x,+y,-z)  1 = (+x,-y,-z)  2 = (-x,-y,-z)  3 = (-x,+y,-z)
/// 4 = (+x,+y,+z)  5 = (+x,-y,+z)  6 = (-x,-y,+z)  7 = (-x,+y,+z)
pub const SIDE_TO_VERTS: [[usize; 4]; SIDE_COUNT] = [
    [7, 6, 2, 3], // left
    [0, 4, 7, 3], // top
    [0, 1, 5, 4], // right
    [2, 6, 5, 1], // bottom
    [4, 5, 6, 7], // back
    [3, 2, 1, 0], // front
];

/// Side across the segment from each side
pub const OPPOSITE_SIDE: [usize; SIDE_COUNT] = [
    SIDE_RIGHT, SIDE_BOTTOM, SIDE_LEFT, SIDE_TOP, SIDE_FRONT, SIDE_BACK,
];

fn default_tolerance() -> f32 { PLANE_DIST_TOLERANCE }

/// How a side's quad is represented for plane tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideKind {
    /// Flat within tolerance: one plane
    #[default]
    Quad,
    /// Split along the diagonal from corner 0 to corner 2
    Tri02,
    /// Split along the diagonal from corner 1 to corner 3
    Tri13,
}

impl SideKind {
    pub fn is_triangulated(self) -> bool {
        !matches!(self, SideKind::Quad)
    }

    pub fn face_count(self) -> usize {
        if self.is_triangulated() { 2 } else { 1 }
    }
}

/// One face of a segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Side {
    /// Wall record attached to this side (doors, illusions, grates)
    #[serde(default)]
    pub wall: Option<usize>,
    /// Classification, filled in by the segment validator
    #[serde(skip)]
    pub kind: SideKind,
    /// Unit normals facing into the segment; both equal for a quad
    #[serde(skip)]
    pub normals: [Vec3; 2],
}

impl Side {
    pub fn with_wall(wall: usize) -> Self {
        Self { wall: Some(wall), ..Self::default() }
    }

    /// Single direction for the whole side (triangle normals averaged)
    pub fn average_normal(&self) -> Vec3 {
        if self.kind.is_triangulated() {
            (self.normals[0] + self.normals[1]).normalize()
        } else {
            self.normals[0]
        }
    }
}

/// A convex, nominally six-sided cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Indices into [`World::vertices`]
    pub verts: [usize; SEGMENT_VERTEX_COUNT],
    /// Segment across each side, `None` for a solid wall
    #[serde(default)]
    pub neighbors: [Option<usize>; SIDE_COUNT],
    #[serde(default)]
    pub sides: [Side; SIDE_COUNT],
}

impl Segment {
    pub fn new(verts: [usize; SEGMENT_VERTEX_COUNT]) -> Self {
        Self {
            verts,
            neighbors: [None; SIDE_COUNT],
            sides: [Side::default(); SIDE_COUNT],
        }
    }

    /// Absolute vertex indices of a side, in winding order
    pub fn side_verts(&self, side: usize) -> [usize; 4] {
        let table = &SIDE_TO_VERTS[side];
        [
            self.verts[table[0]],
            self.verts[table[1]],
            self.verts[table[2]],
            self.verts[table[3]],
        ]
    }

    /// Absolute vertex indices per face of a side: one quad or two triangles
    pub fn abs_vertex_list(&self, side: usize) -> FaceVertexList {
        let [v0, v1, v2, v3] = self.side_verts(side);
        match self.sides[side].kind {
            SideKind::Quad => FaceVertexList::Quad([v0, v1, v2, v3]),
            SideKind::Tri02 => FaceVertexList::Triangles([v0, v1, v2, v2, v3, v0]),
            SideKind::Tri13 => FaceVertexList::Triangles([v3, v0, v1, v1, v2, v3]),
        }
    }

    /// Vertex used as the plane anchor for a side.
    ///
    /// Always the lowest absolute index on the shared geometry (the whole quad,
    /// or the split diagonal) so that both segments at a portal measure
    /// distances from the same point.
    pub fn side_anchor(&self, side: usize) -> usize {
        match self.abs_vertex_list(side) {
            FaceVertexList::Quad(q) => q[0].min(q[1]).min(q[2]).min(q[3]),
            FaceVertexList::Triangles(t) => t[0].min(t[2]),
        }
    }

    pub fn is_child(&self, side: usize) -> bool {
        self.neighbors[side].is_some()
    }
}

/// Output of [`Segment::abs_vertex_list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceVertexList {
    Quad([usize; 4]),
    /// First triangle in `[0..3]`, second in `[3..6]`
    Triangles([usize; 6]),
}

/// Wall behaviour attached to a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallKind {
    /// Opens and closes under trigger control
    Door,
    /// Solid until destroyed
    Blastable,
    /// Looks solid, but can be flown through
    Illusion,
    /// Force field or grate: see-through, never passable while closed
    Closed,
}

/// Current state, owned by the door/trigger subsystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallState {
    Open,
    #[default]
    Closed,
    Destroyed,
}

/// A wall record referenced from one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub kind: WallKind,
    #[serde(default)]
    pub state: WallState,
    /// Locked doors do not open on contact
    #[serde(default)]
    pub locked: bool,
    /// Trigger fired when something touches this wall
    #[serde(default)]
    pub trigger: Option<usize>,
}

impl Wall {
    pub fn new(kind: WallKind, state: WallState) -> Self {
        Self { kind, state, locked: false, trigger: None }
    }

    pub fn door(state: WallState) -> Self {
        Self::new(WallKind::Door, state)
    }

    /// Passability for this wall in its current state
    pub fn doorway(&self) -> Doorway {
        match (self.kind, self.state) {
            (WallKind::Door, WallState::Closed) => Doorway::SOLID,
            (WallKind::Door, _) => Doorway::OPEN,
            (WallKind::Blastable, WallState::Destroyed) => Doorway {
                fly: true,
                see_through: true,
                render: true,
            },
            (WallKind::Blastable, _) => Doorway::SOLID,
            (WallKind::Illusion, WallState::Open) => Doorway::OPEN,
            (WallKind::Illusion, _) => Doorway {
                fly: true,
                see_through: false,
                render: true,
            },
            (WallKind::Closed, WallState::Open) => Doorway::OPEN,
            (WallKind::Closed, _) => Doorway {
                fly: false,
                see_through: true,
                render: true,
            },
        }
    }
}

/// What a side allows right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doorway {
    /// A moving sphere may pass through
    pub fly: bool,
    /// Visibility may propagate through
    pub see_through: bool,
    /// The renderer must draw a face here
    pub render: bool,
}

impl Doorway {
    /// Drawn and blocks everything, as plain walls and closed doors do
    pub const SOLID: Doorway = Doorway { fly: false, see_through: false, render: true };
    /// Open portal: nothing drawn, nothing blocked
    pub const OPEN: Doorway = Doorway { fly: true, see_through: true, render: false };
}

/// The whole level graph.
///
/// Built once by the loader; afterwards only wall state changes, and only
/// between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub vertices: Vec<Vec3>,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    /// Plane tolerance the sides were classified with
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            segments: Vec::new(),
            walls: Vec::new(),
            tolerance: PLANE_DIST_TOLERANCE,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, segnum: usize) -> Option<&Segment> {
        self.segments.get(segnum)
    }

    pub fn vertex(&self, index: usize) -> Vec3 {
        self.vertices[index]
    }

    /// World-space corners of a side, in winding order
    pub fn side_points(&self, segnum: usize, side: usize) -> [Vec3; 4] {
        self.segments[segnum].side_verts(side).map(|v| self.vertices[v])
    }

    /// Average of a segment's eight vertices
    pub fn segment_center(&self, segnum: usize) -> Vec3 {
        let points = self.segments[segnum].verts.map(|v| self.vertices[v]);
        Vec3::average(&points)
    }

    /// Average of a side's four vertices
    pub fn side_center(&self, segnum: usize, side: usize) -> Vec3 {
        Vec3::average(&self.side_points(segnum, side))
    }

    pub fn side_aabb(&self, segnum: usize, side: usize) -> Aabb {
        Aabb::from_points(&self.side_points(segnum, side))
    }

    pub fn segment_aabb(&self, segnum: usize) -> Aabb {
        let points = self.segments[segnum].verts.map(|v| self.vertices[v]);
        Aabb::from_points(&points)
    }

    /// Side of `other` whose neighbor link points back to `segnum`
    pub fn find_connect_side(&self, segnum: usize, other: usize) -> Option<usize> {
        self.segments
            .get(other)?
            .neighbors
            .iter()
            .position(|&n| n == Some(segnum))
    }

    pub fn wall_at(&self, segnum: usize, side: usize) -> Option<&Wall> {
        let wall = self.segments.get(segnum)?.sides[side].wall?;
        self.walls.get(wall)
    }

    /// Mutable wall record, for the door subsystem between frames
    pub fn wall_mut(&mut self, wall: usize) -> Option<&mut Wall> {
        self.walls.get_mut(wall)
    }

    /// Set a wall's state; returns false for an unknown wall index
    pub fn set_wall_state(&mut self, wall: usize, state: WallState) -> bool {
        match self.walls.get_mut(wall) {
            Some(w) => {
                w.state = state;
                true
            }
            None => false,
        }
    }

    /// What a side currently allows, from its neighbor link and wall state
    pub fn doorway(&self, segnum: usize, side: usize) -> Doorway {
        let seg = &self.segments[segnum];
        if !seg.is_child(side) {
            return Doorway::SOLID;
        }
        match self.wall_at(segnum, side) {
            Some(wall) => wall.doorway(),
            None => Doorway::OPEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_table_uses_each_vertex_three_times() {
        let mut uses = [0; SEGMENT_VERTEX_COUNT];
        for side in SIDE_TO_VERTS.iter() {
            for &v in side {
                uses[v] += 1;
            }
        }
        assert!(uses.iter().all(|&n| n == 3));
    }

    #[test]
    fn test_opposite_sides_share_no_vertex() {
        for side in 0..SIDE_COUNT {
            let other = OPPOSITE_SIDE[side];
            assert_eq!(OPPOSITE_SIDE[other], side);
            for v in SIDE_TO_VERTS[side] {
                assert!(!SIDE_TO_VERTS[other].contains(&v));
            }
        }
    }

    #[test]
    fn test_abs_vertex_list_diagonals() {
        let mut seg = Segment::new([10, 11, 12, 13, 14, 15, 16, 17]);
        // right side = [0, 1, 5, 4] -> [10, 11, 15, 14]
        seg.sides[SIDE_RIGHT].kind = SideKind::Tri02;
        assert_eq!(
            seg.abs_vertex_list(SIDE_RIGHT),
            FaceVertexList::Triangles([10, 11, 15, 15, 14, 10])
        );
        assert_eq!(seg.side_anchor(SIDE_RIGHT), 10);

        seg.sides[SIDE_RIGHT].kind = SideKind::Tri13;
        assert_eq!(
            seg.abs_vertex_list(SIDE_RIGHT),
            FaceVertexList::Triangles([14, 10, 11, 11, 15, 14])
        );
        assert_eq!(seg.side_anchor(SIDE_RIGHT), 11);
    }

    #[test]
    fn test_wall_doorways() {
        assert_eq!(Wall::door(WallState::Open).doorway(), Doorway::OPEN);
        assert_eq!(Wall::door(WallState::Closed).doorway(), Doorway::SOLID);
        assert_eq!(Wall::new(WallKind::Blastable, WallState::Closed).doorway(), Doorway::SOLID);

        let illusion = Wall::new(WallKind::Illusion, WallState::Closed).doorway();
        assert!(illusion.fly && illusion.render && !illusion.see_through);

        let grate = Wall::new(WallKind::Closed, WallState::Closed).doorway();
        assert!(!grate.fly && grate.see_through);

        let rubble = Wall::new(WallKind::Blastable, WallState::Destroyed).doorway();
        assert!(rubble.fly && rubble.see_through);
    }
}
