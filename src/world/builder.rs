//! Procedural world construction and sample levels
//!
//! `WorldBuilder` de-duplicates vertices by exact position, then links any
//! two sides that name the same four vertices. Sides are classified last.

use std::collections::HashMap;

use crate::math::Vec3;
use super::{
    validate_segments, Segment, Wall, WallState, World, SEGMENT_VERTEX_COUNT, SIDE_COUNT,
    SIDE_BACK, SIDE_RIGHT, SIDE_TOP,
};

/// Default edge half-length for sample segments (world units)
pub const SAMPLE_HALF_SIZE: f32 = 10.0;

#[derive(Debug, Clone)]
struct PendingWall {
    segnum: usize,
    side: usize,
    wall: Wall,
    /// Also attach a copy to the matching side of the neighbor
    mirrored: bool,
}

/// Incremental builder for [`World`]
#[derive(Debug, Default)]
pub struct WorldBuilder {
    vertices: Vec<Vec3>,
    lookup: HashMap<[u32; 3], usize>,
    segments: Vec<Segment>,
    walls: Vec<PendingWall>,
    links: Vec<(usize, usize, usize, usize)>,
    tolerance: Option<f32>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify with a tolerance other than the default
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Add a vertex, reusing an existing one at exactly the same position
    pub fn add_vertex(&mut self, p: Vec3) -> usize {
        // +0.0 folds negative zero onto positive zero
        let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.vertices.len();
        self.vertices.push(p);
        self.lookup.insert(key, index);
        index
    }

    /// Add a segment from its eight corners, in [`super::SIDE_TO_VERTS`] layout
    pub fn add_segment(&mut self, corners: [Vec3; SEGMENT_VERTEX_COUNT]) -> usize {
        let verts = corners.map(|p| self.add_vertex(p));
        self.segments.push(Segment::new(verts));
        self.segments.len() - 1
    }

    /// Axis-aligned box segment
    pub fn add_box(&mut self, min: Vec3, max: Vec3) -> usize {
        self.add_segment(box_corners(min, max))
    }

    /// Cube segment around `center` with the given half edge length
    pub fn add_cube(&mut self, center: Vec3, half: f32) -> usize {
        let h = Vec3::new(half, half, half);
        self.add_box(center - h, center + h)
    }

    /// Attach a wall to one side only
    pub fn add_wall(&mut self, segnum: usize, side: usize, wall: Wall) {
        self.walls.push(PendingWall { segnum, side, wall, mirrored: false });
    }

    /// Attach a door to a side and to the neighbor's matching side
    pub fn add_door(&mut self, segnum: usize, side: usize, state: WallState) {
        self.add_wall_pair(segnum, side, Wall::door(state));
    }

    /// Attach copies of `wall` to both faces of a portal
    pub fn add_wall_pair(&mut self, segnum: usize, side: usize, wall: Wall) {
        self.walls.push(PendingWall { segnum, side, wall, mirrored: true });
    }

    /// Force a link regardless of geometry (for hand-built graphs)
    pub fn connect(&mut self, a: usize, side_a: usize, b: usize, side_b: usize) {
        self.links.push((a, side_a, b, side_b));
    }

    /// Link coincident faces, attach walls and classify every side
    pub fn build(mut self) -> World {
        self.link_shared_faces();
        for &(a, side_a, b, side_b) in &self.links {
            self.segments[a].neighbors[side_a] = Some(b);
            self.segments[b].neighbors[side_b] = Some(a);
        }

        let mut world = World::new();
        if let Some(tolerance) = self.tolerance {
            world.tolerance = tolerance;
        }
        world.vertices = self.vertices;
        world.segments = self.segments;

        for pending in self.walls {
            let index = world.walls.len();
            world.walls.push(pending.wall.clone());
            world.segments[pending.segnum].sides[pending.side].wall = Some(index);

            if !pending.mirrored {
                continue;
            }
            let Some(other) = world.segments[pending.segnum].neighbors[pending.side] else {
                continue;
            };
            if let Some(back) = world.find_connect_side(pending.segnum, other) {
                let index = world.walls.len();
                world.walls.push(pending.wall);
                world.segments[other].sides[back].wall = Some(index);
            }
        }

        validate_segments(&mut world);
        world
    }

    fn link_shared_faces(&mut self) {
        let mut faces: HashMap<[usize; 4], Vec<(usize, usize)>> = HashMap::new();
        for (segnum, seg) in self.segments.iter().enumerate() {
            for side in 0..SIDE_COUNT {
                let mut key = seg.side_verts(side);
                key.sort_unstable();
                faces.entry(key).or_default().push((segnum, side));
            }
        }

        for owners in faces.values() {
            if let [(a, side_a), (b, side_b)] = owners[..] {
                if a != b {
                    self.segments[a].neighbors[side_a] = Some(b);
                    self.segments[b].neighbors[side_b] = Some(a);
                }
            }
        }
    }
}

/// Corners of an axis-aligned box in segment vertex order
pub fn box_corners(min: Vec3, max: Vec3) -> [Vec3; SEGMENT_VERTEX_COUNT] {
    [
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
    ]
}

/// Straight run of `length` cubes along +x, each linked to the next
pub fn create_corridor(length: usize) -> World {
    let mut builder = WorldBuilder::new();
    for i in 0..length {
        let center = Vec3::new(i as f32 * SAMPLE_HALF_SIZE * 2.0, 0.0, 0.0);
        builder.add_cube(center, SAMPLE_HALF_SIZE);
    }
    builder.build()
}

/// Small test level:
///
/// ```text
///          [3]            (3 sits on top of 1)
///   [0] -- [1] == [2]     (== is a closed door)
///           |
///          [4]            (4 is behind 1, along +z)
/// ```
pub fn create_test_world() -> World {
    let mut builder = WorldBuilder::new();
    let step = SAMPLE_HALF_SIZE * 2.0;

    let _s0 = builder.add_cube(Vec3::ZERO, SAMPLE_HALF_SIZE);
    let s1 = builder.add_cube(Vec3::new(step, 0.0, 0.0), SAMPLE_HALF_SIZE);
    let _s2 = builder.add_cube(Vec3::new(step * 2.0, 0.0, 0.0), SAMPLE_HALF_SIZE);
    let _s3 = builder.add_cube(Vec3::new(step, step, 0.0), SAMPLE_HALF_SIZE);
    let _s4 = builder.add_cube(Vec3::new(step, 0.0, step), SAMPLE_HALF_SIZE);
    builder.add_door(s1, SIDE_RIGHT, WallState::Closed);

    let world = builder.build();
    debug_assert!(world.segments[s1].neighbors[SIDE_TOP].is_some());
    debug_assert!(world.segments[s1].neighbors[SIDE_BACK].is_some());
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{SIDE_BOTTOM, SIDE_FRONT, SIDE_LEFT};

    #[test]
    fn test_adjacent_cubes_share_vertices_and_link() {
        let mut builder = WorldBuilder::new();
        let a = builder.add_cube(Vec3::ZERO, 10.0);
        let b = builder.add_cube(Vec3::new(20.0, 0.0, 0.0), 10.0);
        let world = builder.build();

        assert_eq!(world.vertices.len(), 12);
        assert_eq!(world.segments[a].neighbors[SIDE_RIGHT], Some(b));
        assert_eq!(world.segments[b].neighbors[SIDE_LEFT], Some(a));
        assert_eq!(world.segments[a].neighbors[SIDE_LEFT], None);
    }

    #[test]
    fn test_corridor_links_in_sequence() {
        let world = create_corridor(4);
        assert_eq!(world.segment_count(), 4);
        for i in 0..3 {
            assert_eq!(world.segments[i].neighbors[SIDE_RIGHT], Some(i + 1));
            assert_eq!(world.segments[i + 1].neighbors[SIDE_LEFT], Some(i));
        }
    }

    #[test]
    fn test_door_is_mirrored_onto_neighbor() {
        let world = create_test_world();
        let w1 = world.segments[1].sides[SIDE_RIGHT].wall.unwrap();
        let w2 = world.segments[2].sides[SIDE_LEFT].wall.unwrap();
        assert_ne!(w1, w2);
        assert_eq!(world.walls[w1], world.walls[w2]);
        assert_eq!(world.segments[3].neighbors[SIDE_BOTTOM], Some(1));
        assert_eq!(world.segments[4].neighbors[SIDE_FRONT], Some(1));
    }

    #[test]
    fn test_forced_links_survive_build() {
        let mut builder = WorldBuilder::new();
        let a = builder.add_cube(Vec3::ZERO, 10.0);
        let b = builder.add_cube(Vec3::new(100.0, 0.0, 0.0), 10.0);
        builder.connect(a, SIDE_TOP, b, SIDE_BOTTOM);
        let world = builder.build();
        assert_eq!(world.segments[a].neighbors[SIDE_TOP], Some(b));
        assert_eq!(world.find_connect_side(a, b), Some(SIDE_BOTTOM));
    }
}
