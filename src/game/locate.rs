//! Point location
//!
//! A point is inside a segment when it is in front of (or within tolerance
//! of) every side. Finding the segment starts from a hint and walks toward
//! the point through the sides it is behind, most-violated side first,
//! backing out of dead ends. If the walk gives up, every segment is tested.

use tracing::debug;

use crate::config::CoreConfig;
use crate::math::{plane_distance, Vec3};
use crate::world::{FaceVertexList, World, SIDE_COUNT};

/// Signed distance from a side to a point, positive inside the segment.
///
/// Triangulated sides report the nearer of their two planes, so a point is
/// only considered outside once it is behind either half.
pub fn side_distance(world: &World, point: Vec3, segnum: usize, side: usize) -> f32 {
    let seg = &world.segments[segnum];
    let s = &seg.sides[side];
    let anchor = world.vertices[seg.side_anchor(side)];

    let d0 = plane_distance(point, s.normals[0], anchor);
    if !s.kind.is_triangulated() {
        return d0;
    }
    d0.min(plane_distance(point, s.normals[1], anchor))
}

/// All six side distances at once
pub fn side_distances(world: &World, point: Vec3, segnum: usize) -> [f32; SIDE_COUNT] {
    std::array::from_fn(|side| side_distance(world, point, segnum, side))
}

/// Bit `s` is set when the point is behind side `s` by more than the tolerance
pub fn point_mask(world: &World, point: Vec3, segnum: usize) -> u8 {
    let mut mask = 0;
    for side in 0..SIDE_COUNT {
        if side_distance(world, point, segnum, side) < -world.tolerance {
            mask |= 1 << side;
        }
    }
    mask
}

/// Plane-test results for a sphere against one segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegMasks {
    /// Bit per side: the center is outside that side
    pub center: u8,
    /// Two bits per side (one per triangle): the sphere reaches past that face
    pub face: u16,
    /// Bit per side: the sphere reaches past that side
    pub side: u8,
}

impl SegMasks {
    /// Both face bits of a side
    pub fn side_faces(&self, side: usize) -> u16 {
        (self.face >> (side * 2)) & 0b11
    }
}

/// Plane tests for a sphere.
///
/// A bent side whose second triangle rises into the segment (a ridge) leaves
/// the segment once the sphere is behind either triangle. A side that folds
/// away from the segment (a valley) has to be crossed on both triangles.
pub fn sphere_masks(world: &World, center: Vec3, segnum: usize, radius: f32) -> SegMasks {
    let tolerance = world.tolerance;
    let seg = &world.segments[segnum];
    let mut masks = SegMasks::default();
    let mut facebit: u16 = 1;

    for side in 0..SIDE_COUNT {
        let sidebit = 1u8 << side;
        let s = &seg.sides[side];

        match seg.abs_vertex_list(side) {
            FaceVertexList::Triangles(list) => {
                let anchor = world.vertices[list[0].min(list[2])];

                // Measure one triangle's far corner against the other plane
                let fold = if list[4] < list[1] {
                    plane_distance(world.vertices[list[4]], s.normals[0], anchor)
                } else {
                    plane_distance(world.vertices[list[1]], s.normals[1], anchor)
                };
                let ridge = fold > tolerance;

                let mut center_count = 0;
                let mut side_count = 0;
                for normal in s.normals {
                    let dist = plane_distance(center, normal, anchor);
                    if dist < -tolerance {
                        center_count += 1;
                    }
                    if dist - radius < -tolerance {
                        masks.face |= facebit;
                        side_count += 1;
                    }
                    facebit <<= 1;
                }

                let needed = if ridge { 1 } else { 2 };
                if side_count >= needed {
                    masks.side |= sidebit;
                }
                if center_count >= needed {
                    masks.center |= sidebit;
                }
            }
            FaceVertexList::Quad(_) => {
                let anchor = world.vertices[seg.side_anchor(side)];
                let dist = plane_distance(center, s.normals[0], anchor);
                if dist < -tolerance {
                    masks.center |= sidebit;
                }
                if dist - radius < -tolerance {
                    masks.face |= facebit;
                    masks.side |= sidebit;
                }
                facebit <<= 2;
            }
        }
    }

    masks
}

/// Diagnostics for the most recent trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    /// Segments examined
    pub calls: usize,
    /// Deepest recursion level reached (the start segment is level 0)
    pub max_depth: usize,
    /// The walk failed and `locate` tested every segment instead
    pub scanned: bool,
}

/// Point locator with reusable scratch state.
///
/// One locator per caller; results never borrow from it.
#[derive(Debug, Clone)]
pub struct Locator {
    max_depth: usize,
    visited: Vec<u32>,
    generation: u32,
    stats: TraceStats,
}

impl Default for Locator {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

impl Locator {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            visited: Vec::new(),
            generation: 0,
            stats: TraceStats::default(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.trace_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn last_trace(&self) -> TraceStats {
        self.stats
    }

    /// Walk from `start` toward the segment containing `point`
    pub fn trace(&mut self, world: &World, point: Vec3, start: usize) -> Option<usize> {
        self.stats = TraceStats::default();
        if start >= world.segments.len() || !point.is_finite() {
            return None;
        }
        self.begin_pass(world.segments.len());
        self.trace_from(world, point, start, 0)
    }

    /// Find the segment containing `point`, trying the hint's neighborhood
    /// first and then every segment.
    pub fn locate(&mut self, world: &World, point: Vec3, hint: usize) -> Option<usize> {
        if !point.is_finite() {
            self.stats = TraceStats::default();
            return None;
        }
        if let Some(found) = self.trace(world, point, hint) {
            return Some(found);
        }

        let found = (0..world.segments.len()).find(|&segnum| point_mask(world, point, segnum) == 0);
        self.stats.scanned = true;
        debug!(
            hint,
            calls = self.stats.calls,
            found = ?found,
            "trace failed, scanned all segments"
        );
        found
    }

    fn begin_pass(&mut self, segment_count: usize) {
        if self.visited.len() != segment_count {
            self.visited.clear();
            self.visited.resize(segment_count, 0);
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.visited.fill(0);
            self.generation = 1;
        }
    }

    fn trace_from(&mut self, world: &World, point: Vec3, segnum: usize, depth: usize) -> Option<usize> {
        if depth > self.max_depth || self.visited[segnum] == self.generation {
            return None;
        }
        self.visited[segnum] = self.generation;
        self.stats.calls += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let mut dists = side_distances(world, point, segnum);
        let mut mask = 0u8;
        for (side, &d) in dists.iter().enumerate() {
            if d < -world.tolerance {
                mask |= 1 << side;
            }
        }
        if mask == 0 {
            return Some(segnum);
        }

        let neighbors = world.segments[segnum].neighbors;
        loop {
            // Most negative distance among violated sides that lead somewhere
            let mut best: Option<(usize, usize)> = None;
            let mut best_dist = 0.0;
            for side in 0..SIDE_COUNT {
                if mask & (1 << side) == 0 {
                    continue;
                }
                if let Some(next) = neighbors[side] {
                    if dists[side] < best_dist {
                        best_dist = dists[side];
                        best = Some((side, next));
                    }
                }
            }

            let (side, next) = best?;
            dists[side] = 0.0;
            if let Some(found) = self.trace_from(world, point, next, depth + 1) {
                return Some(found);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{
        box_corners, create_corridor, create_test_world, WorldBuilder, SIDE_BOTTOM, SIDE_LEFT,
        SIDE_RIGHT, SIDE_TOP,
    };
    use proptest::prelude::*;

    #[test]
    fn test_side_distance_in_cube() {
        let world = create_test_world();
        let p = Vec3::new(-7.0, 2.0, 0.0);
        assert!((side_distance(&world, p, 0, SIDE_LEFT) - 3.0).abs() < 1e-4);
        assert!((side_distance(&world, p, 0, SIDE_RIGHT) - 17.0).abs() < 1e-4);
        assert!((side_distance(&world, p, 0, SIDE_TOP) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_point_mask_bits() {
        let world = create_test_world();
        assert_eq!(point_mask(&world, Vec3::ZERO, 0), 0);
        assert_eq!(point_mask(&world, Vec3::new(15.0, 0.0, 0.0), 0), 1 << SIDE_RIGHT);
        assert_eq!(
            point_mask(&world, Vec3::new(15.0, 12.0, 0.0), 0),
            (1 << SIDE_RIGHT) | (1 << SIDE_TOP)
        );
        // On the boundary counts as inside
        assert_eq!(point_mask(&world, Vec3::new(10.0, 0.0, 0.0), 0), 0);
    }

    #[test]
    fn test_sphere_masks_flag_near_sides() {
        let world = create_test_world();
        let masks = sphere_masks(&world, Vec3::new(-8.0, 0.0, 0.0), 0, 3.0);
        assert_eq!(masks.center, 0);
        assert_eq!(masks.side, 1 << SIDE_LEFT);
        assert_eq!(masks.side_faces(SIDE_LEFT), 0b01);
        assert_eq!(masks.face, 1 << (SIDE_LEFT * 2));

        let clear = sphere_masks(&world, Vec3::ZERO, 0, 3.0);
        assert_eq!(clear, SegMasks::default());
    }

    #[test]
    fn test_sphere_masks_on_bent_side() {
        let mut builder = WorldBuilder::new();
        let seg = builder.add_cube(Vec3::ZERO, 10.0);
        let mut world = builder.build();
        let v0 = world.segments[seg].verts[0];
        world.vertices[v0] = Vec3::new(14.0, 10.0, -10.0);
        crate::world::validate_segments(&mut world);
        assert!(world.segments[seg].sides[SIDE_RIGHT].kind.is_triangulated());

        let masks = sphere_masks(&world, Vec3::ZERO, seg, 1.0);
        assert_eq!(masks.side & (1 << SIDE_RIGHT), 0);
        let masks = sphere_masks(&world, Vec3::new(11.5, 0.0, 0.0), seg, 1.0);
        assert_ne!(masks.side_faces(SIDE_RIGHT), 0);
    }

    #[test]
    fn test_trace_walks_neighbors() {
        let world = create_test_world();
        let mut locator = Locator::default();
        assert_eq!(locator.trace(&world, Vec3::new(20.0, 20.0, 0.0), 0), Some(3));
        assert_eq!(locator.trace(&world, Vec3::new(20.0, 0.0, 20.0), 0), Some(4));
        assert!(locator.last_trace().calls >= 3);
    }

    #[test]
    fn test_trace_on_cycle_without_interior_point() {
        // Three disjoint cubes wired into a loop; the target is in none of them
        let mut builder = WorldBuilder::new();
        let a = builder.add_cube(Vec3::ZERO, 10.0);
        let b = builder.add_cube(Vec3::new(100.0, 0.0, 0.0), 10.0);
        let c = builder.add_cube(Vec3::new(200.0, 0.0, 0.0), 10.0);
        builder.connect(a, SIDE_RIGHT, b, SIDE_LEFT);
        builder.connect(b, SIDE_RIGHT, c, SIDE_LEFT);
        builder.connect(c, SIDE_TOP, a, SIDE_BOTTOM);
        let world = builder.build();

        let mut locator = Locator::default();
        let target = Vec3::new(1000.0, -500.0, 0.0);
        assert_eq!(locator.trace(&world, target, a), None);
        let stats = locator.last_trace();
        assert!(stats.max_depth <= locator.max_depth());
        assert!(stats.calls <= 3);
        assert_eq!(locator.locate(&world, target, b), None);
    }

    #[test]
    fn test_trace_depth_cap_and_scan_fallback() {
        let world = create_corridor(30);
        let mut locator = Locator::new(20);

        let reachable = world.segment_center(20);
        assert_eq!(locator.trace(&world, reachable, 0), Some(20));
        assert_eq!(locator.last_trace().max_depth, 20);

        let far = world.segment_center(29);
        assert_eq!(locator.trace(&world, far, 0), None);
        assert!(locator.last_trace().max_depth <= 20);
        assert!(!locator.last_trace().scanned);
        assert_eq!(locator.locate(&world, far, 0), Some(29));
        assert!(locator.last_trace().scanned);

        // A successful walk clears the flag again
        assert_eq!(locator.locate(&world, reachable, 0), Some(20));
        assert!(!locator.last_trace().scanned);
    }

    #[test]
    fn test_locate_rejects_bad_input() {
        let world = create_test_world();
        let mut locator = Locator::default();
        assert_eq!(locator.locate(&world, Vec3::new(f32::NAN, 0.0, 0.0), 0), None);
        // Stale hint past the end still finds the point
        assert_eq!(locator.locate(&world, Vec3::new(40.0, 0.0, 0.0), 99), Some(2));
    }

    #[test]
    fn test_locator_survives_world_change() {
        let mut locator = Locator::default();
        let small = create_test_world();
        assert_eq!(locator.locate(&small, Vec3::ZERO, 0), Some(0));
        let corridor = create_corridor(8);
        assert_eq!(locator.locate(&corridor, corridor.segment_center(7), 0), Some(7));
    }

    proptest! {
        #[test]
        fn prop_points_inside_box_have_zero_mask(
            size in (1.0f32..200.0, 1.0f32..200.0, 1.0f32..200.0),
            t in (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0),
        ) {
            let mut builder = WorldBuilder::new();
            let max = Vec3::new(size.0, size.1, size.2);
            let seg = builder.add_segment(box_corners(Vec3::ZERO, max));
            let world = builder.build();

            let p = Vec3::new(max.x * t.0, max.y * t.1, max.z * t.2);
            prop_assert_eq!(point_mask(&world, p, seg), 0);
        }

        #[test]
        fn prop_locate_center_round_trip(length in 2usize..12, target in 0usize..12, hint in 0usize..12) {
            let world = create_corridor(length);
            let target = target % length;
            let mut locator = Locator::default();
            prop_assert_eq!(locator.locate(&world, world.segment_center(target), hint), Some(target));
        }

        #[test]
        fn prop_locate_test_world_centers(target in 0usize..5, hint in 0usize..5) {
            let world = create_test_world();
            let mut locator = Locator::default();
            prop_assert_eq!(locator.locate(&world, world.segment_center(target), hint), Some(target));
        }
    }

    #[test]
    fn test_bottom_neighbor_is_found_from_above() {
        let world = create_test_world();
        let mut locator = Locator::default();
        assert_eq!(world.segments[3].neighbors[SIDE_BOTTOM], Some(1));
        assert_eq!(locator.trace(&world, Vec3::new(20.0, 0.0, 0.0), 3), Some(1));
    }
}
