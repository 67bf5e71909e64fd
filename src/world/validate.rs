//! Segment validator: classify every side as a flat quad or a triangle pair
//!
//! Flat sides get one normal. Bent sides are split along a diagonal; walls
//! pick the diagonal that keeps the segment convex, portal sides pick it by
//! canonical vertex order so both segments split the shared face the same
//! way. After splitting, the two triangles are checked once more and merged
//! back into a quad if they turn out to be coplanar after all.

use crate::math::{
    canonical_quad_normal, canonical_triangle_normal, plane_distance, surface_normal,
    PlaneSide, Vec3,
};
use super::{FaceVertexList, SideKind, World, SIDE_COUNT};

/// Summary of one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub quads: usize,
    pub triangulated: usize,
    /// Sides that were split and then merged back
    pub detriangulated: usize,
}

/// Classify one side and cache its normals
pub fn classify_side(world: &mut World, segnum: usize, side: usize) -> SideKind {
    let tolerance = world.tolerance;
    let quad = world.segments[segnum].side_verts(side);
    let (quad_normal, order) = canonical_quad_normal(&world.vertices, quad);

    let [s0, _, _, s3] = order.sorted;
    let off_plane = plane_distance(world.vertices[s3], quad_normal, world.vertices[s0]).abs();

    if off_plane <= tolerance {
        set_quad(world, segnum, side, quad_normal);
        return SideKind::Quad;
    }

    let (kind, normals) = if world.segments[segnum].is_child(side) {
        split_portal_side(&world.vertices, quad, order.sorted[0])
    } else {
        split_wall_side(&world.vertices, quad)
    };
    {
        let s = &mut world.segments[segnum].sides[side];
        s.kind = kind;
        s.normals = normals;
    }

    if triangles_are_coplanar(world, segnum, side) {
        set_quad(world, segnum, side, quad_normal);
        return SideKind::Quad;
    }
    kind
}

/// Classify every side of every segment
pub fn validate_segments(world: &mut World) -> ClassifyStats {
    let mut stats = ClassifyStats::default();
    for segnum in 0..world.segments.len() {
        for side in 0..SIDE_COUNT {
            let before_split = is_bent(world, segnum, side);
            match classify_side(world, segnum, side) {
                SideKind::Quad if before_split => {
                    stats.quads += 1;
                    stats.detriangulated += 1;
                }
                SideKind::Quad => stats.quads += 1,
                _ => stats.triangulated += 1,
            }
        }
    }
    stats
}

fn set_quad(world: &mut World, segnum: usize, side: usize, normal: Vec3) {
    let s = &mut world.segments[segnum].sides[side];
    s.kind = SideKind::Quad;
    s.normals = [normal, normal];
}

/// Quick planarity test without touching the side
fn is_bent(world: &World, segnum: usize, side: usize) -> bool {
    let quad = world.segments[segnum].side_verts(side);
    let (normal, order) = canonical_quad_normal(&world.vertices, quad);
    let [s0, _, _, s3] = order.sorted;
    plane_distance(world.vertices[s3], normal, world.vertices[s0]).abs() > world.tolerance
}

/// Walls: split so the segment stays convex.
///
/// With face a = (0,1,2) and normal Na, the 0-2 diagonal is used when
/// `Na . (v3 - v1) >= 0`, otherwise the 1-3 diagonal.
fn split_wall_side(vertices: &[Vec3], quad: [usize; 4]) -> (SideKind, [Vec3; 2]) {
    let p = quad.map(|v| vertices[v]);
    let na = surface_normal(p[0], p[1], p[2]);
    if na.dot(p[3] - p[1]) >= 0.0 {
        (
            SideKind::Tri02,
            [surface_normal(p[0], p[1], p[2]), surface_normal(p[0], p[2], p[3])],
        )
    } else {
        (
            SideKind::Tri13,
            [surface_normal(p[0], p[1], p[3]), surface_normal(p[1], p[2], p[3])],
        )
    }
}

/// Portals: the diagonal always runs through the lowest vertex index, and the
/// triangle normals come from the canonical order, so the segment on the
/// other side derives the same split with mirrored normals.
fn split_portal_side(vertices: &[Vec3], quad: [usize; 4], lowest: usize) -> (SideKind, [Vec3; 2]) {
    let [v0, v1, v2, v3] = quad;
    if lowest == v0 || lowest == v2 {
        (
            SideKind::Tri02,
            [
                canonical_triangle_normal(vertices, v0, v1, v2),
                canonical_triangle_normal(vertices, v0, v2, v3),
            ],
        )
    } else {
        (
            SideKind::Tri13,
            [
                canonical_triangle_normal(vertices, v0, v1, v3),
                canonical_triangle_normal(vertices, v1, v2, v3),
            ],
        )
    }
}

/// Each triangle's far vertex measured against the other triangle's plane.
/// Coplanar (either reads "on") or inconsistent signs mean the split buys
/// nothing.
fn triangles_are_coplanar(world: &World, segnum: usize, side: usize) -> bool {
    let seg = &world.segments[segnum];
    let FaceVertexList::Triangles(list) = seg.abs_vertex_list(side) else {
        return true;
    };
    let normals = seg.sides[side].normals;
    let anchor = world.vertices[list[0].min(list[2])];

    let dist0 = plane_distance(world.vertices[list[1]], normals[1], anchor);
    let dist1 = plane_distance(world.vertices[list[4]], normals[0], anchor);

    let s0 = PlaneSide::classify(dist0, world.tolerance);
    let s1 = PlaneSide::classify(dist1, world.tolerance);
    s0 == PlaneSide::On || s1 == PlaneSide::On || s0 != s1
}
