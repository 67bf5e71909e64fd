//! World-space faces for the renderer
//!
//! Every side of a visible segment that must be drawn (solid walls, doors,
//! grates, illusions) becomes one quad or two triangles. Open portals draw
//! nothing.

use crate::math::Vec3;
use crate::world::{FaceVertexList, World, SIDE_COUNT};

/// Geometry of one side
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SideFace {
    Quad {
        verts: [Vec3; 4],
        normal: Vec3,
    },
    Triangles {
        verts: [[Vec3; 3]; 2],
        normals: [Vec3; 2],
    },
}

impl SideFace {
    /// Geometry of a side as classified
    pub fn of_side(world: &World, segnum: usize, side: usize) -> Self {
        let seg = &world.segments[segnum];
        let normals = seg.sides[side].normals;
        match seg.abs_vertex_list(side) {
            FaceVertexList::Quad(q) => SideFace::Quad {
                verts: q.map(|v| world.vertices[v]),
                normal: normals[0],
            },
            FaceVertexList::Triangles(t) => SideFace::Triangles {
                verts: [
                    [world.vertices[t[0]], world.vertices[t[1]], world.vertices[t[2]]],
                    [world.vertices[t[3]], world.vertices[t[4]], world.vertices[t[5]]],
                ],
                normals,
            },
        }
    }

    /// Triangles for rasterization, fanned from the first corner for quads
    pub fn triangles(&self) -> [[Vec3; 3]; 2] {
        match *self {
            SideFace::Quad { verts: [a, b, c, d], .. } => [[a, b, c], [a, c, d]],
            SideFace::Triangles { verts, .. } => verts,
        }
    }
}

/// A drawable side of a visible segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderFace {
    pub segment: usize,
    pub side: usize,
    /// Wall record, for door/grate textures
    pub wall: Option<usize>,
    pub face: SideFace,
}

/// Fill `out` with the drawable sides of `visible` (cleared first)
pub fn collect_render_faces(
    world: &World,
    visible: &[usize],
    out: &mut Vec<RenderFace>,
) {
    out.clear();
    for &segnum in visible {
        let Some(seg) = world.segments.get(segnum) else {
            continue;
        };
        for side in 0..SIDE_COUNT {
            if world.doorway(segnum, side).render {
                out.push(RenderFace {
                    segment: segnum,
                    side,
                    wall: seg.sides[side].wall,
                    face: SideFace::of_side(world, segnum, side),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{create_test_world, validate_segments, WallState, WorldBuilder, SIDE_RIGHT};

    #[test]
    fn test_open_portals_are_not_drawn() {
        let world = create_test_world();
        let mut faces = Vec::new();
        collect_render_faces(&world, &[0, 1], &mut faces);

        // s0: five walls; s1: left/top/back are portals, right is a closed door
        let s0 = faces.iter().filter(|f| f.segment == 0).count();
        let s1: Vec<_> = faces.iter().filter(|f| f.segment == 1).collect();
        assert_eq!(s0, 5);
        assert_eq!(s1.len(), 3);
        assert!(s1.iter().any(|f| f.side == SIDE_RIGHT && f.wall.is_some()));
    }

    #[test]
    fn test_open_door_is_not_drawn() {
        let mut world = create_test_world();
        let wall = world.segments[1].sides[SIDE_RIGHT].wall.unwrap();
        world.set_wall_state(wall, WallState::Open);
        let mut faces = Vec::new();
        collect_render_faces(&world, &[1], &mut faces);
        assert!(faces.iter().all(|f| f.side != SIDE_RIGHT));
    }

    #[test]
    fn test_quad_face_matches_side() {
        let world = create_test_world();
        match SideFace::of_side(&world, 0, SIDE_RIGHT) {
            SideFace::Quad { verts, normal } => {
                assert!(verts.iter().all(|v| (v.x - 10.0).abs() < 1e-6));
                assert!((normal - Vec3::new(-1.0, 0.0, 0.0)).len() < 1e-5);
            }
            other => panic!("expected quad, got {:?}", other),
        }
    }

    #[test]
    fn test_bent_side_yields_two_triangles() {
        let mut builder = WorldBuilder::new();
        let seg = builder.add_cube(Vec3::ZERO, 10.0);
        let mut world = builder.build();
        let v0 = world.segments[seg].verts[0];
        world.vertices[v0] = Vec3::new(14.0, 10.0, -10.0);
        validate_segments(&mut world);

        let face = SideFace::of_side(&world, seg, SIDE_RIGHT);
        let SideFace::Triangles { verts, normals } = face else {
            panic!("expected triangles");
        };
        assert_ne!(normals[0], normals[1]);
        assert!(verts.iter().flatten().any(|&v| v == Vec3::new(14.0, 10.0, -10.0)));
        assert_eq!(face.triangles(), verts);
    }
}
