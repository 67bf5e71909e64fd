//! Plane math and the canonical vertex ordering used for face normals
//!
//! Two segments that share a face list its four vertices in opposite
//! winding and, in general, different rotations. Sorting the absolute
//! vertex indices gives both of them the same three points to build a
//! normal from; the permutation induced by the sort tells each side whether
//! that normal has to be flipped to face into its own segment.

use super::Vec3;

/// Distance band treated as "on the plane": 250 units of 16.16 fixed point
pub const PLANE_DIST_TOLERANCE: f32 = 250.0 / 65536.0;

/// Index bigger than any real vertex, used to sort a triangle through the quad path
const SORT_SENTINEL: usize = usize::MAX;

/// Signed distance from `point` to the plane through `on_plane` with unit `normal`
#[inline]
pub fn plane_distance(point: Vec3, normal: Vec3, on_plane: Vec3) -> f32 {
    (point - on_plane).dot(normal)
}

/// Unit normal of the triangle p0, p1, p2 (cross of its first two edges)
pub fn surface_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    (p1 - p0).cross(p2 - p1).normalize()
}

/// Where a point sits relative to a plane, after applying the tolerance band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    Front,
    On,
    Behind,
}

impl PlaneSide {
    pub fn classify(distance: f32, tolerance: f32) -> Self {
        if distance > tolerance {
            PlaneSide::Front
        } else if distance < -tolerance {
            PlaneSide::Behind
        } else {
            PlaneSide::On
        }
    }
}

/// Result of [`canonical_order`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalOrder {
    /// The input indices sorted ascending
    pub sorted: [usize; 4],
    /// The normal of `sorted[0..3]` points the wrong way for the caller's winding
    pub negate: bool,
}

/// Stable-sort four vertex indices and report whether the normal built from
/// the first three sorted vertices must be negated.
///
/// `w[i]` tracks which input slot ended up at position `i`. If any of the
/// first two steps walks backwards around the quad (`(w[i] + 3) % 4 == w[i+1]`)
/// the sorted triangle is wound against the input and the flag is set.
pub fn canonical_order(v0: usize, v1: usize, v2: usize, v3: usize) -> CanonicalOrder {
    let mut v = [v0, v1, v2, v3];
    let mut w = [0usize, 1, 2, 3];

    for i in 1..4 {
        for j in 0..i {
            if v[j] > v[i] {
                v.swap(j, i);
                w.swap(j, i);
            }
        }
    }

    let negate = (w[0] + 3) % 4 == w[1] || (w[1] + 3) % 4 == w[2];
    CanonicalOrder { sorted: v, negate }
}

/// Normal of a quad built from its canonical order, facing the same way as
/// the winding `v0, v1, v2, v3`. Also returns the order, since callers need
/// the fourth sorted vertex for the planarity test.
pub fn canonical_quad_normal(vertices: &[Vec3], quad: [usize; 4]) -> (Vec3, CanonicalOrder) {
    let order = canonical_order(quad[0], quad[1], quad[2], quad[3]);
    let [a, b, c, _] = order.sorted;
    let n = surface_normal(vertices[a], vertices[b], vertices[c]);
    (if order.negate { -n } else { n }, order)
}

/// Normal of a triangle using the canonical order, so a triangle shared by
/// two segments gets exactly opposite normals from either side.
pub fn canonical_triangle_normal(vertices: &[Vec3], a: usize, b: usize, c: usize) -> Vec3 {
    let order = canonical_order(a, b, c, SORT_SENTINEL);
    let [s0, s1, s2, _] = order.sorted;
    let n = surface_normal(vertices[s0], vertices[s1], vertices[s2]);
    if order.negate { -n } else { n }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every labelling of a flat square must produce the normal of its winding
    #[test]
    fn test_canonical_order_covers_every_permutation() {
        let square = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let perms = permutations4();
        assert_eq!(perms.len(), 24);

        for labels in perms {
            // Vertex with label labels[i] sits at winding position i
            let mut vertices = [Vec3::ZERO; 4];
            for (pos, &label) in labels.iter().enumerate() {
                vertices[label] = square[pos];
            }
            let (n, _) = canonical_quad_normal(&vertices, labels);
            assert!(n.z > 0.99, "labels {:?} gave normal {:?}", labels, n);
        }
    }

    #[test]
    fn test_reversed_winding_flips_normal() {
        let vertices = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let (a, _) = canonical_quad_normal(&vertices, [0, 1, 2, 3]);
        let (b, _) = canonical_quad_normal(&vertices, [2, 1, 0, 3]);
        assert_eq!(a, -b);

        let t0 = canonical_triangle_normal(&vertices, 0, 1, 2);
        let t1 = canonical_triangle_normal(&vertices, 2, 1, 0);
        assert_eq!(t0, -t1);
    }

    #[test]
    fn test_plane_side_tolerance() {
        let tol = PLANE_DIST_TOLERANCE;
        assert_eq!(PlaneSide::classify(tol * 0.5, tol), PlaneSide::On);
        assert_eq!(PlaneSide::classify(-tol * 0.5, tol), PlaneSide::On);
        assert_eq!(PlaneSide::classify(1.0, tol), PlaneSide::Front);
        assert_eq!(PlaneSide::classify(-1.0, tol), PlaneSide::Behind);
    }

    fn permutations4() -> Vec<[usize; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let p = [a, b, c, d];
                        let mut seen = [false; 4];
                        if p.iter().all(|&x| !std::mem::replace(&mut seen[x], true)) {
                            out.push(p);
                        }
                    }
                }
            }
        }
        out
    }
}
