//! Connected distance between two points through passable sides
//!
//! Used for sound propagation and AI range checks, where straight-line
//! distance through solid walls would be wrong.

use std::collections::VecDeque;

use crate::math::Vec3;
use crate::world::{World, SIDE_COUNT};
use super::doors::Doorways;

/// Breadth-first path search from `from` (in `from_seg`) to `to` (in
/// `to_seg`) through sides the doors allow flying through.
///
/// Returns the length of the path through the centers of the crossed
/// sides, or `None` when `to_seg` is more than `max_hops` portals away or
/// unreachable.
pub fn connected_distance<D: Doorways + ?Sized>(
    world: &World,
    doors: &D,
    from: Vec3,
    from_seg: usize,
    to: Vec3,
    to_seg: usize,
    max_hops: usize,
) -> Option<f32> {
    let count = world.segments.len();
    if from_seg >= count || to_seg >= count {
        return None;
    }
    if from_seg == to_seg {
        return Some(from.distance(to));
    }

    // (previous segment, side crossed in it) for every reached segment
    let mut came_from: Vec<Option<(usize, usize)>> = vec![None; count];
    let mut depth = vec![usize::MAX; count];
    let mut queue = VecDeque::new();
    depth[from_seg] = 0;
    queue.push_back(from_seg);

    while let Some(segnum) = queue.pop_front() {
        if segnum == to_seg {
            break;
        }
        if depth[segnum] >= max_hops {
            continue;
        }
        for side in 0..SIDE_COUNT {
            let Some(next) = world.segments[segnum].neighbors[side] else {
                continue;
            };
            if depth[next] != usize::MAX || !doors.is_passable(world, segnum, side) {
                continue;
            }
            depth[next] = depth[segnum] + 1;
            came_from[next] = Some((segnum, side));
            queue.push_back(next);
        }
    }

    if depth[to_seg] == usize::MAX {
        return None;
    }

    // Walk back from the target collecting side centers
    let mut total = 0.0;
    let mut point = to;
    let mut segnum = to_seg;
    while let Some((prev, side)) = came_from[segnum] {
        let center = world.side_center(prev, side);
        total += point.distance(center);
        point = center;
        segnum = prev;
    }
    Some(total + point.distance(from))
}
