//! Portal visibility
//!
//! Breadth-first search from the viewer's segment. A neighbor is added when
//! the side leading to it lets visibility through and the side's bounding box
//! touches the view frustum. No precomputed PVS; the set is rebuilt every
//! frame into reused buffers.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::CoreConfig;
use crate::game::Doorways;
use crate::world::{World, SIDE_COUNT};
use super::camera::Frustum;

/// Per-frame visible segment set
#[derive(Debug, Clone)]
pub struct Visibility {
    max_visible: usize,
    queue: VecDeque<usize>,
    stamps: Vec<u32>,
    generation: u32,
    visible: Vec<usize>,
    /// Set when the last update stopped at the cap
    truncated: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

impl Visibility {
    pub fn new(max_visible: usize) -> Self {
        Self {
            max_visible: max_visible.max(1),
            queue: VecDeque::new(),
            stamps: Vec::new(),
            generation: 0,
            visible: Vec::with_capacity(max_visible),
            truncated: false,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.max_visible)
    }

    /// Segments found by the last update, in discovery order (viewer first)
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn is_visible(&self, segnum: usize) -> bool {
        self.generation != 0 && self.stamps.get(segnum) == Some(&self.generation)
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Rebuild the visible set from `viewer`. An unknown viewer segment
    /// yields an empty set.
    pub fn update<D: Doorways + ?Sized>(
        &mut self,
        world: &World,
        doors: &D,
        frustum: &Frustum,
        viewer: usize,
    ) -> &[usize] {
        self.visible.clear();
        self.queue.clear();
        self.truncated = false;
        self.next_generation(world.segments.len());
        if viewer >= world.segments.len() {
            return &self.visible;
        }

        self.stamps[viewer] = self.generation;
        self.visible.push(viewer);
        self.queue.push_back(viewer);

        'search: while let Some(segnum) = self.queue.pop_front() {
            for side in 0..SIDE_COUNT {
                let Some(next) = world.segments[segnum].neighbors[side] else {
                    continue;
                };
                if self.stamps[next] == self.generation {
                    continue;
                }
                if !doors.is_see_through(world, segnum, side) {
                    continue;
                }
                if !frustum.intersects_aabb(&world.side_aabb(segnum, side)) {
                    continue;
                }

                if self.visible.len() >= self.max_visible {
                    self.truncated = true;
                    debug!(viewer, cap = self.max_visible, "visible set full");
                    break 'search;
                }
                self.stamps[next] = self.generation;
                self.visible.push(next);
                self.queue.push_back(next);
            }
        }

        &self.visible
    }

    fn next_generation(&mut self, segment_count: usize) {
        if self.stamps.len() != segment_count {
            self.stamps.clear();
            self.stamps.resize(segment_count, 0);
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamps.fill(0);
            self.generation = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{AllOpen, WallDoors};
    use crate::math::Vec3;
    use crate::view::Camera;
    use crate::world::{create_corridor, create_test_world, WallState, SIDE_LEFT, SIDE_RIGHT};
    use std::collections::HashSet;
    use std::f32::consts::FRAC_PI_2;

    fn visible_set(world: &World, camera: &Camera, viewer: usize) -> HashSet<usize> {
        let mut vis = Visibility::default();
        vis.update(world, &WallDoors::new(), &camera.frustum(), viewer);
        vis.visible().iter().copied().collect()
    }

    #[test]
    fn test_facing_away_excludes_neighbor() {
        let world = create_test_world();
        assert_eq!(world.segments[0].neighbors[SIDE_RIGHT], Some(1));
        let camera = Camera::looking(Vec3::ZERO, -FRAC_PI_2, 0.0, FRAC_PI_2);
        let visible = visible_set(&world, &camera, 0);
        assert_eq!(visible, HashSet::from([0]));
    }

    #[test]
    fn test_facing_portal_sees_through() {
        let world = create_test_world();
        let camera = Camera::looking(Vec3::new(-5.0, 0.0, 0.0), FRAC_PI_2, 0.0, FRAC_PI_2);
        let visible = visible_set(&world, &camera, 0);
        assert!(visible.contains(&1));
        assert!(visible.contains(&3));
        assert!(visible.contains(&4));
        // Behind a closed door
        assert!(!visible.contains(&2));
    }

    #[test]
    fn test_portal_right_in_front_of_viewer_stays_visible() {
        let world = create_corridor(3);
        for x in [5.0, 9.5, 9.99] {
            let camera = Camera::looking(Vec3::new(x, 0.0, 0.0), FRAC_PI_2, 0.0, FRAC_PI_2);
            let mut vis = Visibility::default();
            let visible = vis.update(&world, &AllOpen, &camera.frustum(), 0).to_vec();
            assert_eq!(visible, vec![0, 1, 2], "viewer at x={}", x);
        }
    }

    #[test]
    fn test_open_door_lets_view_through() {
        let mut world = create_test_world();
        let wall = world.segments[1].sides[SIDE_RIGHT].wall.unwrap();
        world.set_wall_state(wall, WallState::Open);
        let twin = world.segments[2].sides[SIDE_LEFT].wall.unwrap();
        world.set_wall_state(twin, WallState::Open);

        let camera = Camera::looking(Vec3::new(-5.0, 0.0, 0.0), FRAC_PI_2, 0.0, FRAC_PI_2);
        assert!(visible_set(&world, &camera, 0).contains(&2));
    }

    #[test]
    fn test_narrowing_fov_never_adds_segments() {
        let world = create_test_world();
        let pos = Vec3::new(-5.0, 0.0, 0.0);
        let mut previous: Option<HashSet<usize>> = None;
        for degrees in [150.0f32, 120.0, 90.0, 60.0, 40.0, 20.0] {
            let camera = Camera::looking(pos, FRAC_PI_2, 0.0, degrees.to_radians());
            let current = visible_set(&world, &camera, 0);
            if let Some(wider) = &previous {
                assert!(current.is_subset(wider), "{} deg: {:?} not in {:?}", degrees, current, wider);
            }
            previous = Some(current);
        }
        assert_eq!(previous, Some(HashSet::from([0, 1])));
    }

    #[test]
    fn test_cap_limits_set() {
        let world = create_corridor(12);
        let camera = Camera::looking(Vec3::ZERO, FRAC_PI_2, 0.0, FRAC_PI_2);
        let mut vis = Visibility::new(5);
        let visible = vis.update(&world, &AllOpen, &camera.frustum(), 0).to_vec();
        assert_eq!(visible, vec![0, 1, 2, 3, 4]);
        assert!(vis.truncated());
        assert!(vis.is_visible(4));
        assert!(!vis.is_visible(5));
    }

    #[test]
    fn test_buffers_are_reused_between_frames() {
        let world = create_corridor(6);
        let mut vis = Visibility::default();
        let forward = Camera::looking(Vec3::ZERO, FRAC_PI_2, 0.0, FRAC_PI_2).frustum();
        let backward = Camera::looking(Vec3::ZERO, -FRAC_PI_2, 0.0, FRAC_PI_2).frustum();

        assert_eq!(vis.update(&world, &AllOpen, &forward, 0).len(), 6);
        assert_eq!(vis.update(&world, &AllOpen, &backward, 0).to_vec(), vec![0]);
        assert!(!vis.is_visible(3));
        assert!(vis.update(&world, &AllOpen, &forward, 99).is_empty());
    }
}
