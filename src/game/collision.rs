//! Collision System
//!
//! Sphere-vs-segment collision. The sphere is tested against the sides of
//! its current segment only:
//! 1. Open portal the center has crossed: move into the neighbor
//! 2. Walled portal: ask the door subsystem, then cross or push back
//! 3. Solid wall: push back along the side normal
//!
//! Each pass may change the segment, so the tests repeat a few times per
//! step until nothing is violated.

use tracing::{debug, warn};

use crate::config::CoreConfig;
use crate::math::Vec3;
use crate::world::{World, SIDE_COUNT};
use super::doors::Doorways;
use super::locate::{point_mask, side_distance, sphere_masks, Locator};

/// One movement step for a sphere
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest {
    /// Last resolved position (inside `segment`)
    pub from: Vec3,
    /// Desired position
    pub to: Vec3,
    /// Segment containing `from`
    pub segment: usize,
    pub radius: f32,
    /// Send `notify_hit` when a wall stops the sphere
    pub report_hits: bool,
}

impl MoveRequest {
    pub fn new(from: Vec3, to: Vec3, segment: usize, radius: f32) -> Self {
        Self { from, to, segment, radius, report_hits: true }
    }
}

/// Result of a movement step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// Corrected position
    pub position: Vec3,
    /// Segment containing `position`
    pub segment: usize,
    /// Was the sphere pushed back (or stopped) by anything?
    pub collided: bool,
    /// Portal crossings made during the step
    pub transitions: usize,
    /// Passes used, at most the configured iteration cap
    pub iterations: usize,
}

/// What one side does to the sphere in the current pass
enum SideAction {
    Cross(usize),
    Push,
    Nothing,
}

/// Resolves sphere movement against the segment graph
#[derive(Debug, Clone)]
pub struct Mover {
    locator: Locator,
    max_iterations: usize,
}

impl Default for Mover {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

impl Mover {
    pub fn new(max_iterations: usize, trace_depth: usize) -> Self {
        Self {
            locator: Locator::new(trace_depth),
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.mover_iterations, config.trace_depth)
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Move a sphere from `request.from` toward `request.to`
    pub fn move_sphere<D: Doorways + ?Sized>(
        &mut self,
        world: &World,
        doors: &mut D,
        request: &MoveRequest,
    ) -> MoveResult {
        let radius = request.radius;
        let tolerance = world.tolerance;
        let mut pos = request.to;
        let mut segnum = request.segment;
        let mut collided = false;
        let mut transitions = 0;
        let mut iterations = 0;

        if segnum >= world.segments.len() || !pos.is_finite() {
            return self.revert(request);
        }

        'passes: while iterations < self.max_iterations {
            iterations += 1;

            if sphere_masks(world, pos, segnum, radius).face == 0 {
                break;
            }

            let mut changed = false;
            for side in 0..SIDE_COUNT {
                let dist = side_distance(world, pos, segnum, side);
                if dist >= radius - tolerance {
                    continue;
                }

                match self.side_action(world, doors, segnum, side, pos, dist, request.report_hits) {
                    SideAction::Cross(next) => {
                        let Some(found) = self.enter(world, pos, next) else {
                            warn!(segment = segnum, side, x = pos.x, y = pos.y, z = pos.z,
                                "crossed a portal into nowhere, reverting");
                            return self.revert(request);
                        };
                        debug!(from = segnum, to = found, side, "portal transition");
                        segnum = found;
                        transitions += 1;
                        continue 'passes;
                    }
                    SideAction::Push => {
                        let normal = world.segments[segnum].sides[side].average_normal();
                        pos += normal * (radius - dist);
                        collided = true;
                        changed = true;
                    }
                    SideAction::Nothing => {}
                }
            }

            if !changed {
                break;
            }
        }

        // Pushing out of a concave corner can leave the center outside
        if point_mask(world, pos, segnum) != 0 {
            match self.locator.locate(world, pos, segnum) {
                Some(found) => segnum = found,
                None => {
                    warn!(segment = segnum, x = pos.x, y = pos.y, z = pos.z,
                        "sphere ended outside the level, reverting");
                    return self.revert(request);
                }
            }
        }

        MoveResult { position: pos, segment: segnum, collided, transitions, iterations }
    }

    #[allow(clippy::too_many_arguments)]
    fn side_action<D: Doorways + ?Sized>(
        &self,
        world: &World,
        doors: &mut D,
        segnum: usize,
        side: usize,
        pos: Vec3,
        dist: f32,
        report_hits: bool,
    ) -> SideAction {
        let seg = &world.segments[segnum];
        let crossed = dist < -world.tolerance;

        match seg.neighbors[side] {
            Some(next) if seg.sides[side].wall.is_none() => {
                if crossed { SideAction::Cross(next) } else { SideAction::Nothing }
            }
            Some(next) => {
                if doors.is_passable(world, segnum, side) {
                    if crossed {
                        doors.notify_contact(world, segnum, side, pos);
                        SideAction::Cross(next)
                    } else {
                        SideAction::Nothing
                    }
                } else {
                    if report_hits {
                        doors.notify_hit(world, segnum, side, pos);
                    }
                    SideAction::Push
                }
            }
            None => SideAction::Push,
        }
    }

    /// Segment containing `pos`, starting the search in `next`
    fn enter(&mut self, world: &World, pos: Vec3, next: usize) -> Option<usize> {
        self.locator
            .trace(world, pos, next)
            .or_else(|| self.locator.locate(world, pos, next))
    }

    /// Outside all segments - stay where we were, like hitting a wall
    fn revert(&self, request: &MoveRequest) -> MoveResult {
        MoveResult {
            position: request.from,
            segment: request.segment,
            collided: true,
            transitions: 0,
            iterations: 0,
        }
    }
}
