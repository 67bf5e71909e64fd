//! Door/trigger seam
//!
//! Passability of walled sides is owned outside the world core. The mover
//! and the visibility pass ask through [`Doorways`]; [`WallDoors`] answers
//! from the wall records and queues contacts for the trigger subsystem.

use tracing::debug;

use crate::math::Vec3;
use crate::world::{World, WallKind, WallState};
use super::event::{EventQueue, WallEvent, WallEventKind};

/// Queries and notifications for sides that carry a wall
pub trait Doorways {
    /// May a moving sphere pass through this side right now
    fn is_passable(&self, world: &World, segnum: usize, side: usize) -> bool {
        world.doorway(segnum, side).fly
    }

    /// May visibility propagate through this side right now
    fn is_see_through(&self, world: &World, segnum: usize, side: usize) -> bool {
        world.doorway(segnum, side).see_through
    }

    /// A sphere passed through (or touched) a passable walled side
    fn notify_contact(&mut self, _world: &World, _segnum: usize, _side: usize, _point: Vec3) {}

    /// A sphere was stopped by a walled side
    fn notify_hit(&mut self, _world: &World, _segnum: usize, _side: usize, _point: Vec3) {}
}

/// Default door subsystem: wall state decides, events are queued
#[derive(Debug, Default, Clone)]
pub struct WallDoors {
    pub events: EventQueue<WallEvent>,
}

impl WallDoors {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: WallEventKind, world: &World, segnum: usize, side: usize, point: Vec3) {
        let wall = world
            .segments
            .get(segnum)
            .and_then(|s| s.sides.get(side))
            .and_then(|s| s.wall);
        let trigger = wall.and_then(|w| world.walls.get(w)).and_then(|w| w.trigger);
        self.events.send(WallEvent { kind, segment: segnum, side, wall, trigger, point });
    }

    /// Apply queued events between frames: a hit on an unlocked closed door
    /// opens it and its twin on the other segment. Returns doors opened.
    pub fn process_events(&mut self, world: &mut World) -> usize {
        let mut opened = 0;
        for event in self.events.drain() {
            if event.kind != WallEventKind::Hit {
                continue;
            }
            let Some(wall) = event.wall else { continue };
            // Events queued against another world (or before a reload) no longer line up
            let Some(seg) = world.segments.get(event.segment) else { continue };
            if seg.sides.get(event.side).and_then(|s| s.wall) != Some(wall) {
                continue;
            }
            let neighbor = seg.neighbors[event.side];
            let Some(record) = world.walls.get(wall) else { continue };
            if record.kind != WallKind::Door || record.locked || record.state != WallState::Closed {
                continue;
            }

            world.set_wall_state(wall, WallState::Open);
            opened += 1;

            let twin = neighbor.and_then(|other| {
                let back = world.find_connect_side(event.segment, other)?;
                world.segments.get(other)?.sides[back].wall
            });
            if let Some(twin) = twin {
                world.set_wall_state(twin, WallState::Open);
            }
            debug!(segment = event.segment, side = event.side, wall, "door opened");
        }
        opened
    }
}

impl Doorways for WallDoors {
    fn notify_contact(&mut self, world: &World, segnum: usize, side: usize, point: Vec3) {
        self.push(WallEventKind::Contact, world, segnum, side, point);
    }

    fn notify_hit(&mut self, world: &World, segnum: usize, side: usize, point: Vec3) {
        self.push(WallEventKind::Hit, world, segnum, side, point);
    }
}

/// Everything passable and see-through, nothing reported
#[derive(Debug, Default, Clone, Copy)]
pub struct AllOpen;

impl Doorways for AllOpen {
    fn is_passable(&self, world: &World, segnum: usize, side: usize) -> bool {
        world.segments[segnum].is_child(side)
    }

    fn is_see_through(&self, world: &World, segnum: usize, side: usize) -> bool {
        world.segments[segnum].is_child(side)
    }
}
