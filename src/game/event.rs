//! Event System
//!
//! The mover and the visibility pass never change wall state themselves.
//! They report what they touched as events; the door/trigger subsystem
//! drains the queue between frames and decides what happens.
//!
//! Example flow:
//! 1. Mover pushes a sphere off a closed door -> sends a `Hit` event
//! 2. Door subsystem drains the queue -> opens the door if it is unlocked
//! 3. Next frame the side is passable and the sphere flies through

use crate::math::Vec3;

/// A queue for events of a single type.
/// Events are collected during the frame and drained at specific points.
#[derive(Debug, Clone)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Send an event (add to queue)
    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate over events without clearing
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    /// Drain all events (returns iterator and clears queue)
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events without processing
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened at a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallEventKind {
    /// Something passed through or brushed a passable wall
    Contact,
    /// Something was stopped by the wall
    Hit,
}

/// A sphere touched the wall on one side of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallEvent {
    pub kind: WallEventKind,
    pub segment: usize,
    pub side: usize,
    /// Wall record index, if the side carries one
    pub wall: Option<usize>,
    /// Trigger linked to the wall
    pub trigger: Option<usize>,
    /// Sphere center at the moment of contact
    pub point: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue() {
        let mut queue: EventQueue<i32> = EventQueue::new();

        queue.send(1);
        queue.send(2);
        queue.send(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.iter().copied().sum::<i32>(), 6);

        let collected: Vec<_> = queue.drain().collect();
        assert_eq!(collected, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_discards_events() {
        let mut queue = EventQueue::default();
        queue.send(WallEvent {
            kind: WallEventKind::Hit,
            segment: 0,
            side: 2,
            wall: None,
            trigger: None,
            point: Vec3::ZERO,
        });
        assert!(!queue.is_empty());
        queue.clear();
        assert_eq!(queue.len(), 0);
    }
}
