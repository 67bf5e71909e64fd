//! Game-side queries against the segment graph
//!
//! Everything here runs once per frame on the game thread, reads the world
//! without changing it, and is bounded by the caps in [`crate::config`]:
//! - Point location: which segment contains a point
//! - Sphere movement: portal transitions, doors, wall push-back
//! - Door seam: passability queries and contact/hit events
//! - Connected distance through passable sides

pub mod collision;
pub mod connect;
pub mod doors;
pub mod event;
pub mod locate;

pub use collision::{Mover, MoveRequest, MoveResult};
pub use connect::connected_distance;
pub use doors::{AllOpen, Doorways, WallDoors};
pub use event::{EventQueue, WallEvent, WallEventKind};
pub use locate::{point_mask, side_distance, side_distances, sphere_masks, Locator, SegMasks, TraceStats};
