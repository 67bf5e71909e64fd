//! segworld: world core for levels built from six-sided segments
//!
//! A level is a graph of convex cells joined through shared quad faces.
//! This crate decides which geometry exists where:
//! - Side classification: flat quads or consistently split triangle pairs
//! - Point location with a bounded, backtracking graph walk
//! - Sphere movement through portals and doors, push-back from walls
//! - Per-frame visible set by portal BFS and frustum culling
//!
//! Nothing here draws, plays sound or touches the network. Level files are
//! RON (optionally brotli-compressed); everything else is in memory.

pub mod config;
pub mod game;
pub mod math;
pub mod view;
pub mod world;

pub use config::CoreConfig;
pub use game::{Doorways, Locator, MoveRequest, MoveResult, Mover, WallDoors};
pub use math::{Aabb, Vec3};
pub use view::{Camera, Frustum, Visibility};
pub use world::{LevelError, World};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
