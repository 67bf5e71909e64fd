//! World module - segment-based level system
//!
//! - Convex six-sided segments sharing quad faces through neighbor links
//! - Side classification (flat quad or triangle pair) with cached normals
//! - Level files in RON, optionally brotli-compressed
//! - Procedural sample levels for tests and the CLI

mod builder;
mod geometry;
mod level;
mod validate;

pub use builder::*;
pub use geometry::*;
pub use level::*;
pub use validate::*;
