//! What the viewer can see
//!
//! - Camera basis and view frustum
//! - Per-frame visible segment set (portal BFS with frustum culling)
//! - Drawable side geometry for the renderer

mod camera;
mod faces;
mod visibility;

pub use camera::*;
pub use faces::*;
pub use visibility::*;
