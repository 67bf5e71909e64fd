//! Geometry kernel: vectors, boxes, planes and canonical face ordering

mod plane;
mod vec3;

pub use plane::*;
pub use vec3::*;
