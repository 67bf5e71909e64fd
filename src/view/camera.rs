//! Camera and view frustum
//!
//! Provides camera positioning and orientation, and the frustum used to
//! cull portals during visibility propagation. World space is y-up.

use std::f32::consts::FRAC_PI_2;

use crate::math::{Aabb, Vec3};

/// Default horizontal field of view (radians)
pub const DEFAULT_FOV: f32 = FRAC_PI_2;
/// Default width / height ratio (320x240)
pub const DEFAULT_ASPECT: f32 = 4.0 / 3.0;

/// Camera state for visibility and rendering
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub rotation_x: f32, // Pitch
    pub rotation_y: f32, // Yaw
    /// Horizontal field of view (radians)
    pub fov: f32,
    pub aspect: f32,

    // Computed basis vectors
    pub basis_x: Vec3,
    pub basis_y: Vec3,
    pub basis_z: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        let mut cam = Self {
            position: Vec3::ZERO,
            rotation_x: 0.0,
            rotation_y: 0.0,
            fov: DEFAULT_FOV,
            aspect: DEFAULT_ASPECT,
            basis_x: Vec3::new(1.0, 0.0, 0.0),
            basis_y: Vec3::new(0.0, 1.0, 0.0),
            basis_z: Vec3::new(0.0, 0.0, 1.0),
        };
        cam.update_basis();
        cam
    }

    /// Camera at `position` looking along yaw/pitch (radians)
    pub fn looking(position: Vec3, yaw: f32, pitch: f32, fov: f32) -> Self {
        let mut cam = Self::new();
        cam.position = position;
        cam.rotation_y = yaw;
        cam.rotation_x = pitch;
        cam.fov = fov;
        cam.update_basis();
        cam
    }

    pub fn update_basis(&mut self) {
        // Forward vector based on rotation (yaw 0 looks down +Z)
        self.basis_z = Vec3 {
            x: self.rotation_x.cos() * self.rotation_y.sin(),
            y: self.rotation_x.sin(),
            z: self.rotation_x.cos() * self.rotation_y.cos(),
        };

        // Right vector
        self.basis_x = Vec3::UP.cross(self.basis_z).normalize();

        // Up vector
        self.basis_y = self.basis_z.cross(self.basis_x);
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.rotation_y += dy;
        self.rotation_x = (self.rotation_x + dx).clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
        self.update_basis();
    }

    /// Vertical field of view derived from the horizontal one and the aspect
    pub fn fov_y(&self) -> f32 {
        2.0 * ((self.fov * 0.5).tan() / self.aspect).atan()
    }

    /// Culling volume for the current position and orientation. The front
    /// plane passes through the eye so faces the viewer is about to step
    /// through are never rejected.
    pub fn frustum(&self) -> Frustum {
        let f = self.basis_z;
        let r = self.basis_x;
        let u = self.basis_y;
        let (sx, cx) = (self.fov * 0.5).sin_cos();
        let (sy, cy) = (self.fov_y() * 0.5).sin_cos();
        let origin = self.position;

        Frustum {
            planes: [
                FrustumPlane { normal: f, point: origin },
                FrustumPlane { normal: f * sx + r * cx, point: origin },
                FrustumPlane { normal: f * sx - r * cx, point: origin },
                FrustumPlane { normal: f * sy + u * cy, point: origin },
                FrustumPlane { normal: f * sy - u * cy, point: origin },
            ],
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Half-space boundary; the inside is where `normal` points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumPlane {
    pub normal: Vec3,
    pub point: Vec3,
}

impl FrustumPlane {
    pub fn distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }
}

/// Eye plane plus four side planes, no far plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [FrustumPlane; 5],
}

impl Frustum {
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance(p) >= 0.0)
    }

    /// Conservative box test: rejects only boxes fully behind one plane
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance(aabb.support(plane.normal)) >= 0.0)
    }
}
