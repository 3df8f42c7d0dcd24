//! A free-flying first-person camera.
//!
//! Orientation is stored as yaw and pitch in radians. The forward, right and up
//! vectors are derived from those angles every time they change, so they are
//! never out of date. Pitch is clamped to ±90° so the view cannot flip over;
//! yaw is left to grow and wraps through `sin`/`cos`.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3};

use crate::renderer::Surface;

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// `x` is yaw, `y` is pitch.
    look_angle: Vec2,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    /// Creates a camera at `position` looking along `look` (yaw, pitch in radians).
    pub fn new(position: Vec3, look: Vec2) -> Self {
        let mut camera = Self {
            position,
            look_angle: Vec2::new(look.x, look.y.clamp(-FRAC_PI_2, FRAC_PI_2)),
            forward: Vec3::Z,
            right: Vec3::NEG_X,
            up: Vec3::Y,
        };
        camera.update_basis();
        camera
    }

    /// Moves along the current forward and right vectors, scaled by `delta_time`.
    pub fn move_by(&mut self, forward: f32, right: f32, delta_time: f32) {
        self.position += self.forward * (forward * delta_time) + self.right * (right * delta_time);
    }

    /// Moves straight up (or down for negative `amount`) in world space.
    pub fn ascend(&mut self, amount: f32, delta_time: f32) {
        self.position.y += amount * delta_time;
    }

    /// Turns by `amount` (yaw, pitch) radians per second over `delta_time`.
    pub fn look(&mut self, amount: Vec2, delta_time: f32) {
        self.look_angle += amount * delta_time;
        self.look_angle.y = self.look_angle.y.clamp(-FRAC_PI_2, FRAC_PI_2);
        self.update_basis();
    }

    fn update_basis(&mut self) {
        let (yaw, pitch) = (self.look_angle.x, self.look_angle.y);
        self.forward = Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos());
        self.right = Vec3::new((yaw - FRAC_PI_2).sin(), 0.0, (yaw - FRAC_PI_2).cos());
        self.up = self.right.cross(self.forward);
    }

    /// Perspective projection for a vertical `fov` in degrees, using the surface's
    /// current aspect ratio and the default clip planes.
    pub fn projection(&self, surface: &dyn Surface, fov: f32) -> Mat4 {
        self.projection_with_planes(surface, fov, DEFAULT_NEAR, DEFAULT_FAR)
    }

    /// Like [`Camera::projection`] with explicit clip planes.
    ///
    /// The surface size is read on every call so resizes take effect immediately.
    pub fn projection_with_planes(&self, surface: &dyn Surface, fov: f32, near: f32, far: f32) -> Mat4 {
        let (width, height) = surface.size();
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh_gl(fov.to_radians(), aspect, near, far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
    }

    pub fn yaw(&self) -> f32 {
        self.look_angle.x
    }

    pub fn pitch(&self) -> f32 {
        self.look_angle.y
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Same as [`Camera::forward`].
    pub fn look_direction(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }
}
