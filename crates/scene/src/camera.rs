use serde::{Deserialize, Serialize};

use math::{
    vec::Vec3,
    mat::{self, Mat4},
};

/// Closed interval a camera parameter is kept in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min: f32,
    pub max: f32,
}

impl Limits {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Camera circling a target point.
///
/// Yaw turns around the up axis and is left unbounded, pitch and distance
/// are clamped to their limits on every change. The eye position is derived
/// from these on each read and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitCamera {
    target: Vec3,
    up: Vec3,

    distance: f32,
    yaw: f32,
    pitch: f32,

    distance_limits: Limits,
    pitch_limits: Limits,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        OrbitCamera::new(
            Vec3::ZERO,
            Vec3::UP,
            15.0,
            0.0,
            0.3,
            Limits::new(5.0, 50.0),
            Limits::new(-1.5, 1.5),
        )
    }
}

impl OrbitCamera {
    /// Builds a camera, clamping the initial distance and pitch into their
    /// limits.
    pub fn new(target: Vec3, up: Vec3, distance: f32, yaw: f32, pitch: f32,
            distance_limits: Limits, pitch_limits: Limits) -> OrbitCamera {
        Self {
            target,
            up,
            distance: distance_limits.clamp(distance),
            yaw,
            pitch: pitch_limits.clamp(pitch),
            distance_limits,
            pitch_limits,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance_limits(&self) -> Limits {
        self.distance_limits
    }

    pub fn pitch_limits(&self) -> Limits {
        self.pitch_limits
    }

    pub fn orbit_left_right(&mut self, delta: f32) {
        self.yaw += delta;
    }

    pub fn orbit_up_down(&mut self, delta: f32) {
        self.pitch = self.pitch_limits.clamp(self.pitch + delta);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = self.distance_limits.clamp(self.distance + delta);
    }

    /// Eye position on the sphere of radius `distance` around the target.
    pub fn position(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();

        self.target + Vec3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    pub fn view(&self) -> Mat4 {
        mat::rh::look_at(self.position(), self.target, self.up)
    }
}
