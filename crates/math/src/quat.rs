use core::ops;
use core::fmt;
use std::f32::consts::FRAC_PI_2;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::vec::{Vec3, Vec4};
use crate::mat::{Mat3, Mat4};

// Above this dot product slerp falls back to normalized lerp, sin(theta)
// being too close to zero to divide by.
const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

// Below this sin(angle / 2) the rotation axis is numerically meaningless.
const AXIS_EPSILON: f32 = 1e-3;

/// Rotation quaternion, `w` is the scalar part.
///
/// Non-unit values are fine as intermediate results, the conversions to
/// matrices, axis-angle and Euler angles normalize first.
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub fn identity() -> Self {
        Quat::IDENTITY
    }

    #[inline]
    pub fn re(&self) -> f32 {
        self.w
    }

    #[inline]
    pub fn im(&self) -> Vec3 {
        Vec3 { x: self.x, y: self.y, z: self.z }
    }

    pub fn from_vec4(v: Vec4) -> Self {
        Self { x: v.x, y: v.y, z: v.z, w: v.w }
    }

    #[inline]
    pub fn to_slice(self) -> [f32; 4] {
        bytemuck::cast(self)
    }

    /// Rotation of `angle` radians around `axis`. The axis does not need to
    /// be normalized.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalized();
        let (s, c) = (angle * 0.5).sin_cos();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }

    /// Builds a rotation from yaw, pitch and roll in radians. This is the
    /// exact inverse of [`Quat::to_euler`] away from gimbal lock.
    pub fn from_euler(yaw: f32, pitch: f32, roll: f32) -> Self {
        let (sy, cy) = (yaw * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sr, cr) = (roll * 0.5).sin_cos();

        Self {
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
            w: cr * cp * cy + sr * sp * sy,
        }
    }

    /// Extracts the rotation from the upper-left block of `m`.
    ///
    /// The branch is picked on the largest of the trace and the diagonal so
    /// the divisor never approaches zero, which matters for rotations close
    /// to 180 degrees.
    pub fn from_mat4(m: &Mat4) -> Self {
        let m00 = m.get(0, 0);
        let m11 = m.get(1, 1);
        let m22 = m.get(2, 2);
        let trace = m00 + m11 + m22;

        if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0; // 4w
            Self {
                x: (m.get(2, 1) - m.get(1, 2)) / s,
                y: (m.get(0, 2) - m.get(2, 0)) / s,
                z: (m.get(1, 0) - m.get(0, 1)) / s,
                w: 0.25 * s,
            }
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0; // 4x
            Self {
                x: 0.25 * s,
                y: (m.get(0, 1) + m.get(1, 0)) / s,
                z: (m.get(0, 2) + m.get(2, 0)) / s,
                w: (m.get(2, 1) - m.get(1, 2)) / s,
            }
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0; // 4y
            Self {
                x: (m.get(0, 1) + m.get(1, 0)) / s,
                y: 0.25 * s,
                z: (m.get(1, 2) + m.get(2, 1)) / s,
                w: (m.get(0, 2) - m.get(2, 0)) / s,
            }
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0; // 4z
            Self {
                x: (m.get(0, 2) + m.get(2, 0)) / s,
                y: (m.get(1, 2) + m.get(2, 1)) / s,
                z: 0.25 * s,
                w: (m.get(1, 0) - m.get(0, 1)) / s,
            }
        }
    }

    #[inline]
    pub fn conj(self) -> Self {
        Quat {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    #[inline]
    pub fn dot(self, b: Quat) -> f32 {
        self.x * b.x + self.y * b.y + self.z * b.z + self.w * b.w
    }

    #[inline]
    pub fn norm2(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn norm(self) -> f32 {
        self.norm2().sqrt()
    }

    /// Unit quaternion, or the identity for a zero quaternion.
    #[inline]
    pub fn normalized(self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            return Quat::IDENTITY;
        }
        (1.0 / n) * self
    }

    /// Multiplicative inverse, or the identity for a zero quaternion.
    pub fn inverse(self) -> Self {
        let n2 = self.norm2();
        if n2 == 0.0 {
            return Quat::IDENTITY;
        }
        (1.0 / n2) * self.conj()
    }

    /// Rotates `v` as `q * (v, 0) * conj(q)`. Expects a unit quaternion.
    #[inline]
    pub fn rotate_vec3(self, v: Vec3) -> Vec3 {
        let p = Quat { x: v.x, y: v.y, z: v.z, w: 0.0 };
        (self * p * self.conj()).im()
    }

    #[inline]
    pub fn to_mat3(self) -> Mat3 {
        self.to_mat4().to_mat3()
    }

    /// Rotation matrix, normalizing first.
    pub fn to_mat4(self) -> Mat4 {
        let q = self.normalized();
        let x = q.x;
        let y = q.y;
        let z = q.z;
        let w = q.w;

        let xy = x * y;
        let xz = x * z;
        let xw = x * w;
        let yz = y * z;
        let yw = y * w;
        let zw = z * w;
        let x_squared = x * x;
        let y_squared = y * y;
        let z_squared = z * z;

        let mut m = Mat4::identity();
        m.e[0][0] = 1. - 2. * (y_squared + z_squared);
        m.e[1][0] = 2. * (xy - zw);
        m.e[2][0] = 2. * (xz + yw);

        m.e[0][1] = 2. * (xy + zw);
        m.e[1][1] = 1. - 2. * (x_squared + z_squared);
        m.e[2][1] = 2. * (yz - xw);

        m.e[0][2] = 2. * (xz - yw);
        m.e[1][2] = 2. * (yz + xw);
        m.e[2][2] = 1. - 2. * (x_squared + y_squared);

        m
    }

    /// Axis and angle in radians. Rotations too small to carry an axis
    /// report the X axis.
    pub fn to_axis_angle(self) -> (Vec3, f32) {
        let q = self.normalized();
        let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
        let s = q.im().length();

        if s < AXIS_EPSILON {
            return (Vec3::new(1.0, 0.0, 0.0), angle);
        }
        (q.im() / s, angle)
    }

    /// Returns `(yaw, pitch, roll)` in radians. At gimbal lock the pitch is
    /// pinned to +-90 degrees.
    pub fn to_euler(self) -> (f32, f32, f32) {
        let q = self.normalized();
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);

        let sinr_cosp = 2.0 * (w * x + y * z);
        let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
        let roll = sinr_cosp.atan2(cosr_cosp);

        let sinp = 2.0 * (w * y - z * x);
        let pitch = if sinp.abs() >= 1.0 {
            FRAC_PI_2.copysign(sinp)
        } else {
            sinp.asin()
        };

        let siny_cosp = 2.0 * (w * z + x * y);
        let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
        let yaw = siny_cosp.atan2(cosy_cosp);

        (yaw, pitch, roll)
    }

    /// Spherical interpolation along the shortest arc.
    pub fn slerp(self, other: Quat, t: f32) -> Quat {
        let q1 = self.normalized();
        let mut q2 = other.normalized();

        let mut dot = q1.dot(q2);
        if dot < 0.0 {
            q2 = -q2;
            dot = -dot;
        }

        if dot > SLERP_LINEAR_THRESHOLD {
            return (q1 + (q2 - q1) * t).normalized();
        }

        let theta = dot.acos() * t;
        let ortho = (q2 - q1 * dot).normalized();
        let (s, c) = theta.sin_cos();

        q1 * c + ortho * s
    }

    /// Linear interpolation followed by normalization.
    pub fn lerp(self, other: Quat, t: f32) -> Quat {
        (self + (other - self) * t).normalized()
    }

    /// Angle in radians of the rotation taking `self` to `other`.
    pub fn angle_to(self, other: Quat) -> f32 {
        let dot = self.normalized().dot(other.normalized()).abs();
        2.0 * dot.min(1.0).acos()
    }
}

impl fmt::Display for Quat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Quat(w: {:.prec$}, x: {:.prec$}, y: {:.prec$}, z: {:.prec$})",
               self.w, self.x, self.y, self.z,
               prec = f.precision().unwrap_or(3))
    }
}

impl ops::Add<Quat> for Quat {
    type Output = Quat;

    #[inline]
    fn add(self, rhs: Quat) -> Quat {
        Quat::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl ops::Sub<Quat> for Quat {
    type Output = Quat;

    #[inline]
    fn sub(self, rhs: Quat) -> Quat {
        Quat::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

impl ops::Neg for Quat {
    type Output = Quat;

    #[inline]
    fn neg(self) -> Quat {
        Quat::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl ops::Mul<f32> for Quat {
    type Output = Quat;

    #[inline]
    fn mul(self, rhs: f32) -> Quat {
        rhs * self
    }
}

impl ops::Mul<Quat> for f32 {
    type Output = Quat;

    #[inline]
    fn mul(self, rhs: Quat) -> Quat {
        Quat {
            x: rhs.x * self,
            y: rhs.y * self,
            z: rhs.z * self,
            w: rhs.w * self }
    }
}

/// Hamilton product. `a * b` rotates by `b` first, then by `a`.
impl ops::Mul<Quat> for Quat {
    type Output = Quat;

    #[inline]
    fn mul(self, rhs: Quat) -> Quat {
        let a = self.im();
        let b = rhs.im();

        let w = self.w * rhs.w - a.dot(b);
        let v = self.w * b + rhs.w * a + a.cross(b);
        Quat {
            x: v.x,
            y: v.y,
            z: v.z,
            w: w
        }
    }
}

impl ops::Mul<Vec3> for Quat {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.rotate_vec3(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    fn assert_vec_eq(a: Vec3, b: Vec3, epsilon: f32) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = epsilon);
        assert_abs_diff_eq!(a.y, b.y, epsilon = epsilon);
        assert_abs_diff_eq!(a.z, b.z, epsilon = epsilon);
    }

    fn assert_same_rotation(a: Quat, b: Quat) {
        assert_abs_diff_eq!(a.normalized().dot(b.normalized()).abs(), 1.0, epsilon = 1e-5);
    }

    fn samples() -> Vec<Quat> {
        vec![
            Quat::IDENTITY,
            Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.5),
            Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5), 2.1),
            Quat::from_axis_angle(Vec3::new(-3.0, 0.2, 1.0), PI - 1e-3),
            Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), PI),
            Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), PI),
            Quat::from_euler(0.4, -0.3, 1.2),
        ]
    }

    #[test]
    fn identity_does_nothing() {
        let v = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(Quat::identity().rotate_vec3(v), v);
        assert_eq!(Quat::IDENTITY.to_mat4(), Mat4::identity());
    }

    #[test]
    fn normalized_zero_is_identity() {
        assert_eq!(Quat::new(0.0, 0.0, 0.0, 0.0).normalized(), Quat::IDENTITY);
        assert_abs_diff_eq!(Quat::new(1.0, 2.0, 3.0, 4.0).normalized().norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn rotate_then_conjugate_restores_vector() {
        let v = Vec3::new(3.0, -1.5, 7.0);
        for q in samples() {
            let back = q.conj().rotate_vec3(q.rotate_vec3(v));
            assert_vec_eq(back, v, 1e-4);
        }
    }

    #[test]
    fn rotation_matches_matrix() {
        let v = Vec3::new(0.5, 2.0, -1.0);
        for q in samples() {
            assert_vec_eq(q * v, q.to_mat4().transform_vector(v), 1e-5);
        }
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), PI / 2.0);
        assert_vec_eq(q * Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), 1e-6);
    }

    #[test]
    fn product_applies_right_operand_first() {
        let about_z = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), PI / 2.0);
        let about_x = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), PI / 2.0);
        let v = Vec3::new(1.0, 0.0, 0.0);

        // z first: x -> y, then x: y -> z
        let composed = about_x * about_z;
        assert_vec_eq(composed * v, about_x * (about_z * v), 1e-6);
        assert_vec_eq(composed * v, Vec3::new(0.0, 0.0, 1.0), 1e-6);
    }

    #[test]
    fn axis_angle_round_trip() {
        let axes = [
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-2.0, 0.5, 3.0),
        ];
        for axis in axes {
            for angle in [0.05, 0.3, 1.0, 2.0, 3.0] {
                let (out_axis, out_angle) = Quat::from_axis_angle(axis, angle).to_axis_angle();
                assert_abs_diff_eq!(out_angle, angle, epsilon = 1e-4);
                assert_vec_eq(out_axis, axis.normalized(), 1e-4);
            }
        }
    }

    #[test]
    fn axis_angle_of_identity() {
        let (axis, angle) = Quat::IDENTITY.to_axis_angle();
        assert_eq!(angle, 0.0);
        assert_eq!(axis, Vec3::new(1.0, 0.0, 0.0));

        // slightly over one from rounding must not produce NaN
        let (_, angle) = Quat::new(0.0, 0.0, 0.0, 1.0000001).to_axis_angle();
        assert!(angle.is_finite());
    }

    #[test]
    fn matrix_round_trip() {
        for q in samples() {
            assert_same_rotation(Quat::from_mat4(&q.to_mat4()), q);
        }
    }

    #[test]
    fn euler_round_trip() {
        let (yaw, pitch, roll) = (0.4, -0.3, 1.2);
        let (y, p, r) = Quat::from_euler(yaw, pitch, roll).to_euler();
        assert_abs_diff_eq!(y, yaw, epsilon = 1e-5);
        assert_abs_diff_eq!(p, pitch, epsilon = 1e-5);
        assert_abs_diff_eq!(r, roll, epsilon = 1e-5);
    }

    #[test]
    fn euler_yaw_only() {
        let q = Quat::from_euler(0.8, 0.0, 0.0);
        assert_same_rotation(q, Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.8));
    }

    #[test]
    fn euler_gimbal_lock_pins_pitch() {
        let s = 0.5f32.sqrt();
        let (yaw, pitch, roll) = Quat::new(0.0, s, 0.0, s).to_euler();
        assert_abs_diff_eq!(pitch, FRAC_PI_2, epsilon = 1e-3);
        assert!(yaw.is_finite() && roll.is_finite());

        let (_, pitch, _) = Quat::new(0.0, -s, 0.0, s).to_euler();
        assert_abs_diff_eq!(pitch, -FRAC_PI_2, epsilon = 1e-3);
    }

    #[test]
    fn slerp_with_itself_is_constant() {
        for q in samples() {
            for t in [0.0, 0.25, 0.5, 1.0] {
                let s = q.slerp(q, t);
                assert_abs_diff_eq!(s.x, q.x, epsilon = 1e-6);
                assert_abs_diff_eq!(s.y, q.y, epsilon = 1e-6);
                assert_abs_diff_eq!(s.z, q.z, epsilon = 1e-6);
                assert_abs_diff_eq!(s.w, q.w, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn slerp_hits_endpoints_and_midpoint() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 1.2);
        assert_same_rotation(a.slerp(b, 0.0), a);
        assert_same_rotation(a.slerp(b, 1.0), b);
        let mid = a.slerp(b, 0.5);
        assert_abs_diff_eq!(a.angle_to(mid), 0.6, epsilon = 1e-4);
        assert_abs_diff_eq!(mid.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn slerp_takes_shortest_path() {
        let a = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.2);
        let b = -Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.6);
        let mid = a.slerp(b, 0.5);
        let (_, angle) = mid.to_axis_angle();
        assert_abs_diff_eq!(angle, 0.4, epsilon = 1e-4);
    }

    #[test]
    fn lerp_is_normalized() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 1.0);
        assert_abs_diff_eq!(a.lerp(b, 0.3).norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn angle_to_ignores_sign() {
        let a = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.3);
        let b = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 1.0);
        assert_abs_diff_eq!(a.angle_to(b), 0.7, epsilon = 1e-4);
        assert_abs_diff_eq!(a.angle_to(-b), 0.7, epsilon = 1e-4);
        assert_abs_diff_eq!(a.angle_to(a), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn inverse_undoes_rotation() {
        let q = 2.0 * Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 0.9);
        let p = q * q.inverse();
        assert_same_rotation(p, Quat::IDENTITY);
        assert_eq!(Quat::new(0.0, 0.0, 0.0, 0.0).inverse(), Quat::IDENTITY);
    }
}
