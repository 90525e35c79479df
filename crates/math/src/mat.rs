
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::vec::*;

// Pivots smaller than this are treated as zero by `Mat4::inverse`.
const PIVOT_EPSILON: f32 = 1e-12;

// Storage is column-major: `e[col][row]`, so `e` flattened is the layout
// OpenGL style uniform uploads expect.
macro_rules! mat_impl {
    ($m: ident, $t: ident, $v: ident, $n: literal) => {

        #[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
        #[repr(C)]
        pub struct $m {
            pub e: [[$t; $n]; $n],
        }

        impl $m {
            #[inline]
            pub fn zero() -> $m {
                $m::default()
            }

            #[inline]
            pub fn from_columns(v: &[$v; $n]) -> $m {
                let mut m = $m::zero();
                for i in 0..$n {
                    m.e[i] = v[i].to_slice();
                }
                m
            }

            #[inline]
            pub fn identity() -> $m {
                $m::diagonal(1.0)
            }

            #[inline]
            pub fn diagonal(d: $t) -> $m {
                let mut m = $m::zero();
                for i in 0..$n {
                    m.e[i][i] = d;
                }
                m
            }

            #[inline]
            pub fn get(&self, row: usize, col: usize) -> $t {
                self.e[col][row]
            }

            #[inline]
            pub fn set(&mut self, row: usize, col: usize, value: $t) {
                self.e[col][row] = value;
            }

            #[inline]
            pub fn transpose(&self) -> $m {
                let mut m = $m::zero();

                for j in 0..$n {
                    for i in 0..$n {
                        m.e[j][i] = self.e[i][j];
                    }
                }
                m
            }

            #[inline]
            pub fn to_columns(&self) -> [$v; $n] {
                bytemuck::cast(*self)
            }

            #[inline]
            pub fn to_rows(&self) -> [$v; $n] {
                self.transpose().to_columns()
            }
        }

        impl std::ops::Mul<$m> for $m {
            type Output = $m;

            #[inline]
            fn mul(self, rhs: $m) -> $m {
                let mut m = $m::zero();

                let a = self.to_rows();
                let b = rhs.to_columns();

                for j in 0..$n {
                    for i in 0..$n {
                        m.e[j][i] = $v::dot(a[i], b[j]);
                    }
                }
                m
            }
        }

        impl std::ops::Mul<$v> for $m {
            type Output = $v;

            #[inline]
            fn mul(self, rhs: $v) -> $v {
                let mut v = [0.0; $n];

                let a = self.to_rows();

                for i in 0..$n {
                    v[i] = a[i].dot(rhs);
                }
                $v::from_slice(&v)
            }
        }
    }
}

mat_impl!(Mat4, f32, Vec4, 4);
mat_impl!(Mat3, f32, Vec3, 3);

impl Mat3 {
    pub fn determinant(&self) -> f32 {
        let [a, b, c] = self.to_rows();
        a.dot(b.cross(c))
    }

    /// Adjugate divided by the determinant. `None` when the determinant
    /// vanishes.
    pub fn inverse(&self) -> Option<Mat3> {
        let [r0, r1, r2] = self.to_rows();
        let det = r0.dot(r1.cross(r2));
        if det.abs() < PIVOT_EPSILON {
            return None;
        }

        // The cross products of the rows are the columns of the adjugate.
        Some(Mat3::from_columns(&[
            r1.cross(r2) / det,
            r2.cross(r0) / det,
            r0.cross(r1) / det,
        ]))
    }
}

impl Mat4 {
    /// Builds a matrix from 16 floats in column-major order.
    #[inline]
    pub fn from_cols_array(a: &[f32; 16]) -> Self {
        bytemuck::cast(*a)
    }

    /// The 16 cells in column-major order, ready for uniform upload.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(*self)
    }

    /// Right-handed rotation of `angle` radians around `axis`.
    pub fn rotation(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalized();
        let a = axis.x;
        let b = axis.y;
        let c = axis.z;

        let cos_alpha = angle.cos();
        let sin_alpha = angle.sin();

        let k = 1. - cos_alpha;

        let mut m = Mat4::identity();
        m.e[0][0] = a * a * k + cos_alpha;
        m.e[1][1] = b * b * k + cos_alpha;
        m.e[2][2] = c * c * k + cos_alpha;

        m.e[0][1] = a * b * k + c * sin_alpha;
        m.e[0][2] = a * c * k - b * sin_alpha;
        m.e[1][2] = b * c * k + a * sin_alpha;

        m.e[1][0] = a * b * k - c * sin_alpha;
        m.e[2][0] = a * c * k + b * sin_alpha;
        m.e[2][1] = b * c * k - a * sin_alpha;

        m
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();

        let mut m = Mat4::identity();
        m.e[1][1] = c;
        m.e[1][2] = s;
        m.e[2][1] = -s;
        m.e[2][2] = c;

        m
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();

        let mut m = Mat4::identity();
        m.e[0][0] = c;
        m.e[0][2] = -s;
        m.e[2][0] = s;
        m.e[2][2] = c;

        m
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();

        let mut m = Mat4::identity();
        m.e[0][0] = c;
        m.e[0][1] = s;
        m.e[1][0] = -s;
        m.e[1][1] = c;

        m
    }

    pub fn translation(v: Vec3) -> Self {
        let mut m = Mat4::identity();
        m.e[3][0..3].copy_from_slice(&v.to_slice());

        m
    }

    pub fn scale3(v: Vec3) -> Self {
        let vv = v.to_slice();

        let mut m = Mat4::identity();
        for i in 0..3 {
            m.e[i][i] = vv[i];
        }

        m
    }

    /// Uniform scale of the xyz axes; `w` is left untouched.
    pub fn scale_uniform(s: f32) -> Self {
        Mat4::scale3(Vec3::from_scalar(s))
    }

    pub fn get_translation(&self) -> Vec3 {
        Vec3::new(self.e[3][0], self.e[3][1], self.e[3][2])
    }

    pub fn set_translation(&mut self, v: Vec3) {
        self.e[3][0..3].copy_from_slice(&v.to_slice());
    }

    /// Transforms a position: appends w = 1 and divides by the resulting w.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * p.extend(1.0)).homogenize()
    }

    /// Transforms a direction: appends w = 0, so translation is ignored.
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        (*self * v.extend(0.0)).xyz()
    }

    /// Upper-left 3x3 block.
    pub fn to_mat3(&self) -> Mat3 {
        let mut m = Mat3::zero();
        for col in 0..3 {
            m.e[col].copy_from_slice(&self.e[col][0..3]);
        }
        m
    }

    /// Matrix for transforming normals: the inverse transpose of the
    /// upper-left block. `None` when that block is singular. The bottom row
    /// is ignored, so projective matrices work too.
    pub fn normal_matrix(&self) -> Option<Mat3> {
        self.to_mat3().inverse().map(|inv| inv.transpose())
    }

    /// Gauss-Jordan elimination on the augmented matrix `[M | I]` with
    /// partial pivoting. Returns `None` when a pivot vanishes, i.e. the
    /// matrix is singular.
    pub fn inverse(&self) -> Option<Mat4> {
        let mut aug = [[0.0f32; 8]; 4];

        for i in 0..4 {
            for j in 0..4 {
                aug[i][j] = self.get(i, j);
            }
            aug[i][i + 4] = 1.0;
        }

        for i in 0..4 {
            let mut max_row = i;
            for k in (i + 1)..4 {
                if aug[k][i].abs() > aug[max_row][i].abs() {
                    max_row = k;
                }
            }
            aug.swap(i, max_row);

            let pivot = aug[i][i];
            if pivot.abs() < PIVOT_EPSILON {
                return None;
            }

            for j in 0..8 {
                aug[i][j] /= pivot;
            }

            for k in 0..4 {
                if k == i {
                    continue;
                }
                let factor = aug[k][i];
                for j in 0..8 {
                    aug[k][j] -= factor * aug[i][j];
                }
            }
        }

        let mut m = Mat4::zero();
        for i in 0..4 {
            for j in 0..4 {
                m.set(i, j, aug[i][j + 4]);
            }
        }
        Some(m)
    }

    /// Cofactor expansion along the first column.
    pub fn determinant(&self) -> f32 {
        let m = self.to_cols_array();

        m[0] * (m[5] * (m[10] * m[15] - m[11] * m[14])
            - m[6] * (m[9] * m[15] - m[11] * m[13])
            + m[7] * (m[9] * m[14] - m[10] * m[13]))
            - m[1] * (m[4] * (m[10] * m[15] - m[11] * m[14])
                - m[6] * (m[8] * m[15] - m[11] * m[12])
                + m[7] * (m[8] * m[14] - m[10] * m[12]))
            + m[2] * (m[4] * (m[9] * m[15] - m[11] * m[13])
                - m[5] * (m[8] * m[15] - m[11] * m[12])
                + m[7] * (m[8] * m[13] - m[9] * m[12]))
            - m[3] * (m[4] * (m[9] * m[14] - m[10] * m[13])
                - m[5] * (m[8] * m[14] - m[10] * m[12])
                + m[6] * (m[8] * m[13] - m[9] * m[12]))
    }
}


/// Right-handed matrices
pub mod rh {
    use super::Mat4;
    use super::Vec3;

    /// View matrix looking from `eye` towards `target`. The camera looks
    /// down its local -Z axis.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {

        let f = (target - eye).normalized();
        let r = f.cross(up).normalized();
        let u = r.cross(f);

        let mut m = Mat4::zero();
        m.e[0][0] = r.x;
        m.e[1][0] = r.y;
        m.e[2][0] = r.z;

        m.e[0][1] = u.x;
        m.e[1][1] = u.y;
        m.e[2][1] = u.z;

        m.e[0][2] = -f.x;
        m.e[1][2] = -f.y;
        m.e[2][2] = -f.z;

        m.e[3][0] = -Vec3::dot(r, eye);
        m.e[3][1] = -Vec3::dot(u, eye);
        m.e[3][2] = Vec3::dot(f, eye);
        m.e[3][3] = 1.0;

        m
    }

    // Negative one to one z
    pub mod no {
        use super::super::Mat4;

        pub fn orthographic(left: f32, right: f32, bottom: f32,
                            top: f32, near: f32, far: f32) -> Mat4 {
            let mut m = Mat4::identity();
            m.e[0][0] = 2.0 / (right - left);
            m.e[1][1] = 2.0 / (top - bottom);
            m.e[2][2] = -2.0 / (far - near);
            m.e[3][0] = - (right + left) / (right - left);
            m.e[3][1] = - (top + bottom) / (top - bottom);
            m.e[3][2] = - (far + near) / (far - near);

            m
        }

        pub fn perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32)
            -> Mat4 {

            let mut m = Mat4::zero();

            let f = 1.0 / (fov_y * 0.5).tan();

            m.e[0][0] = f / aspect_ratio;
            m.e[1][1] = f;
            m.e[2][2] = (far + near) / (near - far);
            m.e[2][3] = -1.0;
            m.e[3][2] = (2.0 * far * near) / (near - far);

            m
        }
    }
}
