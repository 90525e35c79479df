use core::ops;
use core::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

macro_rules! vec_op_impl {
    ($trait: ident, $func: ident, $v: ident, $($e: ident),*) => {
        impl ops::$trait<$v> for $v {
            type Output = $v;

            #[inline]
            fn $func(self, rhs: $v) -> $v {
                $v { $( $e: self.$e.$func(rhs.$e), )* }
            }
        }
    }
}

macro_rules! vec_assign_op_impl {
    ($trait: ident, $func: ident, $v: ident, $($e: ident),*) => {
        impl ops::$trait<$v> for $v {
            #[inline]
            fn $func(&mut self, rhs: $v) {
                $( self.$e.$func(rhs.$e); )*
            }
        }
    }
}

macro_rules! scalar_op_impl {
    ($trait: ident, $func: ident, $v: ident, $t: ident, $($e: ident),*) => {

        impl ops::$trait<$t> for $v {
            type Output = $v;

            #[inline]
            fn $func(self, rhs: $t) -> $v {
                $v { $( $e: self.$e.$func(rhs), )* }
            }
        }

        impl ops::$trait<$v> for $t {
            type Output = $v;

            #[inline]
            fn $func(self, rhs: $v) -> $v {
                $v { $( $e: self.$func(rhs.$e), )* }
            }
        }
    }
}

macro_rules! scalar_assign_op_impl {
    ($trait: ident, $func: ident, $v: ident, $t: ident, $($e: ident),*) => {

        impl ops::$trait<$t> for $v {
            #[inline]
            fn $func(&mut self, rhs: $t) {
                $( self.$e.$func(rhs); )*
            }
        }
    }
}

macro_rules! vec_float_utils_impl {
    ($v: ident, $t: ident, $($e: ident),*) => {
        impl $v {
            #[inline]
            pub fn dot(self, b: $v) -> $t {
                // Adding negative zero (-0.0) is a nop in IEEE 754 floating
                // point, while adding positive zero can change the sign of
                // negative zero, thus llvm only optimizes out (-0.0).
                $( self.$e * b.$e + )* (-0.0)
            }

            #[inline]
            pub fn length2(self) -> $t {
                $v::dot(self, self)
            }

            #[inline]
            pub fn length(self) -> $t {
                $v::length2(self).sqrt()
            }

            /// Unit vector in the same direction. The zero vector normalizes
            /// to itself instead of producing NaNs.
            ///
            /// Components are first divided by the largest magnitude so
            /// tiny vectors don't underflow to zero in `length2`.
            #[inline]
            pub fn normalized(self) -> $v {
                let largest = (0.0 as $t) $( .max(self.$e.abs()) )*;
                if largest == 0.0 {
                    return $v::ZERO;
                }
                let scaled = self / largest;
                scaled * (1.0 / $v::length(scaled))
            }

            #[inline]
            pub fn distance(self, b: $v) -> $t {
                (b - self).length()
            }

            /// Interpolates from `self` (t = 0) to `b` (t = 1).
            #[inline]
            pub fn lerp(self, b: $v, t: $t) -> $v {
                $v { $( $e: self.$e + (b.$e - self.$e) * t, )* }
            }
        }

        impl std::ops::Neg for $v {
            type Output = $v;

            fn neg(self) -> $v {
                $v { $( $e: self.$e.neg(), )* }
            }
        }
    }
}

macro_rules! vec_impl {
    ($v: ident, $t: ident, $n: expr, $($e: ident),*) => {

        #[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
        #[repr(C)]
        pub struct $v {
            $( pub $e : $t, )*
        }

        impl $v {
            pub const ZERO: $v = $v { $( $e: 0 as $t, )* };

            #[inline]
            pub fn new($( $e: $t, )*) -> $v {
                $v { $( $e : $e, )* }
            }

            #[inline]
            pub fn from_scalar(a: $t) -> $v {
                $v { $( $e : a, )* }
            }

            #[inline]
            pub fn from_slice(a: &[$t; $n]) -> $v {
                bytemuck::cast(*a)
            }

            #[inline]
            pub fn clamp(a: $v, min: $v, max: $v) -> $v {
                $v { $( $e: a.$e.clamp(min.$e, max.$e),)* }
            }

            #[inline]
            pub fn min(a: $v, b: $v) -> $v {
                $v { $( $e: a.$e.min(b.$e),)* }
            }

            #[inline]
            pub fn max(a: $v, b: $v) -> $v {
                $v { $( $e: a.$e.max(b.$e),)* }
            }

            #[inline]
            pub fn to_slice(self) -> [$t; $n] {
                bytemuck::cast(self)
            }
        }

        impl fmt::Display for $v {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", stringify!($v),
                        vec![$(
                           format!("{:.prec$}", self.$e, prec = f.precision().unwrap_or(3)),
                        )*].join(", "))
            }
        }

        vec_op_impl!(Add, add, $v, $($e),*);
        vec_op_impl!(Sub, sub, $v, $($e),*);
        vec_op_impl!(Mul, mul, $v, $($e),*);
        vec_op_impl!(Div, div, $v, $($e),*);

        vec_assign_op_impl!(AddAssign, add_assign, $v, $($e),*);
        vec_assign_op_impl!(SubAssign, sub_assign, $v, $($e),*);
        vec_assign_op_impl!(MulAssign, mul_assign, $v, $($e),*);
        vec_assign_op_impl!(DivAssign, div_assign, $v, $($e),*);

        scalar_op_impl!(Add, add, $v, $t, $($e),*);
        scalar_op_impl!(Sub, sub, $v, $t, $($e),*);
        scalar_op_impl!(Mul, mul, $v, $t, $($e),*);
        scalar_op_impl!(Div, div, $v, $t, $($e),*);

        scalar_assign_op_impl!(AddAssign, add_assign, $v, $t, $($e),*);
        scalar_assign_op_impl!(SubAssign, sub_assign, $v, $t, $($e),*);
        scalar_assign_op_impl!(MulAssign, mul_assign, $v, $t, $($e),*);
        scalar_assign_op_impl!(DivAssign, div_assign, $v, $t, $($e),*);
    }
}

// Pixel coordinates coming from the input layer.
vec_impl!(Vec2i, i32, 2, x, y);

vec_impl!(Vec2, f32, 2, x, y);
vec_impl!(Vec3, f32, 3, x, y, z);
vec_impl!(Vec4, f32, 4, x, y, z, w);

vec_float_utils_impl!(Vec2, f32, x, y);
vec_float_utils_impl!(Vec3, f32, x, y, z);
vec_float_utils_impl!(Vec4, f32, x, y, z, w);

impl Vec3 {
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    /// Right-handed cross product.
    #[inline]
    pub fn cross(self, b: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * b.z - self.z * b.y,
            y: self.z * b.x - self.x * b.z,
            z: self.x * b.y - self.y * b.x,
        }
    }

    /// Appends a homogeneous coordinate: 1 for points, 0 for directions.
    #[inline]
    pub fn extend(self, w: f32) -> Vec4 {
        Vec4 { x: self.x, y: self.y, z: self.z, w }
    }
}

impl Vec4 {
    /// Drops `w`. Use for directions.
    #[inline]
    pub fn xyz(self) -> Vec3 {
        Vec3 { x: self.x, y: self.y, z: self.z }
    }

    /// Divides by `w`. A zero `w` leaves the components untouched.
    #[inline]
    pub fn homogenize(self) -> Vec3 {
        if self.w == 0.0 {
            return self.xyz();
        }
        self.xyz() / self.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalized_has_unit_length() {
        let samples = [
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(-1e-3, 2e-3, 5e-4),
            Vec3::new(120.0, -7.5, 33.0),
        ];
        for v in samples {
            assert_abs_diff_eq!(v.normalized().length(), 1.0, epsilon = 1e-5);
        }
        assert_abs_diff_eq!(Vec2::new(0.0, -9.0).normalized().length(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(Vec4::new(1.0, 1.0, 1.0, 1.0).normalized().length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        assert_eq!(Vec4::ZERO.normalized(), Vec4::ZERO);
    }

    #[test]
    fn normalized_tiny_and_huge_vectors() {
        let n = Vec3::new(1e-23, 0.0, 0.0).normalized();
        assert_eq!(n, Vec3::new(1.0, 0.0, 0.0));

        let n = Vec3::new(3e-30, -4e-30, 0.0).normalized();
        assert_abs_diff_eq!(n.x, 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(n.y, -0.8, epsilon = 1e-6);

        let n = Vec2::new(3e30, 4e30).normalized();
        assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn cross_is_right_handed() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn homogenize_divides_by_w() {
        let p = Vec4::new(2.0, 4.0, 6.0, 2.0);
        assert_eq!(p.homogenize(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.xyz(), Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn homogenize_with_zero_w_skips_division() {
        let d = Vec4::new(2.0, -4.0, 6.0, 0.0);
        let v = d.homogenize();
        assert_eq!(v, Vec3::new(2.0, -4.0, 6.0));
        assert!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
    }

    #[test]
    fn arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, 2.0 * a);
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::new(0.0, 3.0, 4.0).length2(), 25.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(Vec2i::new(3, 4) - Vec2i::new(1, 1), Vec2i::new(2, 3));
    }

    #[test]
    fn slice_round_trip_keeps_component_order() {
        let v = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(v.to_slice(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Vec4::from_slice(&[1.0, 2.0, 3.0, 4.0]), v);
    }

    #[test]
    fn display_uses_precision() {
        assert_eq!(format!("{:.1}", Vec2::new(1.0, 2.26)), "Vec2(1.0, 2.3)");
    }
}
