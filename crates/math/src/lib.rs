//! Small linear algebra kit for the renderer: 2/3/4 component vectors,
//! column-major 3x3 and 4x4 matrices and rotation quaternions.
//!
//! Conventions: right-handed, radians, column vectors (`M * v`), matrices
//! stored column by column so `Mat4::to_cols_array` can be uploaded as is.

pub mod vec;
pub mod mat;
pub mod quat;

pub use vec::{Vec2, Vec2i, Vec3, Vec4};
pub use mat::{Mat3, Mat4};
pub use quat::Quat;
