//! # Laser Core
//!
//! Common types and conventions for anchoring a laser pointer detection in world space.
//! All the crates in this workspace that deal with pixels, camera rays or poses depend on
//! this crate, so that every coordinate convention is written down exactly once.
//!
//! ## Conventions
//!
//! * Pixels have their origin at the top-left corner of the frame, X right and Y down.
//! * Raw matrices arrive as 16 `f32` values in row-major order (`m00, m01, m02, m03, m10, ...`).
//!   Internally everything is `f64` and uses column vectors, so a matrix `M` transforms
//!   a point `p` as `M * p`.
//! * A [`CameraToWorld`] pose maps camera space into world space. Its columns are the camera's
//!   right, up and backward axes and its position. It may contain a handedness flip,
//!   which is why it is stored as a full matrix rather than an isometry.
//! * A [`CameraRay`] carries the convention of the camera space it was expressed in,
//!   because the two unprojection models produce rays in different frames:
//!
//! ```text
//!   Optical (unit depth)         Pose (projection matrix)
//!
//!        z (forward)                  y (up)
//!       /                             |
//!      o---- x (right)                o---- x (right)
//!      |                             /
//!      y (down)                     z (backward, forward is z = 1 / P[2][2] < 0)
//! ```
//!
//! [`CameraToWorld::world_ray`] applies the rotation matching each convention.

mod camera;
pub mod convert;
mod error;
mod keypoint;
mod pose;

pub use camera::*;
pub use error::*;
pub use keypoint::*;
pub use nalgebra;
pub use pose::*;
