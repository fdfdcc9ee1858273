use crate::{convert, CameraConvention, CameraRay, GeometryError};
use derive_more::{AsRef, Into};
use nalgebra::{Matrix4, Point3, Unit, UnitQuaternion, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The pose of a camera at capture time, mapping camera space into world space.
///
/// This wraps a full homogeneous matrix rather than an isometry because poses delivered by the
/// headset have their Z row negated to convert into a left-handed world, which makes the
/// rotation block improper. The matrix is guaranteed to be finite and invertible.
#[derive(Debug, Clone, Copy, PartialEq, AsRef, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToWorld(Matrix4<f64>);

impl CameraToWorld {
    /// Creates a pose with no change in position or orientation.
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Checks that the matrix can be used as a pose.
    pub fn from_matrix(matrix: Matrix4<f64>) -> Result<Self, GeometryError> {
        if !matrix.iter().all(|v| v.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        if matrix.try_inverse().is_none() {
            return Err(GeometryError::NotInvertible);
        }
        Ok(Self(matrix))
    }

    /// Creates the pose from 16 row-major floats.
    ///
    /// ```
    /// use laser_core::CameraToWorld;
    /// use laser_core::nalgebra::Point3;
    /// let pose = CameraToWorld::from_row_major(&[
    ///     1.0, 0.0, 0.0, 0.5,
    ///     0.0, 1.0, 0.0, 1.5,
    ///     0.0, 0.0, 1.0, -2.0,
    ///     0.0, 0.0, 0.0, 1.0,
    /// ]).unwrap();
    /// assert_eq!(pose.origin(), Point3::new(0.5, 1.5, -2.0));
    /// ```
    pub fn from_row_major(values: &[f32]) -> Result<Self, GeometryError> {
        Self::from_matrix(convert::matrix_from_row_major(values)?)
    }

    /// Retrieve the homogeneous matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// The world-to-camera matrix.
    pub fn inverse(&self) -> Matrix4<f64> {
        // Invertibility is checked on construction.
        self.0.try_inverse().unwrap_or_else(Matrix4::identity)
    }

    /// The optical center of the camera in world space (the translation column).
    pub fn origin(&self) -> Point3<f64> {
        Point3::from(self.0.fixed_slice::<3, 1>(0, 3).into_owned())
    }

    /// The camera's local +Z axis expressed in world space.
    ///
    /// Since the camera looks down its negative Z axis, this is the normal of the image plane
    /// pointing back towards the viewer.
    pub fn forward_normal(&self) -> Vector3<f64> {
        self.rotate(&Vector3::z())
    }

    /// A rotation whose forward (+Z) axis points where the camera looks and whose up (+Y) axis
    /// follows the camera's up column.
    ///
    /// This is the rotation that maps optical camera space into world space, and it is also what
    /// a quad facing the camera would be oriented with.
    pub fn facing_rotation(&self) -> UnitQuaternion<f64> {
        let look = -self.0.fixed_slice::<3, 1>(0, 2).into_owned();
        let up = self.0.fixed_slice::<3, 1>(0, 1).into_owned();
        UnitQuaternion::face_towards(&look, &up)
    }

    /// Rotates a direction by the upper-left 3x3 block, i.e. the dot product of the direction
    /// with each of the first three rows.
    pub fn rotate(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        self.0.fixed_slice::<3, 3>(0, 0) * direction
    }

    /// Turns a camera-space ray into a normalized world-space ray starting at the optical center.
    ///
    /// ```
    /// use laser_core::{CameraRay, CameraToWorld};
    /// use laser_core::nalgebra::Vector3;
    /// let pose = CameraToWorld::identity();
    /// let ray = pose.world_ray(CameraRay::pose(Vector3::new(0.0, 0.0, -2.0))).unwrap();
    /// assert_eq!(ray.direction.into_inner(), Vector3::new(0.0, 0.0, -1.0));
    /// ```
    pub fn world_ray(&self, ray: CameraRay) -> Result<WorldRay, GeometryError> {
        let direction = match ray.convention {
            CameraConvention::Pose => self.rotate(&ray.direction),
            CameraConvention::Optical => self.facing_rotation() * ray.direction,
        };
        if !direction.iter().all(|v| v.is_finite()) {
            return Err(GeometryError::DegenerateDirection);
        }
        let direction =
            Unit::try_new(direction, f64::EPSILON).ok_or(GeometryError::DegenerateDirection)?;
        Ok(WorldRay {
            origin: self.origin(),
            direction,
        })
    }
}

impl Default for CameraToWorld {
    fn default() -> Self {
        Self::identity()
    }
}

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldRay {
    pub origin: Point3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl WorldRay {
    /// The point `distance` units along the ray.
    pub fn point_at(&self, distance: f64) -> Point3<f64> {
        self.origin + self.direction.into_inner() * distance
    }
}
