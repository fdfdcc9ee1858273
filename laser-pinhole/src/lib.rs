//! This crate plugs into `laser-core` and provides the two camera models a headset frame can
//! carry. Either model converts the pixel where the laser pointer was found into a ray out of the
//! optical center of the camera, expressed in camera space.
//!
//! * [`Intrinsics`] unproject onto the virtual image plane at unit depth, producing rays in the
//!   [`CameraConvention::Optical`](laser_core::CameraConvention::Optical) frame.
//! * [`ProjectionCamera`] decomposes a rendering projection matrix and produces rays in the
//!   frame of the pose matrix itself.

mod projection;

pub use projection::*;

use laser_core::nalgebra::{Matrix3, Point2, Vector2, Vector3};
use laser_core::{CameraModel, CameraRay, ImagePoint, KeyPoint};
use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Reasons a camera model cannot unproject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("focal length is zero")]
    ZeroFocalLength,
    #[error("projection matrix has a zero perspective term")]
    ZeroNormFactor,
    #[error("image resolution is zero")]
    ZeroResolution,
    #[error("camera parameters are not finite")]
    NonFinite,
}

/// This contains intrinsic camera parameters as per
/// [this Wikipedia page](https://en.wikipedia.org/wiki/Camera_resectioning#Intrinsic_parameters).
///
/// Unprojection produces the point on the virtual image plane one unit in front of the camera.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    pub focals: Vector2<f64>,
    pub principal_point: Point2<f64>,
    pub skew: f64,
}

impl CameraIntrinsics {
    /// Creates camera intrinsics that would create an identity intrinsic matrix.
    /// This would imply that the pixel positions have an origin at `0,0`,
    /// the pixel distance unit is the focal length, pixels are square,
    /// and there is no skew.
    pub fn identity() -> Self {
        Self {
            focals: Vector2::new(1.0, 1.0),
            skew: 0.0,
            principal_point: Point2::new(0.0, 0.0),
        }
    }

    pub fn focals(self, focals: Vector2<f64>) -> Self {
        Self { focals, ..self }
    }

    pub fn focal(self, focal: f64) -> Self {
        Self {
            focals: Vector2::new(focal, focal),
            ..self
        }
    }

    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    pub fn skew(self, skew: f64) -> Self {
        Self { skew, ..self }
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focals.x,  self.skew,      self.principal_point.x,
            0.0,            self.focals.y,  self.principal_point.y,
            0.0,            0.0,            1.0,
        )
    }

    /// Checks the parameters can be used to unproject without producing infinities.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        let values = [
            self.focals.x,
            self.focals.y,
            self.principal_point.x,
            self.principal_point.y,
            self.skew,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            return Err(ProjectionError::NonFinite);
        }
        if self.focals.x == 0.0 || self.focals.y == 0.0 {
            return Err(ProjectionError::ZeroFocalLength);
        }
        Ok(())
    }

    /// Converts a point on the unit-depth plane back into pixel coordinates.
    ///
    /// ```
    /// use laser_core::{CameraModel, KeyPoint};
    /// use laser_core::nalgebra::{Point2, Vector2};
    /// use laser_pinhole::CameraIntrinsics;
    /// let intrinsics = CameraIntrinsics {
    ///     focals: Vector2::new(800.0, 900.0),
    ///     principal_point: Point2::new(500.0, 600.0),
    ///     skew: 1.7,
    /// };
    /// let kp = KeyPoint(Point2::new(471.0, 322.0));
    /// let ray = intrinsics.unproject(kp);
    /// let back = intrinsics.project(ray.direction.xy());
    /// assert!((kp.0 - back.0).norm() < 1e-6);
    /// ```
    pub fn project(&self, plane: Vector2<f64>) -> KeyPoint {
        let y = plane.y * self.focals.y;
        let x = plane.x * self.focals.x + self.skew * plane.y;
        KeyPoint(Point2::new(x, y) + self.principal_point.coords)
    }

    fn unit_plane<P: ImagePoint>(&self, point: P) -> Vector2<f64> {
        let centered = point.image_point() - self.principal_point;
        let y = centered.y / self.focals.y;
        let x = (centered.x - self.skew * y) / self.focals.x;
        Vector2::new(x, y)
    }
}

impl CameraModel for CameraIntrinsics {
    /// Takes in a point from an image in pixel coordinates and
    /// converts it to a ray through the unit-depth plane.
    ///
    /// ```
    /// use laser_core::{CameraModel, CameraConvention, KeyPoint};
    /// use laser_core::nalgebra::{Point2, Vector2};
    /// use laser_pinhole::CameraIntrinsics;
    /// let intrinsics = CameraIntrinsics::identity()
    ///     .focals(Vector2::new(1000.0, 1000.0))
    ///     .principal_point(Point2::new(640.0, 360.0));
    /// let ray = intrinsics.unproject(KeyPoint(Point2::new(740.0, 310.0)));
    /// assert_eq!(ray.convention, CameraConvention::Optical);
    /// assert_eq!(ray.direction.z, 1.0);
    /// assert!((ray.direction.x - 0.1).abs() < 1e-12);
    /// assert!((ray.direction.y + 0.05).abs() < 1e-12);
    /// ```
    fn unproject<P>(&self, point: P) -> CameraRay
    where
        P: ImagePoint,
    {
        CameraRay::optical(self.unit_plane(point).push(1.0))
    }
}

/// Intrinsic parameters with one radial distortion coefficient (K1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsicsK1Distortion {
    pub simple_intrinsics: CameraIntrinsics,
    pub k1: f64,
}

impl CameraIntrinsicsK1Distortion {
    /// Creates the camera intrinsics using simple intrinsics with no distortion and a K1 distortion coefficient.
    pub fn new(simple_intrinsics: CameraIntrinsics, k1: f64) -> Self {
        Self {
            simple_intrinsics,
            k1,
        }
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !self.k1.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        self.simple_intrinsics.validate()
    }
}

impl CameraModel for CameraIntrinsicsK1Distortion {
    /// ```
    /// use laser_core::{CameraModel, KeyPoint};
    /// use laser_core::nalgebra::{Point2, Vector2};
    /// use laser_pinhole::{CameraIntrinsics, CameraIntrinsicsK1Distortion};
    /// let simple = CameraIntrinsics::identity()
    ///     .focal(800.0)
    ///     .principal_point(Point2::new(500.0, 600.0));
    /// let k1 = -0.164624;
    /// let intrinsics = CameraIntrinsicsK1Distortion::new(simple, k1);
    /// let kp = KeyPoint(Point2::new(471.0, 322.0));
    /// let distorted = simple.unproject(kp).direction.xy();
    /// let undistorted = intrinsics.unproject(kp).direction.xy();
    /// let expected = distorted / (1.0 + k1 * distorted.norm_squared());
    /// assert!((undistorted - expected).norm() < 1e-12);
    /// ```
    fn unproject<P>(&self, point: P) -> CameraRay
    where
        P: ImagePoint,
    {
        let distorted = self.simple_intrinsics.unit_plane(point);
        let r2 = distorted.norm_squared();
        let undistorted = distorted / (1.0 + self.k1 * r2);
        CameraRay::optical(Vector3::new(undistorted.x, undistorted.y, 1.0))
    }
}

/// The per-frame intrinsic model, when the capture pipeline provides one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum Intrinsics {
    Pinhole(CameraIntrinsics),
    K1(CameraIntrinsicsK1Distortion),
}

impl Intrinsics {
    pub fn validate(&self) -> Result<(), ProjectionError> {
        match self {
            Intrinsics::Pinhole(intrinsics) => intrinsics.validate(),
            Intrinsics::K1(intrinsics) => intrinsics.validate(),
        }
    }
}

impl From<CameraIntrinsics> for Intrinsics {
    fn from(intrinsics: CameraIntrinsics) -> Self {
        Intrinsics::Pinhole(intrinsics)
    }
}

impl From<CameraIntrinsicsK1Distortion> for Intrinsics {
    fn from(intrinsics: CameraIntrinsicsK1Distortion) -> Self {
        Intrinsics::K1(intrinsics)
    }
}

impl CameraModel for Intrinsics {
    fn unproject<P>(&self, point: P) -> CameraRay
    where
        P: ImagePoint,
    {
        match self {
            Intrinsics::Pinhole(intrinsics) => intrinsics.unproject(point),
            Intrinsics::K1(intrinsics) => intrinsics.unproject(point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_catches_degenerate_intrinsics() {
        assert_eq!(
            CameraIntrinsics::identity().focals(Vector2::new(0.0, 1.0)).validate(),
            Err(ProjectionError::ZeroFocalLength)
        );
        assert_eq!(
            CameraIntrinsics::identity().skew(f64::NAN).validate(),
            Err(ProjectionError::NonFinite)
        );
        assert_eq!(
            Intrinsics::from(CameraIntrinsicsK1Distortion::new(
                CameraIntrinsics::identity(),
                f64::INFINITY
            ))
            .validate(),
            Err(ProjectionError::NonFinite)
        );
        assert!(CameraIntrinsics::identity().focal(1000.0).validate().is_ok());
    }

    #[test]
    fn principal_point_maps_to_optical_axis() {
        let intrinsics = CameraIntrinsics::identity()
            .focal(1200.0)
            .principal_point(Point2::new(640.5, 359.25));
        let ray = intrinsics.unproject(KeyPoint(Point2::new(640.5, 359.25)));
        assert_eq!(ray.direction, Vector3::new(0.0, 0.0, 1.0));
    }
}
