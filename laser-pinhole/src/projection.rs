use crate::ProjectionError;
use laser_core::nalgebra::{Matrix4, Point2, Vector2, Vector3};
use laser_core::{CameraModel, CameraRay, ImagePoint};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A camera described by the projection matrix a renderer would use for it.
///
/// Pixels are first moved into normalized device coordinates (X right, Y up, both in `[-1, 1]`
/// across the image) and then unprojected with the focal terms and principal point extracted
/// from the matrix. The resulting ray lives in the frame of the pose matrix, so it must be
/// rotated with [`CameraToWorld::rotate`](laser_core::CameraToWorld::rotate).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ProjectionCamera {
    /// `P[0][0]` and `P[1][1]`.
    pub focals: Vector2<f64>,
    /// `(P[0][2], P[1][2]) / P[2][2]`.
    pub principal_point: Point2<f64>,
    /// `P[2][2]`.
    pub norm_factor: f64,
    pub width: u32,
    pub height: u32,
}

impl ProjectionCamera {
    /// Extracts the unprojection terms from a projection matrix for an image of the given size.
    ///
    /// ```
    /// use laser_core::nalgebra::Matrix4;
    /// use laser_pinhole::{ProjectionCamera, ProjectionError};
    /// let mut matrix = Matrix4::identity();
    /// matrix[(2, 2)] = 0.0;
    /// assert_eq!(
    ///     ProjectionCamera::from_matrix(&matrix, 1280, 720),
    ///     Err(ProjectionError::ZeroNormFactor)
    /// );
    /// ```
    pub fn from_matrix(
        matrix: &Matrix4<f64>,
        width: u32,
        height: u32,
    ) -> Result<Self, ProjectionError> {
        if width == 0 || height == 0 {
            return Err(ProjectionError::ZeroResolution);
        }
        if !matrix.iter().all(|v| v.is_finite()) {
            return Err(ProjectionError::NonFinite);
        }
        let focals = Vector2::new(matrix[(0, 0)], matrix[(1, 1)]);
        if focals.x == 0.0 || focals.y == 0.0 {
            return Err(ProjectionError::ZeroFocalLength);
        }
        let norm_factor = matrix[(2, 2)];
        if norm_factor == 0.0 {
            return Err(ProjectionError::ZeroNormFactor);
        }
        let principal_point = Point2::new(matrix[(0, 2)], matrix[(1, 2)]) / norm_factor;
        Ok(Self {
            focals,
            principal_point,
            norm_factor,
            width,
            height,
        })
    }

    /// Converts a pixel into normalized device coordinates.
    ///
    /// ```
    /// use laser_core::nalgebra::{Matrix4, Point2};
    /// use laser_core::KeyPoint;
    /// use laser_pinhole::ProjectionCamera;
    /// let camera = ProjectionCamera::from_matrix(&Matrix4::identity(), 200, 100).unwrap();
    /// assert_eq!(camera.ndc(KeyPoint(Point2::new(100.0, 50.0))), Point2::new(0.0, 0.0));
    /// assert_eq!(camera.ndc(KeyPoint(Point2::new(0.0, 0.0))), Point2::new(-1.0, 1.0));
    /// assert_eq!(camera.ndc(KeyPoint(Point2::new(200.0, 100.0))), Point2::new(1.0, -1.0));
    /// ```
    pub fn ndc<P: ImagePoint>(&self, point: P) -> Point2<f64> {
        let point = point.image_point();
        let half_width = f64::from(self.width) / 2.0;
        let half_height = f64::from(self.height) / 2.0;
        Point2::new(
            (point.x - half_width) / half_width,
            -(point.y - half_height) / half_height,
        )
    }
}

impl CameraModel for ProjectionCamera {
    /// ```
    /// use laser_core::{CameraConvention, CameraModel, Pixel};
    /// use laser_core::nalgebra::Matrix4;
    /// use laser_pinhole::ProjectionCamera;
    /// #[rustfmt::skip]
    /// let matrix = Matrix4::new(
    ///     2.31, 0.0,  0.0,  0.0,
    ///     0.0,  4.10, 0.0,  0.0,
    ///     0.0,  0.0, -1.0,  0.0,
    ///     0.0,  0.0, -1.0,  0.0,
    /// );
    /// let camera = ProjectionCamera::from_matrix(&matrix, 1280, 720).unwrap();
    /// let ray = camera.unproject(Pixel::new(640, 360));
    /// assert_eq!(ray.convention, CameraConvention::Pose);
    /// assert!(ray.direction.x.abs() < 1e-12);
    /// assert!(ray.direction.y.abs() < 1e-12);
    /// assert_eq!(ray.direction.z, -1.0);
    /// ```
    fn unproject<P>(&self, point: P) -> CameraRay
    where
        P: ImagePoint,
    {
        let ndc = self.ndc(point);
        let centered = ndc - self.principal_point;
        CameraRay::pose(Vector3::new(
            centered.x / self.focals.x,
            centered.y / self.focals.y,
            1.0 / self.norm_factor,
        ))
    }
}
