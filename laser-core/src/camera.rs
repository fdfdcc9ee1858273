use crate::ImagePoint;
use nalgebra::Vector3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The camera space a [`CameraRay`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum CameraConvention {
    /// X right, Y down, Z forwards out of the optical center.
    /// This is what unit-depth intrinsic models produce.
    Optical,
    /// The frame of the pose matrix itself: X right, Y up, and the camera looks down
    /// the negative Z axis. This is what projection matrix unprojection produces.
    Pose,
}

/// An unnormalized direction out of the optical center of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraRay {
    pub direction: Vector3<f64>,
    pub convention: CameraConvention,
}

impl CameraRay {
    pub fn optical(direction: Vector3<f64>) -> Self {
        Self {
            direction,
            convention: CameraConvention::Optical,
        }
    }

    pub fn pose(direction: Vector3<f64>) -> Self {
        Self {
            direction,
            convention: CameraConvention::Pose,
        }
    }

    /// Shifts the X and Y components of the direction.
    ///
    /// For optical rays at unit depth this is an offset in meters on the plane one meter in
    /// front of the camera, which is how manual unprojection calibration is expressed.
    #[must_use]
    pub fn shifted(self, dx: f64, dy: f64) -> Self {
        Self {
            direction: Vector3::new(
                self.direction.x + dx,
                self.direction.y + dy,
                self.direction.z,
            ),
            ..self
        }
    }
}

/// Allows conversion from the point on an image to a direction out of the camera.
pub trait CameraModel {
    /// Extracts a camera-space ray from a pixel location in an image.
    ///
    /// The image point has its origin in the top-left corner, X right and Y down.
    fn unproject<P>(&self, point: P) -> CameraRay
    where
        P: ImagePoint;
}
