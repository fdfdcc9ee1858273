//! Conversions between the raw matrix payloads a capture pipeline delivers and the
//! column-vector `f64` matrices used everywhere else.
//!
//! Payloads are always read in row-major order: element `i` is row `i / 4`, column `i % 4`.

use crate::{CameraToWorld, GeometryError};
use nalgebra::Matrix4;

/// Number of elements in a 4x4 matrix payload.
pub const MATRIX_LEN: usize = 16;

/// Number of bytes in a 4x4 matrix of little-endian `f32`.
pub const MATRIX_BYTES: usize = MATRIX_LEN * 4;

/// Builds a matrix from 16 row-major floats.
///
/// ```
/// use laser_core::convert::matrix_from_row_major;
/// let values: Vec<f32> = (0..16).map(|v| v as f32).collect();
/// let m = matrix_from_row_major(&values).unwrap();
/// assert_eq!(m[(0, 1)], 1.0);
/// assert_eq!(m[(1, 0)], 4.0);
/// assert!(matrix_from_row_major(&values[..15]).is_err());
/// ```
pub fn matrix_from_row_major(values: &[f32]) -> Result<Matrix4<f64>, GeometryError> {
    if values.len() != MATRIX_LEN {
        return Err(GeometryError::WrongLength {
            expected: MATRIX_LEN,
            actual: values.len(),
        });
    }
    if !values.iter().all(|v| v.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    let values: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
    Ok(Matrix4::from_row_slice(&values))
}

/// Builds a matrix from 64 bytes holding 16 row-major little-endian `f32`.
///
/// This is the layout of the transform attributes attached to media frames.
pub fn matrix_from_le_bytes(bytes: &[u8]) -> Result<Matrix4<f64>, GeometryError> {
    if bytes.len() != MATRIX_BYTES {
        return Err(GeometryError::WrongLength {
            expected: MATRIX_BYTES,
            actual: bytes.len(),
        });
    }
    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    matrix_from_row_major(&values)
}

/// Writes a matrix out as 16 row-major floats.
pub fn matrix_to_row_major(matrix: &Matrix4<f64>) -> [f32; MATRIX_LEN] {
    let mut out = [0.0; MATRIX_LEN];
    for (i, v) in out.iter_mut().enumerate() {
        *v = matrix[(i / 4, i % 4)] as f32;
    }
    out
}

/// Negates the Z row of a camera-to-world matrix, moving the result from a right-handed
/// world into a left-handed one (or back).
#[must_use]
pub fn flip_handedness(mut matrix: Matrix4<f64>) -> Matrix4<f64> {
    matrix.row_mut(2).neg_mut();
    matrix
}

/// Assembles the camera-to-world pose from the two transforms a locatable camera frame carries.
///
/// * `view` - the frame's view transform (world of the camera coordinate system into camera).
/// * `coordinate_system_to_world` - the transform from the frame's coordinate system into the
///   application's world origin.
///
/// Both are given as they are decoded from the frame, i.e. in row-vector layout, and are
/// transposed here. The view transform is inverted, chained with the coordinate system transform,
/// and the result is converted into a left-handed world.
pub fn locatable_camera_to_world(
    view: &Matrix4<f64>,
    coordinate_system_to_world: &Matrix4<f64>,
) -> Result<CameraToWorld, GeometryError> {
    let camera_to_view_world = view
        .transpose()
        .try_inverse()
        .ok_or(GeometryError::NotInvertible)?;
    let combined = coordinate_system_to_world.transpose() * camera_to_view_world;
    CameraToWorld::from_matrix(flip_handedness(combined))
}
