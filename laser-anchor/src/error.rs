use laser_core::GeometryError;
use laser_detect::FrameError;
use laser_pinhole::ProjectionError;
use thiserror::Error;

/// Why a frame was skipped without looking for the marker (or without producing a ray).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("invalid pose matrix: {0}")]
    Pose(GeometryError),
    #[error("invalid projection matrix: {0}")]
    ProjectionMatrix(GeometryError),
    #[error("unusable camera model: {0}")]
    Projection(#[from] ProjectionError),
    #[error("frame carries neither a projection matrix nor intrinsics")]
    MissingProjection,
    #[error("marker ray is degenerate: {0}")]
    DegenerateRay(GeometryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SettingsError {
    #[error("detection area {width}x{height} must be within (0, 1]")]
    DetectionArea { width: f64, height: f64 },
    #[error("unprojection offset must be finite")]
    NonFiniteOffset,
    #[error("fallback distance {0} must be positive and finite")]
    FallbackDistance(f64),
    #[error("maximum raycast distance {0} must be positive")]
    MaxDistance(f64),
}
