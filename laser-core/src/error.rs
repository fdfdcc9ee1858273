use thiserror::Error;

/// Reasons a matrix or ray cannot be used for geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("expected {expected} matrix elements, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("matrix contains a non-finite element")]
    NonFinite,
    #[error("matrix is not invertible")]
    NotInvertible,
    #[error("ray direction has zero length or is not finite")]
    DegenerateDirection,
}
