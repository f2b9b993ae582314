use thiserror::Error;

/// Errors raised while constructing a group or world.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GroupError {
    #[error("topic catalog is empty")]
    EmptyCatalog,
    #[error("topic vectors must have at least one dimension")]
    ZeroDimensions,
    #[error("topic {topic} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        topic: usize,
        expected: usize,
        actual: usize,
    },
    #[error("grid of {cells} cells cannot hold {topics} topics")]
    GridTooSmall { cells: usize, topics: usize },
    #[error("{values} catalog values do not split into {names} vectors of {dims} dimensions")]
    CatalogShape {
        names: usize,
        values: usize,
        dims: usize,
    },
    #[error("group bounds must be finite with positive extent")]
    InvalidBounds,
    #[error("group must contain at least one member")]
    EmptyGroup,
}
