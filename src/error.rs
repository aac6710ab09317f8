use std::fmt;

use thiserror::Error;

use crate::data::model::Position;

/// Errors that abort a figure build. No partial geometry is returned with them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RnavError {
    #[error("no offset aligns '{dataset}' to the sequence (best had {best_mismatches} mismatches over {best_overlap} nt, {max_mismatches} allowed)")]
    Alignment {
        dataset: String,
        best_mismatches: usize,
        best_overlap: usize,
        max_mismatches: usize,
    },
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
    #[error("{0} needs a 3-D model, but none is loaded")]
    MissingGeometry(String),
    #[error("position {position} is outside the sequence (1..={length})")]
    OutOfRange { position: Position, length: usize },
    #[error("'{0}' is not loaded")]
    MissingData(String),
}

pub type Result<T, E = RnavError> = std::result::Result<T, E>;

/// A requested position has no coordinate; the geometry element that needed
/// it was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnmappedPositionWarning {
    pub position: Position,
}

impl fmt::Display for UnmappedPositionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {} has no diagram coordinate", self.position)
    }
}

/// Geometry plus the non-fatal warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Built<T> {
    pub value: T,
    pub warnings: Vec<UnmappedPositionWarning>,
}

impl<T> Built<T> {
    pub fn clean(value: T) -> Self {
        Built {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Built<U> {
        Built {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
