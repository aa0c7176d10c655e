use std::fmt::{Debug, Formatter};

use crate::oracle::OracleError;
use crate::split::GeometryError;
use crate::workspace::Stage;

/// Crate-level error aggregation. Module errors convert into this
/// through [`impl_err!`](crate::impl_err).
pub enum Error {
    Geometry(GeometryError),
    Oracle(OracleError),
    Stage(StageError),
}

/// Whole-stage failures. Per-trail and per-anchor problems are recovered
/// locally (skip-and-continue) and never surface here.
pub enum StageError {
    /// The network builder produced no nodes at all, so no later
    /// stage can run.
    EmptyNetwork,
    /// A stage was requested before its predecessor committed.
    OutOfOrder { requested: Stage, missing: Stage },
    /// The run was cancelled at a stage checkpoint.
    Cancelled(Stage),
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Geometry(e) => write!(f, "GeometryError: {e:?}"),
            Error::Oracle(e) => write!(f, "OracleError: {e:?}"),
            Error::Stage(e) => write!(f, "StageError: {e:?}"),
        }
    }
}

impl Debug for StageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StageError::EmptyNetwork => write!(f, "network builder emitted zero nodes"),
            StageError::OutOfOrder { requested, missing } => {
                write!(f, "stage {requested} requires {missing} to have completed")
            }
            StageError::Cancelled(stage) => write!(f, "run cancelled before stage {stage}"),
        }
    }
}

/// Converts errors from their submodule type to a crate [`Error`] variant.
///
/// ```rust,ignore
/// use switchback::split::GeometryError;
/// switchback::impl_err!(GeometryError, Geometry);
/// ```
#[macro_export]
macro_rules! impl_err {
    ($from:ty, $variant:ident) => {
        impl From<$from> for $crate::Error {
            fn from(value: $from) -> Self {
                $crate::Error::$variant(value)
            }
        }
    };
}

impl_err!(GeometryError, Geometry);
impl_err!(OracleError, Oracle);
impl_err!(StageError, Stage);
