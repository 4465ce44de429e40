use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failures raised while loading, validating or persisting puzzle data.
///
/// Search dead ends are not errors: `Board::place` reports them with a
/// plain `bool` and contract violations (removing from an empty cell,
/// placing onto an occupied one) panic instead.
#[derive(Debug)]
pub enum SolverError {
    /// A piece file line that could not be understood.
    Parse { line: usize, reason: String },
    /// A piece set that can never form a rectangular assembly.
    InvalidPieceSet { reason: String },
    /// A clue that does not fit the board it was given to.
    BadClue { x: usize, y: usize, reason: String },
    /// Filesystem trouble while reading pieces or writing solutions.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::Parse { line, reason } => {
                write!(f, "parse error on line {line}: {reason}")
            }
            SolverError::InvalidPieceSet { reason } => {
                write!(f, "invalid piece set: {reason}")
            }
            SolverError::BadClue { x, y, reason } => {
                write!(f, "bad clue at ({x}, {y}): {reason}")
            }
            SolverError::Io { path, source } => {
                write!(f, "io error on {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for SolverError {
    fn from(source: io::Error) -> Self {
        SolverError::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
