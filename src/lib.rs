//! Edge-matching puzzle solver core.
//!
//! Tiles carry a color on each of their four edges and an assembly fills
//! a rectangular board so that touching edges agree, with the border
//! color facing off the board and nowhere else. The crate keeps a
//! transactional [`Board`] whose every placement is screened against a
//! supply and demand census of edge signatures, ranks open cells with a
//! pluggable [`FieldSelector`], and drives restartable depth-first
//! search through a [`SearchController`].

#![forbid(unsafe_code)]

/// Fixed-capacity bitset over piece ids.
pub mod bits;
/// Transactional board state and snapshots.
pub mod board;
/// Signature-keyed candidate piece index.
pub mod candidates;
/// Tuning knobs for the demo binary and restart defaults.
pub mod config;
/// Setup and I/O error type.
pub mod error;
/// Text rendering and solution files.
pub mod export;
/// Random solvable instance generator.
pub mod generate;
/// Pieces, placements, catalogues and their parser.
pub mod piece;
/// Depth-first search with stall-triggered restarts.
pub mod search;
/// Edge signature shapes and packed keys.
pub mod sig;
/// Supply and demand census over signatures.
pub mod tracker;
/// Open-cell ranking policies.
pub mod walker;

pub use board::{Board, CellState, Snapshot};
pub use error::{Result, SolverError};
pub use generate::{generate, GeneratedPuzzle};
pub use piece::{Clue, Color, Direction, Piece, PieceId, PieceSet, Placement, BORDER};
pub use search::{
    Progress, RestartPolicy, SearchCommand, SearchController, SearchOutcome, StallRestart,
    Strategy,
};
pub use walker::{FieldSelector, RankKey, RankedCell};
