//! Renders assemblies as text and writes near-complete boards to disk.

use std::fs;
use std::path::{Path, PathBuf};

use string_builder::Builder;
use uuid::Uuid;

use crate::board::Snapshot;
use crate::error::{Result, SolverError};
use crate::piece::{color_to_char, PieceSet};

/// Row-major edge letters, four per cell in north, east, south, west
/// order. Empty cells render as `aaaa`, the border color.
pub fn board_tokens(snapshot: &Snapshot, pieces: &PieceSet) -> String {
    let mut tokens = String::with_capacity(snapshot.width() * snapshot.height() * 4);
    for y in 0..snapshot.height() {
        for x in 0..snapshot.width() {
            match snapshot.cell_at(x, y) {
                Some(placement) => {
                    let shown = pieces.piece(placement.piece).rotated_edges(placement.rotation);
                    for edge in shown {
                        tokens.push(color_to_char(edge));
                    }
                }
                None => tokens.push_str("aaaa"),
            }
        }
    }
    tokens
}

/// Link that renders the assembly on the bucas board viewer.
pub fn bucas_url(snapshot: &Snapshot, pieces: &PieceSet, puzzle_name: &str) -> String {
    format!(
        "https://e2.bucas.name/#puzzle={}&board_w={}&board_h={}&board_edges={}&motifs_order=jblackwood",
        puzzle_name,
        snapshot.width(),
        snapshot.height(),
        board_tokens(snapshot, pieces),
    )
}

/// Writes the assembly grid plus its viewer link under `dir`, returning
/// the path written. The filename carries the fill count, a digest of
/// the content and a random suffix so concurrent workers never collide.
pub fn write_solution(
    dir: &Path,
    snapshot: &Snapshot,
    pieces: &PieceSet,
    puzzle_name: &str,
) -> Result<PathBuf> {
    let mut builder = Builder::default();
    for y in 0..snapshot.height() {
        for x in 0..snapshot.width() {
            match snapshot.cell_at(x, y) {
                Some(placement) => {
                    builder.append(format!("{:>3}/{} ", placement.piece, placement.rotation));
                }
                None => builder.append("---/- "),
            }
        }
        builder.append('\n');
    }
    builder.append('\n');
    builder.append(bucas_url(snapshot, pieces, puzzle_name));
    builder.append('\n');
    let text = builder.string().expect("builder only sees utf-8 input");

    let hash = format!("{:x}", md5::compute(&text));
    let filename = format!(
        "{}_{}_{}.txt",
        snapshot.filled(),
        hash,
        Uuid::new_v4().simple()
    );

    fs::create_dir_all(dir).map_err(|source| SolverError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(filename);
    fs::write(&path, text).map_err(|source| SolverError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Folder for saved assemblies under the user's documents, when the
/// platform exposes one.
pub fn solutions_dir() -> Option<PathBuf> {
    let dirs = directories::UserDirs::new()?;
    let docs = dirs.document_dir()?;
    Some(docs.join("EdgematchSolutions"))
}
