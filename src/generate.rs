use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config;
use crate::piece::{Clue, Color, Piece, PieceId, PieceSet, Placement, BORDER, MAX_COLORS};

/// A generated instance: the shuffled catalogue plus the hidden assembly
/// it was cut from, row-major.
#[derive(Debug, Clone)]
pub struct GeneratedPuzzle {
    pub set: PieceSet,
    pub solution: Vec<Placement>,
    pub width: usize,
    pub height: usize,
}

impl GeneratedPuzzle {
    /// The solved placement at `(x, y)`, ready to pin as a clue.
    pub fn clue_at(&self, x: usize, y: usize) -> Clue {
        assert!(x < self.width && y < self.height);
        Clue {
            x,
            y,
            placement: self.solution[y * self.width + x],
        }
    }
}

/// Cuts a random solvable instance: every interior seam of the grid gets
/// a color from `1..=colors`, the rim gets the border color, and the
/// resulting tiles are dealt out under shuffled ids and rotations. The
/// same seed always cuts the same instance.
pub fn generate(width: usize, height: usize, colors: u8, seed: u64) -> GeneratedPuzzle {
    assert!(width >= 1 && height >= 1, "degenerate {width}x{height} grid");
    assert!(colors >= 1, "at least one interior color");
    assert!(
        (colors as usize) < MAX_COLORS,
        "{colors} interior colors exceed the palette"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let cell_count = width * height;

    // Seam colors: vertical seams sit between (x, y) and (x + 1, y),
    // horizontal seams between (x, y) and (x, y + 1).
    let mut vertical = vec![BORDER; width.saturating_sub(1) * height];
    for seam in vertical.iter_mut() {
        *seam = rng.gen_range(1..=colors);
    }
    let mut horizontal = vec![BORDER; width * height.saturating_sub(1)];
    for seam in horizontal.iter_mut() {
        *seam = rng.gen_range(1..=colors);
    }

    let solved_edges = |x: usize, y: usize| -> [Color; 4] {
        let north = if y == 0 {
            BORDER
        } else {
            horizontal[(y - 1) * width + x]
        };
        let east = if x == width - 1 {
            BORDER
        } else {
            vertical[y * (width - 1) + x]
        };
        let south = if y == height - 1 {
            BORDER
        } else {
            horizontal[y * width + x]
        };
        let west = if x == 0 {
            BORDER
        } else {
            vertical[y * (width - 1) + x - 1]
        };
        [north, east, south, west]
    };

    let mut ids: Vec<PieceId> = (0..cell_count as PieceId).collect();
    ids.shuffle(&mut rng);

    let mut pieces = vec![
        Piece {
            id: 0,
            edges: [BORDER; 4],
        };
        cell_count
    ];
    let mut solution = Vec::with_capacity(cell_count);
    for (cell, &id) in ids.iter().enumerate() {
        let (x, y) = (cell % width, cell / width);
        let shown = solved_edges(x, y);
        let rotation = rng.gen_range(0..4u8);
        // Canonical edges are the shown pattern turned back, so that
        // rotating the piece by `rotation` shows the solved colors.
        let mut edges = [BORDER; 4];
        for (slot, edge) in edges.iter_mut().enumerate() {
            *edge = shown[(slot + rotation as usize) & 3];
        }
        pieces[id as usize] = Piece { id, edges };
        solution.push(Placement { piece: id, rotation });
    }

    let set = PieceSet::new(pieces, Vec::new()).expect("generated sets are always valid");
    GeneratedPuzzle {
        set,
        solution,
        width,
        height,
    }
}

/// The stock demo instance, shared by the binary and the benchmarks.
pub static DEMO: Lazy<GeneratedPuzzle> = Lazy::new(|| {
    generate(
        config::DEMO_WIDTH,
        config::DEMO_HEIGHT,
        config::DEMO_COLORS,
        config::DEMO_SEED,
    )
});
