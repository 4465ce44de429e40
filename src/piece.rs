use crate::error::{Result, SolverError};

/// Edge colors are small integers. Color 0 is the border color and may
/// only ever face off the board.
pub type Color = u8;

pub const BORDER: Color = 0;

/// Colors are packed five bits at a time into signature keys and printed
/// with the `'a' + color` alphabet, which caps the palette at `a..=w`.
pub const MAX_COLORS: usize = 23;

pub type PieceId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The direction `steps` clockwise quarter turns away.
    #[inline(always)]
    pub fn rotated(self, steps: u8) -> Direction {
        DIRECTIONS[(self as usize + steps as usize) & 3]
    }

    #[inline(always)]
    pub fn opposite(self) -> Direction {
        self.rotated(2)
    }

    /// Unit step towards this direction, with y growing downwards.
    #[inline(always)]
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

/// A square tile with one color per edge, stored in canonical
/// north/east/south/west order for rotation 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub edges: [Color; 4],
}

impl Piece {
    /// Color shown towards `dir` once the piece has been turned by
    /// `rotation` clockwise quarter turns.
    #[inline(always)]
    pub fn edge_at(&self, dir: Direction, rotation: u8) -> Color {
        self.edges[(dir.index() + 4 - (rotation & 3) as usize) & 3]
    }

    /// All four shown colors at once, north/east/south/west order.
    #[inline(always)]
    pub fn rotated_edges(&self, rotation: u8) -> [Color; 4] {
        [
            self.edge_at(Direction::North, rotation),
            self.edge_at(Direction::East, rotation),
            self.edge_at(Direction::South, rotation),
            self.edge_at(Direction::West, rotation),
        ]
    }

    /// Number of border-colored edges: 2 for corners, 1 for sides, 0 for
    /// middles on a standard rectangular set.
    pub fn border_edges(&self) -> usize {
        self.edges.iter().filter(|&&c| c == BORDER).count()
    }
}

/// A piece at a rotation, not yet tied to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub piece: PieceId,
    pub rotation: u8,
}

/// A placement pinned to a cell before the search starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clue {
    pub x: usize,
    pub y: usize,
    pub placement: Placement,
}

#[inline(always)]
pub fn color_to_char(color: Color) -> char {
    (b'a' + color) as char
}

#[inline(always)]
pub fn color_from_char(ch: char) -> Option<Color> {
    let c = ch as u32;
    let a = 'a' as u32;
    if (a..a + MAX_COLORS as u32).contains(&c) {
        Some((c - a) as Color)
    } else {
        None
    }
}

/// The immutable catalogue of pieces for one puzzle instance, with ids
/// equal to their index, plus any clues that shipped with it.
#[derive(Debug, Clone)]
pub struct PieceSet {
    pieces: Vec<Piece>,
    clues: Vec<Clue>,
    color_count: usize,
}

impl PieceSet {
    pub fn new(pieces: Vec<Piece>, clues: Vec<Clue>) -> Result<Self> {
        if pieces.is_empty() {
            return Err(SolverError::InvalidPieceSet {
                reason: "no pieces".to_string(),
            });
        }
        if pieces.len() > PieceId::MAX as usize + 1 {
            return Err(SolverError::InvalidPieceSet {
                reason: format!("{} pieces exceed the id range", pieces.len()),
            });
        }
        let mut color_count = 1;
        for (index, piece) in pieces.iter().enumerate() {
            if piece.id as usize != index {
                return Err(SolverError::InvalidPieceSet {
                    reason: format!("piece {} stored at index {index}", piece.id),
                });
            }
            for &color in &piece.edges {
                if color as usize >= MAX_COLORS {
                    return Err(SolverError::InvalidPieceSet {
                        reason: format!("piece {} uses color {color}", piece.id),
                    });
                }
                color_count = color_count.max(color as usize + 1);
            }
        }
        for clue in &clues {
            if clue.placement.piece as usize >= pieces.len() {
                return Err(SolverError::BadClue {
                    x: clue.x,
                    y: clue.y,
                    reason: format!("unknown piece {}", clue.placement.piece),
                });
            }
            if clue.placement.rotation > 3 {
                return Err(SolverError::BadClue {
                    x: clue.x,
                    y: clue.y,
                    reason: format!("rotation {} out of range", clue.placement.rotation),
                });
            }
        }
        Ok(PieceSet {
            pieces,
            clues,
            color_count,
        })
    }

    /// Reads a piece set from text: one four-letter token per piece in id
    /// order (`north east south west`, `'a' + color`), blank lines and
    /// `#` comments skipped, plus optional `clue X Y PIECE ROTATION`
    /// lines.
    pub fn parse(text: &str) -> Result<Self> {
        let mut pieces: Vec<Piece> = Vec::new();
        let mut clues: Vec<Clue> = Vec::new();
        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("clue") {
                clues.push(parse_clue(line, rest)?);
                continue;
            }
            let mut edges = [BORDER; 4];
            let mut count = 0;
            for ch in trimmed.chars() {
                if count == 4 {
                    count += 1;
                    break;
                }
                edges[count] = color_from_char(ch).ok_or_else(|| SolverError::Parse {
                    line,
                    reason: format!("invalid edge letter {ch:?}"),
                })?;
                count += 1;
            }
            if count != 4 {
                return Err(SolverError::Parse {
                    line,
                    reason: format!("expected a four letter token, got {trimmed:?}"),
                });
            }
            pieces.push(Piece {
                id: pieces.len() as PieceId,
                edges,
            });
        }
        PieceSet::new(pieces, clues)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Look up a piece by id. Ids outside the catalogue are a caller bug
    /// and panic.
    #[inline(always)]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id as usize]
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    /// Size of the palette actually used, border color included.
    pub fn color_count(&self) -> usize {
        self.color_count
    }
}

fn parse_clue(line: usize, rest: &str) -> Result<Clue> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(SolverError::Parse {
            line,
            reason: format!("clue wants X Y PIECE ROTATION, got {} fields", fields.len()),
        });
    }
    let num = |field: &str, what: &str| -> Result<usize> {
        field.parse::<usize>().map_err(|_| SolverError::Parse {
            line,
            reason: format!("clue {what} {field:?} is not a number"),
        })
    };
    let x = num(fields[0], "x")?;
    let y = num(fields[1], "y")?;
    let piece = num(fields[2], "piece")?;
    let rotation = num(fields[3], "rotation")?;
    if piece > PieceId::MAX as usize {
        return Err(SolverError::Parse {
            line,
            reason: format!("clue piece {piece} out of range"),
        });
    }
    if rotation > 3 {
        return Err(SolverError::Parse {
            line,
            reason: format!("clue rotation {rotation} out of range"),
        });
    }
    Ok(Clue {
        x,
        y,
        placement: Placement {
            piece: piece as PieceId,
            rotation: rotation as u8,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_shifts_edges_clockwise() {
        let piece = Piece {
            id: 0,
            edges: [1, 2, 3, 4],
        };
        // Rotation 0 shows the canonical edges.
        assert_eq!(piece.edge_at(Direction::North, 0), 1);
        assert_eq!(piece.edge_at(Direction::East, 0), 2);
        // One clockwise turn moves the west edge up to north.
        assert_eq!(piece.edge_at(Direction::North, 1), 4);
        assert_eq!(piece.edge_at(Direction::East, 1), 1);
        assert_eq!(piece.edge_at(Direction::South, 1), 2);
        assert_eq!(piece.edge_at(Direction::West, 1), 3);
        // Two turns swap opposite edges.
        assert_eq!(piece.edge_at(Direction::North, 2), 3);
        assert_eq!(piece.edge_at(Direction::West, 2), 2);
        // Rotations wrap modulo 4.
        assert_eq!(piece.edge_at(Direction::North, 5), 4);
    }

    #[test]
    fn opposite_directions_pair_up() {
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert_eq!(Direction::South.opposite(), Direction::North);
        assert_eq!(Direction::West.opposite(), Direction::East);
    }

    #[test]
    fn rotation_walks_the_compass_clockwise() {
        assert_eq!(Direction::North.rotated(1), Direction::East);
        assert_eq!(Direction::West.rotated(1), Direction::North);
        assert_eq!(Direction::East.rotated(3), Direction::North);
        for dir in DIRECTIONS {
            assert_eq!(dir.rotated(0), dir);
            assert_eq!(dir.rotated(4), dir);
        }
    }

    #[test]
    fn border_edge_counts_classify_pieces() {
        let corner = Piece {
            id: 0,
            edges: [BORDER, 1, 2, BORDER],
        };
        let side = Piece {
            id: 1,
            edges: [BORDER, 1, 2, 3],
        };
        let middle = Piece {
            id: 2,
            edges: [4, 1, 2, 3],
        };
        assert_eq!(corner.border_edges(), 2);
        assert_eq!(side.border_edges(), 1);
        assert_eq!(middle.border_edges(), 0);
    }

    #[test]
    fn parse_reads_tokens_and_clues() {
        let text = "\
# two by one strip
abca
acab

clue 0 0 0 0
";
        let set = PieceSet::parse(text).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.piece(0).edges, [0, 1, 2, 0]);
        assert_eq!(set.piece(1).edges, [0, 2, 0, 1]);
        assert_eq!(set.color_count(), 3);
        assert_eq!(set.clues().len(), 1);
        assert_eq!(
            set.clues()[0].placement,
            Placement {
                piece: 0,
                rotation: 0
            }
        );
    }

    #[test]
    fn parse_rejects_bad_tokens() {
        assert!(matches!(
            PieceSet::parse("abc"),
            Err(SolverError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            PieceSet::parse("abcde"),
            Err(SolverError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            PieceSet::parse("ab1a"),
            Err(SolverError::Parse { line: 1, .. })
        ));
        // 'z' is past the packed palette.
        assert!(matches!(
            PieceSet::parse("abza"),
            Err(SolverError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn parse_rejects_bad_clues() {
        assert!(matches!(
            PieceSet::parse("abca\nclue 0 0"),
            Err(SolverError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            PieceSet::parse("abca\nclue 0 0 0 4"),
            Err(SolverError::Parse { line: 2, .. })
        ));
        // Clue naming a piece the set does not have.
        assert!(matches!(
            PieceSet::parse("abca\nclue 0 0 7 0"),
            Err(SolverError::BadClue { .. })
        ));
    }

    #[test]
    fn color_chars_round_trip() {
        for color in 0..MAX_COLORS as Color {
            assert_eq!(color_from_char(color_to_char(color)), Some(color));
        }
        assert_eq!(color_from_char('x'), None);
        assert_eq!(color_from_char('A'), None);
    }
}
