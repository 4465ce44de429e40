//! Edge signatures: the partial color patterns a cell can demand and a
//! piece can supply. Five shapes exist, from a single edge up to the
//! full four-edge pattern. Each is packed into one `u32` key so counter
//! and bucket maps stay flat.

use crate::piece::{Color, Piece};

/// Packed signature key: a shape tag in the high bits and up to four
/// five-bit colors below it.
pub type SigKey = u32;

const TAG_SINGLE: u32 = 1;
const TAG_PAIR: u32 = 2;
const TAG_OPPOSITE: u32 = 3;
const TAG_TRIPLE: u32 = 4;
const TAG_QUAD: u32 = 5;

/// One demandable or suppliable edge pattern.
///
/// Adjacent shapes read clockwise, so `AdjacentPair(a, b)` means color
/// `a` with `b` on the next edge clockwise and is distinct from
/// `AdjacentPair(b, a)`. `OppositePair` is unordered: both edges of an
/// axis, in either orientation. `Quad` compares equal across the four
/// cyclic rotations of the same pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    Single(Color),
    AdjacentPair(Color, Color),
    OppositePair(Color, Color),
    AdjacentTriple(Color, Color, Color),
    Quad([Color; 4]),
}

impl Signature {
    pub(crate) fn key(self) -> SigKey {
        match self {
            Signature::Single(a) => single_key(a),
            Signature::AdjacentPair(a, b) => pair_key(a, b),
            Signature::OppositePair(a, b) => opposite_key(a, b),
            Signature::AdjacentTriple(a, b, c) => triple_key(a, b, c),
            Signature::Quad(edges) => quad_key(edges),
        }
    }
}

#[inline(always)]
fn pack(tag: u32, c0: Color, c1: Color, c2: Color, c3: Color) -> SigKey {
    (tag << 20) | ((c0 as u32) << 15) | ((c1 as u32) << 10) | ((c2 as u32) << 5) | c3 as u32
}

#[inline(always)]
pub(crate) fn single_key(a: Color) -> SigKey {
    pack(TAG_SINGLE, a, 0, 0, 0)
}

#[inline(always)]
pub(crate) fn pair_key(a: Color, b: Color) -> SigKey {
    pack(TAG_PAIR, a, b, 0, 0)
}

/// Opposite pairs are unordered, so both orientations of an axis land on
/// the same key.
#[inline(always)]
pub(crate) fn opposite_key(a: Color, b: Color) -> SigKey {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    pack(TAG_OPPOSITE, lo, hi, 0, 0)
}

#[inline(always)]
pub(crate) fn triple_key(a: Color, b: Color, c: Color) -> SigKey {
    pack(TAG_TRIPLE, a, b, c, 0)
}

/// Full patterns use the lexicographically smallest cyclic rotation, so
/// all four rotations of one piece share a key.
pub(crate) fn quad_key(edges: [Color; 4]) -> SigKey {
    let mut best = edges;
    for turn in 1..4 {
        let candidate = [
            edges[turn & 3],
            edges[(turn + 1) & 3],
            edges[(turn + 2) & 3],
            edges[(turn + 3) & 3],
        ];
        if candidate < best {
            best = candidate;
        }
    }
    pack(TAG_QUAD, best[0], best[1], best[2], best[3])
}

/// Calls `f` once per well-formed sub-signature of a partial pattern,
/// `colors` being the per-direction constraints in north/east/south/west
/// order. Duplicate keys are visited once per occurrence, which is what
/// multiset counting wants.
pub(crate) fn for_each_signature(colors: [Option<Color>; 4], mut f: impl FnMut(SigKey)) {
    for dir in 0..4 {
        if let Some(a) = colors[dir] {
            f(single_key(a));
        }
    }
    for dir in 0..4 {
        if let (Some(a), Some(b)) = (colors[dir], colors[(dir + 1) & 3]) {
            f(pair_key(a, b));
        }
    }
    for axis in 0..2 {
        if let (Some(a), Some(b)) = (colors[axis], colors[axis + 2]) {
            f(opposite_key(a, b));
        }
    }
    for dir in 0..4 {
        if let (Some(a), Some(b), Some(c)) =
            (colors[dir], colors[(dir + 1) & 3], colors[(dir + 2) & 3])
        {
            f(triple_key(a, b, c));
        }
    }
    if let (Some(a), Some(b), Some(c), Some(d)) = (colors[0], colors[1], colors[2], colors[3]) {
        f(quad_key([a, b, c, d]));
    }
}

/// Everything a free piece supplies: its sub-signatures read from the
/// canonical rotation. The shapes are rotation-invariant, so one pass
/// covers all four orientations.
pub(crate) fn for_each_piece_signature(piece: &Piece, f: impl FnMut(SigKey)) {
    let [n, e, s, w] = piece.edges;
    for_each_signature([Some(n), Some(e), Some(s), Some(w)], f);
}

/// The tightest single bucket that covers a cell's constraints, or
/// `None` when nothing is constrained yet.
pub(crate) fn most_specific_key(colors: [Option<Color>; 4]) -> Option<SigKey> {
    match colors {
        [Some(a), Some(b), Some(c), Some(d)] => Some(quad_key([a, b, c, d])),
        _ => {
            for dir in 0..4 {
                if let (Some(a), Some(b), Some(c)) =
                    (colors[dir], colors[(dir + 1) & 3], colors[(dir + 2) & 3])
                {
                    return Some(triple_key(a, b, c));
                }
            }
            for dir in 0..4 {
                if let (Some(a), Some(b)) = (colors[dir], colors[(dir + 1) & 3]) {
                    return Some(pair_key(a, b));
                }
            }
            for axis in 0..2 {
                if let (Some(a), Some(b)) = (colors[axis], colors[axis + 2]) {
                    return Some(opposite_key(a, b));
                }
            }
            if let Some(&color) = colors.iter().flatten().next() {
                return Some(single_key(color));
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_key_is_rotation_invariant() {
        let base = [1, 2, 3, 4];
        let turned = [4, 1, 2, 3];
        assert_eq!(quad_key(base), quad_key(turned));
        assert_eq!(quad_key([2, 3, 4, 1]), quad_key(base));
        // A genuinely different cycle gets a different key.
        assert_ne!(quad_key([1, 2, 4, 3]), quad_key(base));
    }

    #[test]
    fn opposite_pairs_are_unordered() {
        assert_eq!(opposite_key(3, 7), opposite_key(7, 3));
        assert_ne!(opposite_key(3, 7), opposite_key(3, 3));
    }

    #[test]
    fn adjacent_pairs_keep_their_order() {
        assert_ne!(pair_key(1, 2), pair_key(2, 1));
    }

    #[test]
    fn shapes_never_collide() {
        // Same colors under every tag must stay distinct.
        let keys = [
            single_key(1),
            pair_key(1, 0),
            opposite_key(1, 0),
            triple_key(1, 0, 0),
            quad_key([1, 0, 0, 0]),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    fn fan_out(colors: [Option<Color>; 4]) -> Vec<SigKey> {
        let mut keys = Vec::new();
        for_each_signature(colors, |key| keys.push(key));
        keys
    }

    #[test]
    fn full_pattern_fans_out_to_fifteen() {
        // 4 singles, 4 adjacent pairs, 2 opposite pairs, 4 triples, 1 quad.
        let keys = fan_out([Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(keys.len(), 15);
    }

    #[test]
    fn partial_patterns_fan_out_to_their_shapes() {
        // North + east: two singles and one adjacent pair.
        assert_eq!(fan_out([Some(1), Some(2), None, None]).len(), 3);
        // North + south: two singles and one opposite pair.
        let keys = fan_out([Some(1), None, Some(2), None]);
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&opposite_key(1, 2)));
        // Three consecutive: 3 singles, 2 pairs, 1 opposite, 1 triple.
        let keys = fan_out([Some(1), Some(2), Some(3), None]);
        assert_eq!(keys.len(), 7);
        assert!(keys.contains(&triple_key(1, 2, 3)));
        assert!(keys.contains(&opposite_key(1, 3)));
        // Nothing defined, nothing demanded.
        assert!(fan_out([None; 4]).is_empty());
    }

    #[test]
    fn duplicate_colors_fan_out_per_occurrence() {
        let keys = fan_out([Some(5), Some(5), None, None]);
        assert_eq!(keys.iter().filter(|&&k| k == single_key(5)).count(), 2);
    }

    #[test]
    fn most_specific_prefers_tighter_shapes() {
        assert_eq!(
            most_specific_key([Some(1), Some(2), Some(3), Some(4)]),
            Some(quad_key([1, 2, 3, 4]))
        );
        assert_eq!(
            most_specific_key([Some(1), Some(2), Some(3), None]),
            Some(triple_key(1, 2, 3))
        );
        // The triple wraps around west/north/east too.
        assert_eq!(
            most_specific_key([Some(2), Some(3), None, Some(1)]),
            Some(triple_key(1, 2, 3))
        );
        assert_eq!(
            most_specific_key([Some(1), Some(2), None, None]),
            Some(pair_key(1, 2))
        );
        assert_eq!(
            most_specific_key([Some(1), None, Some(2), None]),
            Some(opposite_key(1, 2))
        );
        assert_eq!(
            most_specific_key([None, None, Some(9), None]),
            Some(single_key(9))
        );
        assert_eq!(most_specific_key([None; 4]), None);
    }

    #[test]
    fn piece_supply_matches_a_full_cell_demand() {
        // A piece placed at rotation r shows a rotated pattern; the cell
        // demanding exactly that pattern must land in the piece's own
        // quad bucket.
        let piece = Piece {
            id: 0,
            edges: [1, 2, 3, 4],
        };
        let mut supplied = Vec::new();
        for_each_piece_signature(&piece, |key| supplied.push(key));
        for rotation in 0..4u8 {
            let shown = [
                Some(piece.edge_at(crate::piece::Direction::North, rotation)),
                Some(piece.edge_at(crate::piece::Direction::East, rotation)),
                Some(piece.edge_at(crate::piece::Direction::South, rotation)),
                Some(piece.edge_at(crate::piece::Direction::West, rotation)),
            ];
            let demanded = most_specific_key(shown).unwrap();
            assert!(supplied.contains(&demanded));
        }
    }
}
