use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::piece::Color;
use crate::sig::{self, SigKey, Signature};

/// Net multiset counters over edge signatures: free-piece supply counts
/// up, empty-cell demand counts down. Any key dipping below zero means
/// some constrained cell can no longer be filled from the free bag, so
/// the position is infeasible.
///
/// Keys whose counter returns to zero are dropped, which keeps two
/// trackers comparable with plain equality after mirrored updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureTracker {
    counters: HashMap<SigKey, i32>,
}

impl SignatureTracker {
    pub fn new() -> Self {
        SignatureTracker::default()
    }

    /// Net count for one signature; zero when untracked.
    pub fn net(&self, signature: Signature) -> i32 {
        self.counters.get(&signature.key()).copied().unwrap_or(0)
    }

    pub fn is_balanced(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }

    /// A free piece joins the bag: every sub-signature it offers counts
    /// up once per occurrence.
    pub fn add_supply(&mut self, edges: [Color; 4]) {
        let [n, e, s, w] = edges;
        self.apply([Some(n), Some(e), Some(s), Some(w)], 1);
    }

    /// A piece leaves the bag. Returns true when some counter went
    /// negative, meaning outstanding demand relied on this piece.
    pub fn remove_supply(&mut self, edges: [Color; 4]) -> bool {
        let [n, e, s, w] = edges;
        self.apply([Some(n), Some(e), Some(s), Some(w)], -1)
    }

    /// An empty cell starts demanding a partial pattern. Returns true
    /// when the demand outgrew the remaining supply.
    pub fn add_demand(&mut self, required: [Option<Color>; 4]) -> bool {
        self.apply(required, -1)
    }

    /// An empty cell stops demanding a partial pattern, either because a
    /// piece landed on it or because a neighbor was removed.
    pub fn remove_demand(&mut self, required: [Option<Color>; 4]) {
        self.apply(required, 1);
    }

    /// Fans `delta` out to every well-formed sub-signature and reports
    /// whether any counter ended up negative.
    fn apply(&mut self, colors: [Option<Color>; 4], delta: i32) -> bool {
        let counters = &mut self.counters;
        let mut negative = false;
        sig::for_each_signature(colors, |key| match counters.entry(key) {
            Entry::Occupied(mut occupied) => {
                let value = occupied.get_mut();
                *value += delta;
                if *value < 0 {
                    negative = true;
                }
                if *value == 0 {
                    occupied.remove();
                }
            }
            Entry::Vacant(vacant) => {
                if delta < 0 {
                    negative = true;
                }
                vacant.insert(delta);
            }
        });
        negative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::BORDER;

    #[test]
    fn supply_counts_every_occurrence() {
        let mut tracker = SignatureTracker::new();
        tracker.add_supply([3, 3, 3, 3]);
        // Four edges of one color supply the single four times over.
        assert_eq!(tracker.net(Signature::Single(3)), 4);
        assert_eq!(tracker.net(Signature::AdjacentPair(3, 3)), 4);
        assert_eq!(tracker.net(Signature::OppositePair(3, 3)), 2);
        assert_eq!(tracker.net(Signature::AdjacentTriple(3, 3, 3)), 4);
        assert_eq!(tracker.net(Signature::Quad([3, 3, 3, 3])), 1);
    }

    #[test]
    fn demand_draws_counters_down() {
        let mut tracker = SignatureTracker::new();
        tracker.add_supply([BORDER, 1, 2, BORDER]);
        assert!(!tracker.add_demand([Some(BORDER), None, None, Some(BORDER)]));
        assert_eq!(tracker.net(Signature::Single(BORDER)), 0);
        // The pair west-then-north is one of the piece's readings.
        assert_eq!(tracker.net(Signature::AdjacentPair(BORDER, BORDER)), 0);
    }

    #[test]
    fn unmet_demand_reports_negative() {
        let mut tracker = SignatureTracker::new();
        tracker.add_supply([1, 1, 2, 2]);
        // No edge of color 9 exists anywhere.
        assert!(tracker.add_demand([Some(9), None, None, None]));
        assert_eq!(tracker.net(Signature::Single(9)), -1);
    }

    #[test]
    fn removing_relied_upon_supply_reports_negative() {
        let mut tracker = SignatureTracker::new();
        tracker.add_supply([1, 2, 3, 4]);
        tracker.add_supply([1, 5, 6, 7]);
        assert!(!tracker.add_demand([Some(1), None, None, None]));
        // One single(1) left after the first removal, none after the second.
        assert!(!tracker.remove_supply([1, 2, 3, 4]));
        assert!(tracker.remove_supply([1, 5, 6, 7]));
    }

    #[test]
    fn mirrored_updates_leave_no_residue() {
        let mut tracker = SignatureTracker::new();
        tracker.add_supply([1, 2, 3, 4]);
        tracker.add_supply([4, 3, 2, 1]);
        assert!(!tracker.add_demand([Some(1), Some(2), None, None]));
        tracker.remove_demand([Some(1), Some(2), None, None]);
        tracker.remove_supply([4, 3, 2, 1]);
        tracker.remove_supply([1, 2, 3, 4]);
        assert!(tracker.is_balanced());
        assert_eq!(tracker, SignatureTracker::new());
    }

    #[test]
    fn opposite_demand_matches_either_orientation() {
        let mut tracker = SignatureTracker::new();
        tracker.add_supply([5, 0, 6, 0]);
        // The cell wants 6 on top and 5 below; the axis is the same.
        assert!(!tracker.add_demand([Some(6), None, Some(5), None]));
        assert_eq!(tracker.net(Signature::OppositePair(5, 6)), 0);
    }
}
