use std::collections::HashMap;

use crate::bits::PieceBits;
use crate::piece::Piece;
use crate::sig::{self, SigKey, Signature};

/// Supply-side mirror of the tracker: for every signature a free piece
/// offers, a bucket of the piece ids offering it. Lets the board answer
/// "which free pieces could sit on this cell" from one bucket instead of
/// scanning the whole bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateIndex {
    buckets: HashMap<SigKey, PieceBits>,
    capacity: usize,
}

impl CandidateIndex {
    pub fn new(piece_count: usize) -> Self {
        CandidateIndex {
            buckets: HashMap::new(),
            capacity: piece_count,
        }
    }

    /// Registers a piece that just became free.
    pub fn insert(&mut self, piece: &Piece) {
        let capacity = self.capacity;
        let buckets = &mut self.buckets;
        sig::for_each_piece_signature(piece, |key| {
            buckets
                .entry(key)
                .or_insert_with(|| PieceBits::with_capacity(capacity))
                .insert(piece.id as usize);
        });
    }

    /// Unregisters a piece that is no longer free. Empty buckets are
    /// dropped so mirrored updates compare equal.
    pub fn remove(&mut self, piece: &Piece) {
        let buckets = &mut self.buckets;
        sig::for_each_piece_signature(piece, |key| {
            if let Some(bucket) = buckets.get_mut(&key) {
                bucket.remove(piece.id as usize);
                if bucket.is_empty() {
                    buckets.remove(&key);
                }
            }
        });
    }

    pub fn bucket(&self, signature: Signature) -> Option<&PieceBits> {
        self.buckets.get(&signature.key())
    }

    pub(crate) fn bucket_by_key(&self, key: SigKey) -> Option<&PieceBits> {
        self.buckets.get(&key)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
