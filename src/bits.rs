/// Fixed-capacity bitset keyed by piece id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceBits {
    words: Vec<u64>,
}

impl PieceBits {
    pub fn with_capacity(pieces: usize) -> Self {
        PieceBits {
            words: vec![0; (pieces + 63) >> 6],
        }
    }

    #[inline(always)]
    pub fn insert(&mut self, index: usize) {
        self.words[index >> 6] |= 1u64 << (index & 63);
    }

    #[inline(always)]
    pub fn remove(&mut self, index: usize) {
        self.words[index >> 6] &= !(1u64 << (index & 63));
    }

    #[inline(always)]
    pub fn contains(&self, index: usize) -> bool {
        (self.words[index >> 6] & (1u64 << (index & 63))) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Set bits in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(slot, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some((slot << 6) | bit)
            })
        })
    }
}
