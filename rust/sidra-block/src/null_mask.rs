//! Per-position null tracking for blocks.

/// Tracks which logical positions of a block are null.
///
/// Three representations keep the common cases cheap:
/// - `NoNulls`: every position is valid; no per-position storage. This is the
///   fast path and the only representation a vector-shaped block may carry.
/// - `AllNull`: every position is null.
/// - `Mask`: mixed nullness, bit-packed into LSB-ordered `u64` words where a
///   set bit marks the position as null. Bits at or beyond `len` are kept
///   zero.
#[derive(Debug, Clone)]
pub enum NullMask {
    /// All positions are valid.
    NoNulls(usize),

    /// All positions are null.
    AllNull(usize),

    /// Mixed nullness; a set bit at position `i` marks position `i` as null.
    Mask { words: Vec<u64>, len: usize },
}

impl NullMask {
    /// A mask of `len` valid positions.
    pub fn no_nulls(len: usize) -> NullMask {
        NullMask::NoNulls(len)
    }

    /// A mask of `len` null positions.
    pub fn all_null(len: usize) -> NullMask {
        NullMask::AllNull(len)
    }

    /// Builds a mask from per-position nullness flags, collapsing to a
    /// trivial representation when the flags are uniform.
    pub fn from_bools(nulls: &[bool]) -> NullMask {
        let mut builder = NullMaskBuilder::new();
        for &null in nulls {
            if null {
                builder.add_null();
            } else {
                builder.add_non_null();
            }
        }
        builder.build()
    }

    /// Returns the number of positions tracked by this mask.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            NullMask::NoNulls(len) => *len,
            NullMask::AllNull(len) => *len,
            NullMask::Mask { len, .. } => *len,
        }
    }

    /// Returns `true` if the mask tracks no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the position is null.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of bounds.
    #[inline]
    pub fn is_null(&self, position: usize) -> bool {
        assert!(position < self.len());
        match self {
            NullMask::NoNulls(_) => false,
            NullMask::AllNull(_) => true,
            NullMask::Mask { words, .. } => words[position / 64] >> (position % 64) & 1 != 0,
        }
    }

    /// Returns `true` if any position is null.
    #[inline]
    pub fn has_nulls(&self) -> bool {
        match self {
            NullMask::NoNulls(_) => false,
            NullMask::AllNull(len) => *len > 0,
            NullMask::Mask { words, .. } => words.iter().any(|&w| w != 0),
        }
    }

    /// Returns the number of null positions.
    pub fn null_count(&self) -> usize {
        match self {
            NullMask::NoNulls(_) => 0,
            NullMask::AllNull(len) => *len,
            NullMask::Mask { words, .. } => {
                words.iter().map(|w| w.count_ones() as usize).sum()
            }
        }
    }
}

/// Equality on observable nullness: two masks are equal iff they track the
/// same number of positions with the same per-position nullness, regardless
/// of representation.
impl PartialEq for NullMask {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        match (self, other) {
            (NullMask::NoNulls(_), NullMask::NoNulls(_)) => true,
            (NullMask::AllNull(_), NullMask::AllNull(_)) => true,
            _ => (0..self.len()).all(|i| self.is_null(i) == other.is_null(i)),
        }
    }
}

impl Eq for NullMask {}

/// Incrementally builds a [`NullMask`], collapsing to the trivial
/// representations when the added positions are uniform.
pub struct NullMaskBuilder {
    mask: NullMask,
}

impl NullMaskBuilder {
    pub fn new() -> NullMaskBuilder {
        NullMaskBuilder {
            mask: NullMask::NoNulls(0),
        }
    }

    /// Appends a null position.
    pub fn add_null(&mut self) {
        match &mut self.mask {
            NullMask::NoNulls(len) => {
                if *len == 0 {
                    self.mask = NullMask::AllNull(1);
                } else {
                    let len = *len;
                    let mut words = vec![0u64; (len + 1).div_ceil(64)];
                    words[len / 64] |= 1 << (len % 64);
                    self.mask = NullMask::Mask {
                        words,
                        len: len + 1,
                    };
                }
            }
            NullMask::AllNull(len) => *len += 1,
            NullMask::Mask { words, len } => {
                if *len % 64 == 0 {
                    words.push(0);
                }
                words[*len / 64] |= 1 << (*len % 64);
                *len += 1;
            }
        }
    }

    /// Appends a valid (non-null) position.
    pub fn add_non_null(&mut self) {
        match &mut self.mask {
            NullMask::NoNulls(len) => *len += 1,
            NullMask::AllNull(len) => {
                if *len == 0 {
                    self.mask = NullMask::NoNulls(1);
                } else {
                    let len = *len;
                    let mut words = vec![u64::MAX; len / 64];
                    let tail = len % 64;
                    if tail != 0 {
                        words.push((1u64 << tail) - 1);
                    }
                    if words.len() * 64 < len + 1 {
                        words.push(0);
                    }
                    self.mask = NullMask::Mask {
                        words,
                        len: len + 1,
                    };
                }
            }
            NullMask::Mask { words, len } => {
                if *len % 64 == 0 {
                    words.push(0);
                }
                *len += 1;
            }
        }
    }

    /// Returns the number of positions added so far.
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Consumes the builder and returns the mask.
    pub fn build(self) -> NullMask {
        self.mask
    }
}

impl Default for NullMaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_masks() {
        let mask = NullMask::no_nulls(4);
        assert_eq!(mask.len(), 4);
        assert!(!mask.has_nulls());
        assert_eq!(mask.null_count(), 0);
        assert!(!mask.is_null(3));

        let mask = NullMask::all_null(4);
        assert!(mask.has_nulls());
        assert_eq!(mask.null_count(), 4);
        assert!(mask.is_null(0));
    }

    #[test]
    fn test_builder_collapses_uniform_runs() {
        let mut builder = NullMaskBuilder::new();
        for _ in 0..5 {
            builder.add_non_null();
        }
        assert!(matches!(builder.build(), NullMask::NoNulls(5)));

        let mut builder = NullMaskBuilder::new();
        for _ in 0..5 {
            builder.add_null();
        }
        assert!(matches!(builder.build(), NullMask::AllNull(5)));
    }

    #[test]
    fn test_builder_mixed() {
        let mut builder = NullMaskBuilder::new();
        builder.add_non_null();
        builder.add_null();
        builder.add_non_null();
        let mask = builder.build();

        assert_eq!(mask.len(), 3);
        assert!(!mask.is_null(0));
        assert!(mask.is_null(1));
        assert!(!mask.is_null(2));
        assert_eq!(mask.null_count(), 1);
    }

    #[test]
    fn test_builder_null_run_then_non_null() {
        let mut builder = NullMaskBuilder::new();
        for _ in 0..70 {
            builder.add_null();
        }
        builder.add_non_null();
        builder.add_null();
        let mask = builder.build();

        assert_eq!(mask.len(), 72);
        assert!(mask.is_null(69));
        assert!(!mask.is_null(70));
        assert!(mask.is_null(71));
        assert_eq!(mask.null_count(), 71);
    }

    #[test]
    fn test_word_boundary() {
        let mut builder = NullMaskBuilder::new();
        for i in 0..130 {
            if i % 3 == 0 {
                builder.add_null();
            } else {
                builder.add_non_null();
            }
        }
        let mask = builder.build();
        for i in 0..130 {
            assert_eq!(mask.is_null(i), i % 3 == 0, "position {i}");
        }
    }

    #[test]
    fn test_from_bools() {
        let mask = NullMask::from_bools(&[false, true, false]);
        assert!(mask.is_null(1));
        assert!(!mask.is_null(2));

        assert!(matches!(
            NullMask::from_bools(&[false, false]),
            NullMask::NoNulls(2)
        ));
        assert!(matches!(
            NullMask::from_bools(&[true, true]),
            NullMask::AllNull(2)
        ));
    }

    #[test]
    fn test_equality_ignores_representation() {
        let trivial = NullMask::no_nulls(3);
        let mut builder = NullMaskBuilder::new();
        builder.add_non_null();
        builder.add_non_null();
        builder.add_non_null();
        assert_eq!(trivial, builder.build());

        assert_ne!(NullMask::no_nulls(3), NullMask::no_nulls(4));
        assert_ne!(NullMask::no_nulls(3), NullMask::all_null(3));
        assert_eq!(
            NullMask::from_bools(&[true, false]),
            NullMask::from_bools(&[true, false])
        );
    }

    #[test]
    #[should_panic]
    fn test_is_null_out_of_bounds() {
        let mask = NullMask::no_nulls(2);
        mask.is_null(2);
    }
}
