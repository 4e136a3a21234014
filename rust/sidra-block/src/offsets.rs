//! A collection of offsets for range-addressed data.

use std::ops::Range;

use sidra_common::{Result, verify_data};

/// A monotonically non-decreasing sequence of `u64` offsets, where each pair
/// of adjacent offsets defines the range of a single item. The collection
/// always holds `item_count + 1` entries, the first being the start position
/// of the first item.
///
/// Offsets serve two roles in the block layer: byte ranges of entries inside a
/// variable-length value store, and `first_value_indexes` accounting that maps
/// a logical position to its range of value-store indexes.
#[derive(Debug, Clone)]
pub struct Offsets(Vec<u64>);

impl Offsets {
    /// Creates a new empty `Offsets` collection with a single offset at 0.
    pub fn new() -> Offsets {
        Self::with_capacity(0)
    }

    /// Creates a new `Offsets` collection with space reserved for `capacity`
    /// items.
    pub fn with_capacity(capacity: usize) -> Offsets {
        let mut buf = Vec::with_capacity(capacity + 1);
        buf.push(0);
        Offsets(buf)
    }

    /// Creates an `Offsets` collection from a raw offset sequence.
    ///
    /// # Errors
    ///
    /// Fails with a data-integrity error if the sequence is empty or not
    /// monotonically non-decreasing.
    pub fn from_slice(offsets: &[u64]) -> Result<Offsets> {
        verify_data!(offsets, !offsets.is_empty());
        verify_data!(offsets, offsets.windows(2).all(|w| w[0] <= w[1]));
        Ok(Offsets(offsets.to_vec()))
    }

    /// Returns the number of items represented by these offsets.
    ///
    /// This is one less than the number of stored offsets.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.0.len() - 1
    }

    /// Returns `true` if the collection contains no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Returns a reference to the underlying slice of offsets.
    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Returns the first offset, the start position of the first item.
    #[inline]
    pub fn first(&self) -> u64 {
        self.0[0]
    }

    /// Returns the last offset, which marks the end of the last item.
    #[inline]
    pub fn last(&self) -> u64 {
        *self.0.last().expect("at least one offset")
    }

    /// Returns the total length of all items combined.
    #[inline]
    pub fn span(&self) -> u64 {
        self.last() - self.first()
    }

    /// Returns the range of the item at a given logical index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= item_count()`.
    #[inline]
    pub fn range_at(&self, index: usize) -> Range<u64> {
        self.0[index]..self.0[index + 1]
    }

    /// Adds a new offset by incrementing the last offset by the given length.
    #[inline]
    pub fn push_length(&mut self, len: usize) {
        let last = self.last();
        self.0.push(last + len as u64);
    }

    /// Appends `count` zero-sized items by repeating the last offset.
    #[inline]
    pub fn push_empty(&mut self, count: usize) {
        let last = self.last();
        self.0.resize(self.0.len() + count, last);
    }
}

impl Default for Offsets {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for Offsets {
    type Target = [u64];

    #[inline]
    fn deref(&self) -> &[u64] {
        self.as_slice()
    }
}
