//! Blocks and vectors of variable-length byte sequences.
//!
//! This is the representative variable-length implementation of the block
//! contract. It also carries the [`ElementType::Composite`] tag: composite
//! aggregate state travels through the pipeline as opaque byte payloads with
//! the same storage layout.

use std::any::Any;
use std::sync::Arc;

use sidra_common::{Result, verify_arg};
use sidra_shared_vec::SharedVec;

use crate::block::{Block, BlockRef, validate_accounting};
use crate::element_type::ElementType;
use crate::filter::{FilterBlock, FilterVector};
use crate::null_mask::{NullMask, NullMaskBuilder};
use crate::offsets::Offsets;
use crate::values::BytesValues;
use crate::vector::{Vector, VectorRef};

/// A block of variable-length byte sequences.
///
/// Values live in a dense [`BytesValues`] store. When `first_value_indexes`
/// is present it holds `position_count + 1` entries and position `i` owns the
/// value-index range `first_value_indexes[i]..first_value_indexes[i + 1]`;
/// when absent, every position holds exactly one value and the block carries
/// no nulls (the fast path produced by builders for uniform data).
pub struct BytesBlock {
    values: BytesValues,
    first_value_indexes: Option<Offsets>,
    nulls: NullMask,
    element_type: ElementType,
}

impl BytesBlock {
    /// Creates a block with validation.
    ///
    /// Convenience wrapper around [`try_new`](Self::try_new) that panics on
    /// validation errors.
    pub fn new(
        values: BytesValues,
        first_value_indexes: Option<Offsets>,
        nulls: NullMask,
        element_type: ElementType,
    ) -> BytesBlock {
        Self::try_new(values, first_value_indexes, nulls, element_type).expect("try_new")
    }

    /// Creates a block over an existing value store and accounting metadata.
    ///
    /// Validates the structural invariants:
    /// - the element type is a byte-payload kind (`Bytes` or `Composite`)
    /// - `first_value_indexes`, when present, covers `nulls.len()` positions,
    ///   starts at 0 and ends exactly at the store size
    /// - null positions own zero values, valid positions at least one
    /// - when `first_value_indexes` is absent, the store is 1:1 with the
    ///   positions and the mask carries no nulls
    ///
    /// # Errors
    ///
    /// Fails with an invalid-argument error for a fixed-width element type
    /// and a data-integrity error for any metadata inconsistency.
    pub fn try_new(
        values: BytesValues,
        first_value_indexes: Option<Offsets>,
        nulls: NullMask,
        element_type: ElementType,
    ) -> Result<BytesBlock> {
        verify_arg!(element_type, element_type.requires_offsets());
        validate_accounting(values.len(), first_value_indexes.as_ref(), &nulls)?;
        Ok(BytesBlock {
            values,
            first_value_indexes,
            nulls,
            element_type,
        })
    }

    /// The underlying value store.
    pub fn values(&self) -> &BytesValues {
        &self.values
    }

    /// Returns the byte payload at the given value-store index.
    ///
    /// # Panics
    ///
    /// Panics if `value_index` is out of bounds.
    pub fn bytes_at(&self, value_index: usize) -> &[u8] {
        self.values.get(value_index)
    }
}

impl Block for BytesBlock {
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        self
    }

    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn position_count(&self) -> usize {
        self.nulls.len()
    }

    fn is_null(&self, position: usize) -> bool {
        self.nulls.is_null(position)
    }

    fn value_count(&self, position: usize) -> usize {
        if self.nulls.is_null(position) {
            return 0;
        }
        match &self.first_value_indexes {
            Some(indexes) => {
                let range = indexes.range_at(position);
                (range.end - range.start) as usize
            }
            None => 1,
        }
    }

    fn first_value_index(&self, position: usize) -> usize {
        assert!(position < self.position_count());
        match &self.first_value_indexes {
            Some(indexes) => indexes[position] as usize,
            None => position,
        }
    }

    fn value_bytes_at(&self, value_index: usize) -> &[u8] {
        self.values.get(value_index)
    }

    fn filter(self: Arc<Self>, positions: Vec<usize>) -> Result<BlockRef> {
        Ok(Arc::new(FilterBlock::try_new(self, positions)?))
    }

    fn as_vector(self: Arc<Self>) -> Option<VectorRef> {
        if self.nulls.has_nulls() {
            return None;
        }
        let uniform = match &self.first_value_indexes {
            None => true,
            Some(indexes) => indexes.as_slice().windows(2).all(|w| w[1] - w[0] == 1),
        };
        if !uniform {
            return None;
        }
        Some(Arc::new(BytesVector {
            values: self.values.clone(),
            element_type: self.element_type,
        }))
    }
}

/// A dense 1:1 vector of variable-length byte sequences: position `i` reads
/// entry `i` of the store, with no null or value-count accounting at all.
pub struct BytesVector {
    values: BytesValues,
    element_type: ElementType,
}

impl BytesVector {
    /// Creates a vector over the given store with the `Bytes` element type.
    pub fn new(values: BytesValues) -> BytesVector {
        BytesVector {
            values,
            element_type: ElementType::Bytes,
        }
    }

    /// Creates a vector carrying the given byte-payload element type.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-argument error for a fixed-width element type.
    pub fn try_with_element_type(
        values: BytesValues,
        element_type: ElementType,
    ) -> Result<BytesVector> {
        verify_arg!(element_type, element_type.requires_offsets());
        Ok(BytesVector {
            values,
            element_type,
        })
    }

    /// Returns the byte payload at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of bounds.
    pub fn bytes_at(&self, position: usize) -> &[u8] {
        self.values.get(position)
    }
}

impl Block for BytesVector {
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        self
    }

    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn position_count(&self) -> usize {
        self.values.len()
    }

    fn is_null(&self, position: usize) -> bool {
        assert!(position < self.values.len());
        false
    }

    fn value_count(&self, position: usize) -> usize {
        assert!(position < self.values.len());
        1
    }

    fn first_value_index(&self, position: usize) -> usize {
        assert!(position < self.values.len());
        position
    }

    fn value_bytes_at(&self, value_index: usize) -> &[u8] {
        self.values.get(value_index)
    }

    fn filter(self: Arc<Self>, positions: Vec<usize>) -> Result<BlockRef> {
        Ok(Arc::new(FilterVector::try_new(self, positions)?))
    }

    fn as_vector(self: Arc<Self>) -> Option<VectorRef> {
        Some(self)
    }
}

impl Vector for BytesVector {
    fn filter_vector(self: Arc<Self>, positions: Vec<usize>) -> Result<VectorRef> {
        Ok(Arc::new(FilterVector::try_new(self, positions)?))
    }
}

/// Incrementally builds a [`BytesBlock`] position by position.
///
/// When the accumulated data turns out to be uniformly single-valued and
/// non-null, `build` emits a block with no accounting metadata, so narrowing
/// it to a vector is free.
pub struct BytesBlockBuilder {
    element_type: ElementType,
    data: Vec<u8>,
    entry_offsets: Offsets,
    first_value_indexes: Offsets,
    nulls: NullMaskBuilder,
    multi_valued: bool,
}

impl BytesBlockBuilder {
    /// A builder for `Bytes` blocks.
    pub fn new() -> BytesBlockBuilder {
        Self::with_element_type(ElementType::Bytes)
    }

    /// A builder for `Composite` blocks.
    pub fn composite() -> BytesBlockBuilder {
        Self::with_element_type(ElementType::Composite)
    }

    fn with_element_type(element_type: ElementType) -> BytesBlockBuilder {
        BytesBlockBuilder {
            element_type,
            data: Vec::new(),
            entry_offsets: Offsets::new(),
            first_value_indexes: Offsets::new(),
            nulls: NullMaskBuilder::new(),
            multi_valued: false,
        }
    }

    /// Appends a single-valued position.
    pub fn add_value(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
        self.entry_offsets.push_length(value.len());
        self.first_value_indexes.push_length(1);
        self.nulls.add_non_null();
    }

    /// Appends a null position.
    pub fn add_null(&mut self) {
        self.first_value_indexes.push_length(0);
        self.nulls.add_null();
    }

    /// Appends a multi-valued position holding all values of the iterator,
    /// in order. An empty iterator is normalized into a null position: a
    /// well-formed block has no zero-valued non-null positions.
    pub fn add_values<'a>(&mut self, values: impl IntoIterator<Item = &'a [u8]>) {
        let mut count = 0usize;
        for value in values {
            self.data.extend_from_slice(value);
            self.entry_offsets.push_length(value.len());
            count += 1;
        }
        match count {
            0 => {
                self.first_value_indexes.push_length(0);
                self.nulls.add_null();
            }
            1 => {
                self.first_value_indexes.push_length(1);
                self.nulls.add_non_null();
            }
            n => {
                self.first_value_indexes.push_length(n);
                self.nulls.add_non_null();
                self.multi_valued = true;
            }
        }
    }

    /// The number of positions added so far.
    pub fn position_count(&self) -> usize {
        self.nulls.len()
    }

    /// Consumes the builder and returns the block.
    pub fn build(self) -> BytesBlock {
        let values = BytesValues::try_new(SharedVec::from_vec(self.data), self.entry_offsets)
            .expect("try_new");
        let nulls = self.nulls.build();
        let first_value_indexes = if nulls.has_nulls() || self.multi_valued {
            Some(self.first_value_indexes)
        } else {
            None
        };
        BytesBlock::new(values, first_value_indexes, nulls, self.element_type)
    }
}

impl Default for BytesBlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sum of per-position value counts must cover the addressable store.
    fn assert_counts_cover_store(block: &dyn Block, store_len: usize) {
        let total: usize = (0..block.position_count())
            .map(|p| block.value_count(p))
            .sum();
        assert_eq!(total, store_len);
    }

    #[test]
    fn test_multi_value_null_scenario() {
        // Three positions: ["a", "b"], null, "c".
        let values = BytesValues::from_slices([b"a" as &[u8], b"b", b"c"]);
        let first_value_indexes = Offsets::from_slice(&[0, 2, 2, 3]).unwrap();
        let nulls = NullMask::from_bools(&[false, true, false]);
        let block = BytesBlock::try_new(
            values,
            Some(first_value_indexes),
            nulls,
            ElementType::Bytes,
        )
        .unwrap();

        assert_eq!(block.position_count(), 3);
        assert_eq!(block.value_count(0), 2);
        assert!(block.is_null(1));
        assert_eq!(block.value_count(1), 0);
        assert_eq!(block.value_count(2), 1);
        assert_eq!(block.first_value_index(0), 0);
        assert_eq!(block.first_value_index(2), 2);
        assert_eq!(block.bytes_at(0), b"a");
        assert_eq!(block.bytes_at(1), b"b");
        assert_eq!(block.bytes_at(2), b"c");
        assert_counts_cover_store(&block, 3);

        let block: BlockRef = Arc::new(block);
        assert!(block.clone().as_vector().is_none());

        let view = block.filter(vec![2, 0]).unwrap();
        assert_eq!(view.position_count(), 2);
        assert_eq!(view.value_count(0), 1);
        assert_eq!(view.value_bytes_at(view.first_value_index(0)), b"c");
        assert_eq!(view.value_count(1), 2);
        let first = view.first_value_index(1);
        assert_eq!(view.value_bytes_at(first), b"a");
        assert_eq!(view.value_bytes_at(first + 1), b"b");
    }

    #[test]
    fn test_builder_matches_direct_construction() {
        let mut builder = BytesBlockBuilder::new();
        builder.add_values([b"a" as &[u8], b"b"]);
        builder.add_null();
        builder.add_value(b"c");
        assert_eq!(builder.position_count(), 3);
        let built: BlockRef = Arc::new(builder.build());

        let direct: BlockRef = Arc::new(BytesBlock::new(
            BytesValues::from_slices([b"a" as &[u8], b"b", b"c"]),
            Some(Offsets::from_slice(&[0, 2, 2, 3]).unwrap()),
            NullMask::from_bools(&[false, true, false]),
            ElementType::Bytes,
        ));

        assert_eq!(&*built, &*direct);
    }

    #[test]
    fn test_builder_normalizes_empty_entry_to_null() {
        let mut builder = BytesBlockBuilder::new();
        builder.add_value(b"x");
        builder.add_values(std::iter::empty::<&[u8]>());
        let block = builder.build();

        assert!(block.is_null(1));
        assert_eq!(block.value_count(1), 0);
    }

    #[test]
    fn test_uniform_builder_output_narrows_for_free() {
        let mut builder = BytesBlockBuilder::new();
        builder.add_value(b"a");
        builder.add_value(b"b");
        builder.add_value(b"c");
        let block = builder.build();
        assert!(block.first_value_indexes.is_none());

        let block: BlockRef = Arc::new(block);
        let vector = block.clone().as_vector().expect("uniform data narrows");
        assert_eq!(vector.position_count(), 3);
        assert_eq!(vector.value_bytes_at(1), b"b");

        // Structurally equal to the block it came from.
        let vector: BlockRef = vector;
        assert_eq!(&*vector, &*block);
    }

    #[test]
    fn test_all_single_valued_with_explicit_indexes_narrows() {
        let block: BlockRef = Arc::new(BytesBlock::new(
            BytesValues::from_slices([b"a" as &[u8], b"b"]),
            Some(Offsets::from_slice(&[0, 1, 2]).unwrap()),
            NullMask::no_nulls(2),
            ElementType::Bytes,
        ));
        assert!(block.as_vector().is_some());
    }

    #[test]
    fn test_composite_blocks_are_distinct_from_bytes() {
        let mut builder = BytesBlockBuilder::new();
        builder.add_value(b"state");
        let bytes: BlockRef = Arc::new(builder.build());

        let mut builder = BytesBlockBuilder::composite();
        builder.add_value(b"state");
        let composite: BlockRef = Arc::new(builder.build());

        assert_eq!(composite.element_type(), ElementType::Composite);
        assert_ne!(&*bytes, &*composite);
    }

    #[test]
    fn test_rejects_fixed_width_element_type() {
        let result = BytesBlock::try_new(
            BytesValues::empty(),
            None,
            NullMask::no_nulls(0),
            ElementType::Long,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_inconsistent_accounting() {
        // Index count does not match the position count.
        let result = BytesBlock::try_new(
            BytesValues::from_slices([b"a" as &[u8]]),
            Some(Offsets::from_slice(&[0, 1]).unwrap()),
            NullMask::no_nulls(2),
            ElementType::Bytes,
        );
        assert!(result.is_err());

        // Final index short of the store size.
        let result = BytesBlock::try_new(
            BytesValues::from_slices([b"a" as &[u8], b"b"]),
            Some(Offsets::from_slice(&[0, 1]).unwrap()),
            NullMask::no_nulls(1),
            ElementType::Bytes,
        );
        assert!(result.is_err());

        // A null position owning a value.
        let result = BytesBlock::try_new(
            BytesValues::from_slices([b"a" as &[u8]]),
            Some(Offsets::from_slice(&[0, 1]).unwrap()),
            NullMask::from_bools(&[true]),
            ElementType::Bytes,
        );
        assert!(result.is_err());

        // A zero-valued position that is not marked null.
        let result = BytesBlock::try_new(
            BytesValues::from_slices([b"a" as &[u8]]),
            Some(Offsets::from_slice(&[0, 0, 1]).unwrap()),
            NullMask::no_nulls(2),
            ElementType::Bytes,
        );
        assert!(result.is_err());

        // Implicit 1:1 accounting with a null mask present.
        let result = BytesBlock::try_new(
            BytesValues::from_slices([b"a" as &[u8], b"b"]),
            None,
            NullMask::from_bools(&[false, true]),
            ElementType::Bytes,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_counts_cover_store_with_nulls_and_multis() {
        let mut builder = BytesBlockBuilder::new();
        builder.add_null();
        builder.add_values([b"p" as &[u8], b"q", b"r"]);
        builder.add_value(b"s");
        builder.add_null();
        let block = builder.build();
        assert_counts_cover_store(&block, 4);
    }

    #[test]
    fn test_vector_reads() {
        let vector = BytesVector::new(BytesValues::from_slices([b"a" as &[u8], b"bc"]));
        assert_eq!(vector.position_count(), 2);
        assert_eq!(vector.bytes_at(1), b"bc");
        assert!(!vector.is_null(0));
        assert_eq!(vector.value_count(0), 1);
        assert_eq!(vector.first_value_index(1), 1);
    }

    #[test]
    #[should_panic]
    fn test_position_out_of_bounds_panics() {
        let mut builder = BytesBlockBuilder::new();
        builder.add_value(b"a");
        let block = builder.build();
        block.is_null(1);
    }
}
