//! Zero-copy filter views over blocks and vectors.
//!
//! Selection operators (WHERE, LIMIT, TOP-N) wrap a block in a filter view
//! instead of materializing a new block: the view holds a shared reference to
//! its delegate plus an explicit position remapping, and translates every
//! position-level read through that mapping. The delegate's value store,
//! accounting metadata and null mask are never copied.

use std::any::Any;
use std::sync::Arc;

use sidra_common::{Result, verify_arg};

use crate::block::{Block, BlockRef};
use crate::element_type::ElementType;
use crate::vector::{Vector, VectorRef};

/// A stateless, immutable decorator remapping logical positions onto a
/// subset, reordering or duplication of a delegate block's positions.
///
/// Position `i` of the view reads delegate position `positions[i]`. Entries
/// need not be unique or sorted, which supports reordering and duplication
/// (sampling, re-ranking). Value-store reads are *not* translated: value
/// indexes live in the delegate's store space, exactly as reported by the
/// translated [`Block::first_value_index`].
///
/// Filtering a filter view is legal; translation composes through the
/// delegate chain, one O(1) hop per layer.
pub struct FilterBlock {
    block: BlockRef,
    positions: Vec<usize>,
}

impl FilterBlock {
    /// Creates a filter view with validation.
    ///
    /// Convenience wrapper around [`try_new`](Self::try_new) that panics on
    /// validation errors.
    pub fn new(block: BlockRef, positions: Vec<usize>) -> FilterBlock {
        Self::try_new(block, positions).expect("try_new")
    }

    /// Creates a filter view over `block`.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-argument error if any entry of `positions` is
    /// not less than the delegate's position count.
    pub fn try_new(block: BlockRef, positions: Vec<usize>) -> Result<FilterBlock> {
        let count = block.position_count();
        verify_arg!(positions, positions.iter().all(|&p| p < count));
        Ok(FilterBlock { block, positions })
    }

    /// The delegate this view remaps.
    pub fn delegate(&self) -> &BlockRef {
        &self.block
    }

    /// The position remapping: view position `i` reads delegate position
    /// `positions()[i]`.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

impl Block for FilterBlock {
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        self
    }

    fn element_type(&self) -> ElementType {
        self.block.element_type()
    }

    fn position_count(&self) -> usize {
        self.positions.len()
    }

    fn is_null(&self, position: usize) -> bool {
        self.block.is_null(self.positions[position])
    }

    fn value_count(&self, position: usize) -> usize {
        self.block.value_count(self.positions[position])
    }

    fn first_value_index(&self, position: usize) -> usize {
        self.block.first_value_index(self.positions[position])
    }

    fn value_bytes_at(&self, value_index: usize) -> &[u8] {
        self.block.value_bytes_at(value_index)
    }

    fn filter(self: Arc<Self>, positions: Vec<usize>) -> Result<BlockRef> {
        Ok(Arc::new(FilterBlock::try_new(self, positions)?))
    }

    fn as_vector(self: Arc<Self>) -> Option<VectorRef> {
        let narrowable = self
            .positions
            .iter()
            .all(|&p| !self.block.is_null(p) && self.block.value_count(p) == 1);
        if !narrowable {
            return None;
        }
        FilterVector::try_new(self.block.clone(), self.positions.clone())
            .ok()
            .map(|vector| Arc::new(vector) as VectorRef)
    }
}

/// A filter view that is itself a vector: every selected delegate position is
/// non-null and single-valued, so the view is 1:1 in its own value space.
///
/// View value index `i` resolves to the delegate's value at
/// `delegate.first_value_index(positions[i])`; the delegate need not be
/// globally vector-shaped, only at the selected positions.
pub struct FilterVector {
    block: BlockRef,
    positions: Vec<usize>,
}

impl FilterVector {
    /// Creates a vector-shaped filter view with validation.
    ///
    /// Convenience wrapper around [`try_new`](Self::try_new) that panics on
    /// validation errors.
    pub fn new(block: BlockRef, positions: Vec<usize>) -> FilterVector {
        Self::try_new(block, positions).expect("try_new")
    }

    /// Creates a vector-shaped filter view over `block`.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-argument error if any entry of `positions` is
    /// out of range, or if any selected delegate position is null or not
    /// exactly single-valued.
    pub fn try_new(block: BlockRef, positions: Vec<usize>) -> Result<FilterVector> {
        let count = block.position_count();
        verify_arg!(positions, positions.iter().all(|&p| p < count));
        verify_arg!(
            block,
            positions
                .iter()
                .all(|&p| !block.is_null(p) && block.value_count(p) == 1)
        );
        Ok(FilterVector { block, positions })
    }
}

impl Block for FilterVector {
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        self
    }

    fn element_type(&self) -> ElementType {
        self.block.element_type()
    }

    fn position_count(&self) -> usize {
        self.positions.len()
    }

    fn is_null(&self, position: usize) -> bool {
        assert!(position < self.positions.len());
        false
    }

    fn value_count(&self, position: usize) -> usize {
        assert!(position < self.positions.len());
        1
    }

    fn first_value_index(&self, position: usize) -> usize {
        assert!(position < self.positions.len());
        position
    }

    fn value_bytes_at(&self, value_index: usize) -> &[u8] {
        let delegate_position = self.positions[value_index];
        self.block
            .value_bytes_at(self.block.first_value_index(delegate_position))
    }

    fn filter(self: Arc<Self>, positions: Vec<usize>) -> Result<BlockRef> {
        Ok(Arc::new(FilterVector::try_new(self, positions)?))
    }

    fn as_vector(self: Arc<Self>) -> Option<VectorRef> {
        Some(self)
    }
}

impl Vector for FilterVector {
    fn filter_vector(self: Arc<Self>, positions: Vec<usize>) -> Result<VectorRef> {
        Ok(Arc::new(FilterVector::try_new(self, positions)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes_block::BytesBlockBuilder;
    use crate::primitive_block::LongBlockBuilder;
    use std::hash::{DefaultHasher, Hash, Hasher};

    fn hash_of(block: &dyn Block) -> u64 {
        let mut hasher = DefaultHasher::new();
        block.hash(&mut hasher);
        hasher.finish()
    }

    fn sample_block() -> BlockRef {
        let mut builder = BytesBlockBuilder::new();
        builder.add_values([b"a" as &[u8], b"b"]);
        builder.add_null();
        builder.add_value(b"c");
        Arc::new(builder.build())
    }

    #[test]
    fn test_identity_permutation_equals_original() {
        let block = sample_block();
        let identity: Vec<usize> = (0..block.position_count()).collect();
        let view = block.clone().filter(identity).unwrap();

        assert_eq!(&*view, &*block);
        assert_eq!(hash_of(&*view), hash_of(&*block));
    }

    #[test]
    fn test_filter_preserves_order_and_duplicates() {
        let mut builder = LongBlockBuilder::new();
        builder.add_value(10);
        builder.add_value(20);
        builder.add_value(30);
        let block: BlockRef = Arc::new(builder.build());

        let view = block.filter(vec![2, 0, 0]).unwrap();
        assert_eq!(view.position_count(), 3);

        let value_at = |position: usize| {
            let index = view.first_value_index(position);
            i64::from_ne_bytes(view.value_bytes_at(index).try_into().unwrap())
        };
        assert_eq!(value_at(0), 30);
        assert_eq!(value_at(1), 10);
        assert_eq!(value_at(2), 10);
    }

    #[test]
    fn test_filter_translates_nulls_and_value_counts() {
        let block = sample_block();
        let view = block.filter(vec![2, 0]).unwrap();

        assert_eq!(view.position_count(), 2);
        assert!(!view.is_null(0));
        assert_eq!(view.value_count(0), 1);
        assert_eq!(view.value_bytes_at(view.first_value_index(0)), b"c");

        assert_eq!(view.value_count(1), 2);
        let first = view.first_value_index(1);
        assert_eq!(view.value_bytes_at(first), b"a");
        assert_eq!(view.value_bytes_at(first + 1), b"b");
    }

    #[test]
    fn test_empty_filter_is_a_zero_position_block() {
        let block = sample_block();
        let view = block.filter(vec![]).unwrap();
        assert_eq!(view.position_count(), 0);
        assert_eq!(view.element_type(), ElementType::Bytes);
    }

    #[test]
    fn test_out_of_range_position_is_rejected() {
        let block = sample_block();
        assert!(block.filter(vec![0, 3]).is_err());
    }

    #[test]
    fn test_filter_of_filter_composes() {
        let mut builder = LongBlockBuilder::new();
        for value in [1i64, 2, 3, 4, 5] {
            builder.add_value(value);
        }
        let block: BlockRef = Arc::new(builder.build());

        let inner = block.clone().filter(vec![4, 3, 2, 1, 0]).unwrap();
        let outer = inner.filter(vec![0, 2, 4]).unwrap();

        let direct = block.filter(vec![4, 2, 0]).unwrap();
        assert_eq!(&*outer, &*direct);
        assert_eq!(hash_of(&*outer), hash_of(&*direct));
    }

    #[test]
    fn test_filter_view_narrowing_skips_messy_positions() {
        // The delegate has a multi-valued and a null position, but the
        // selection avoids both.
        let block = sample_block();
        let view = block.clone().filter(vec![2, 2]).unwrap();
        let vector = view.as_vector().expect("selection is clean");
        assert_eq!(vector.position_count(), 2);
        assert_eq!(vector.value_bytes_at(0), b"c");
        assert_eq!(vector.value_bytes_at(1), b"c");

        let messy = block.filter(vec![0, 2]).unwrap();
        assert!(messy.as_vector().is_none());
    }

    #[test]
    fn test_narrowing_idempotence() {
        let mut builder = LongBlockBuilder::new();
        for value in [7i64, 8, 9] {
            builder.add_value(value);
        }
        let block: BlockRef = Arc::new(builder.build());
        let vector = block.clone().as_vector().expect("single-valued non-null");

        let positions = vec![2, 1, 1];
        let via_vector = vector.filter_vector(positions.clone()).unwrap();
        let via_block = block
            .filter(positions)
            .unwrap()
            .as_vector()
            .expect("filtered selection is clean");

        let via_vector: BlockRef = via_vector;
        let via_block: BlockRef = via_block;
        assert_eq!(&*via_vector, &*via_block);
        assert_eq!(hash_of(&*via_vector), hash_of(&*via_block));
    }

    #[test]
    fn test_filtered_vector_narrows_unconditionally() {
        let mut builder = BytesBlockBuilder::new();
        builder.add_value(b"x");
        builder.add_value(b"y");
        let block: BlockRef = Arc::new(builder.build());
        let vector = block.as_vector().unwrap();

        let filtered = vector.filter_vector(vec![1, 0, 1]).unwrap();
        let narrowed = filtered.clone().as_vector();
        assert!(narrowed.is_some());

        // And through the Block-level filter as well.
        let as_block: BlockRef = filtered;
        let view = as_block.filter(vec![0, 2]).unwrap();
        assert!(view.as_vector().is_some());
    }

    #[test]
    fn test_random_filters_match_materialized_blocks() {
        fastrand::seed(271828);

        for _ in 0..50 {
            let len = fastrand::usize(1..40);
            let mut builder = LongBlockBuilder::new();
            let mut expected_values = Vec::new();
            for _ in 0..len {
                let value = fastrand::i64(-1000..1000);
                builder.add_value(value);
                expected_values.push(value);
            }
            let block: BlockRef = Arc::new(builder.build());

            let positions: Vec<usize> =
                (0..fastrand::usize(0..60)).map(|_| fastrand::usize(..len)).collect();

            let view = block.filter(positions.clone()).unwrap();

            let mut materialized = LongBlockBuilder::new();
            for &p in &positions {
                materialized.add_value(expected_values[p]);
            }
            let materialized: BlockRef = Arc::new(materialized.build());

            assert_eq!(&*view, &*materialized);
            assert_eq!(hash_of(&*view), hash_of(&*materialized));
        }
    }
}
