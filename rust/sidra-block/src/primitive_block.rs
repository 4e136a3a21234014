//! Blocks and vectors of fixed-width primitive values.
//!
//! One generic implementation covers every fixed-width [`ElementType`]
//! through the [`PrimitiveElement`] binding; the observed per-type
//! replication is mechanical, so it is expressed here as monomorphization
//! rather than duplicated source. Values live in a contiguous
//! `SharedVec<T>` with no per-value heap object.

use std::any::Any;
use std::sync::Arc;

use sidra_common::Result;
use sidra_shared_vec::SharedVec;

use crate::block::{Block, BlockRef, validate_accounting};
use crate::element_type::ElementType;
use crate::filter::{FilterBlock, FilterVector};
use crate::null_mask::{NullMask, NullMaskBuilder};
use crate::offsets::Offsets;
use crate::values::PrimitiveElement;
use crate::vector::{Vector, VectorRef};

/// A block of fixed-width primitive values.
///
/// Accounting metadata follows the same contract as
/// [`BytesBlock`](crate::bytes_block::BytesBlock): optional
/// `first_value_indexes` for multi-valued data, a [`NullMask`], and an
/// implicit 1:1 mapping when neither is needed.
pub struct PrimitiveBlock<T: PrimitiveElement> {
    values: SharedVec<T>,
    first_value_indexes: Option<Offsets>,
    nulls: NullMask,
}

impl<T: PrimitiveElement> PrimitiveBlock<T> {
    /// Creates a block with validation.
    ///
    /// Convenience wrapper around [`try_new`](Self::try_new) that panics on
    /// validation errors.
    pub fn new(
        values: SharedVec<T>,
        first_value_indexes: Option<Offsets>,
        nulls: NullMask,
    ) -> PrimitiveBlock<T> {
        Self::try_new(values, first_value_indexes, nulls).expect("try_new")
    }

    /// Creates a block over an existing value store and accounting metadata,
    /// validating the same structural invariants as the byte-sequence
    /// implementation.
    pub fn try_new(
        values: SharedVec<T>,
        first_value_indexes: Option<Offsets>,
        nulls: NullMask,
    ) -> Result<PrimitiveBlock<T>> {
        validate_accounting(values.len(), first_value_indexes.as_ref(), &nulls)?;
        Ok(PrimitiveBlock {
            values,
            first_value_indexes,
            nulls,
        })
    }

    /// The underlying value store.
    pub fn values(&self) -> &SharedVec<T> {
        &self.values
    }

    /// Returns the value at the given value-store index.
    ///
    /// # Panics
    ///
    /// Panics if `value_index` is out of bounds.
    pub fn value_at(&self, value_index: usize) -> T {
        *self.values.at(value_index)
    }
}

impl<T: PrimitiveElement> Block for PrimitiveBlock<T> {
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        self
    }

    fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
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
        bytemuck::bytes_of(self.values.at(value_index))
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
        Some(Arc::new(PrimitiveVector {
            values: self.values.clone(),
        }))
    }
}

/// A dense 1:1 vector of fixed-width primitive values.
pub struct PrimitiveVector<T: PrimitiveElement> {
    values: SharedVec<T>,
}

impl<T: PrimitiveElement> PrimitiveVector<T> {
    /// Creates a vector over the given store.
    pub fn new(values: SharedVec<T>) -> PrimitiveVector<T> {
        PrimitiveVector { values }
    }

    /// Returns the value at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of bounds.
    pub fn value_at(&self, position: usize) -> T {
        *self.values.at(position)
    }
}

impl<T: PrimitiveElement> Block for PrimitiveVector<T> {
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        self
    }

    fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
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
        bytemuck::bytes_of(self.values.at(value_index))
    }

    fn filter(self: Arc<Self>, positions: Vec<usize>) -> Result<BlockRef> {
        Ok(Arc::new(FilterVector::try_new(self, positions)?))
    }

    fn as_vector(self: Arc<Self>) -> Option<VectorRef> {
        Some(self)
    }
}

impl<T: PrimitiveElement> Vector for PrimitiveVector<T> {
    fn filter_vector(self: Arc<Self>, positions: Vec<usize>) -> Result<VectorRef> {
        Ok(Arc::new(FilterVector::try_new(self, positions)?))
    }
}

/// Incrementally builds a [`PrimitiveBlock`] position by position, dropping
/// the accounting metadata when the data turns out to be uniformly
/// single-valued and non-null.
pub struct PrimitiveBlockBuilder<T: PrimitiveElement> {
    values: Vec<T>,
    first_value_indexes: Offsets,
    nulls: NullMaskBuilder,
    multi_valued: bool,
}

impl<T: PrimitiveElement> PrimitiveBlockBuilder<T> {
    pub fn new() -> PrimitiveBlockBuilder<T> {
        PrimitiveBlockBuilder {
            values: Vec::new(),
            first_value_indexes: Offsets::new(),
            nulls: NullMaskBuilder::new(),
            multi_valued: false,
        }
    }

    /// Appends a single-valued position.
    pub fn add_value(&mut self, value: T) {
        self.values.push(value);
        self.first_value_indexes.push_length(1);
        self.nulls.add_non_null();
    }

    /// Appends a null position. Null positions own no slot in the value
    /// store.
    pub fn add_null(&mut self) {
        self.first_value_indexes.push_length(0);
        self.nulls.add_null();
    }

    /// Appends a multi-valued position holding all values of the iterator,
    /// in order. An empty iterator is normalized into a null position.
    pub fn add_values(&mut self, values: impl IntoIterator<Item = T>) {
        let mut count = 0usize;
        for value in values {
            self.values.push(value);
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
    pub fn build(self) -> PrimitiveBlock<T> {
        let nulls = self.nulls.build();
        let first_value_indexes = if nulls.has_nulls() || self.multi_valued {
            Some(self.first_value_indexes)
        } else {
            None
        };
        PrimitiveBlock::new(SharedVec::from_vec(self.values), first_value_indexes, nulls)
    }
}

impl<T: PrimitiveElement> Default for PrimitiveBlockBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type BooleanBlock = PrimitiveBlock<u8>;
pub type BooleanVector = PrimitiveVector<u8>;
pub type BooleanBlockBuilder = PrimitiveBlockBuilder<u8>;

pub type IntBlock = PrimitiveBlock<i32>;
pub type IntVector = PrimitiveVector<i32>;
pub type IntBlockBuilder = PrimitiveBlockBuilder<i32>;

pub type LongBlock = PrimitiveBlock<i64>;
pub type LongVector = PrimitiveVector<i64>;
pub type LongBlockBuilder = PrimitiveBlockBuilder<i64>;

pub type DoubleBlock = PrimitiveBlock<f64>;
pub type DoubleVector = PrimitiveVector<f64>;
pub type DoubleBlockBuilder = PrimitiveBlockBuilder<f64>;
