//! Constant all-null blocks.

use std::any::Any;
use std::sync::Arc;

use sidra_common::Result;

use crate::block::{Block, BlockRef};
use crate::element_type::ElementType;
use crate::filter::FilterBlock;
use crate::vector::VectorRef;

/// A block of `position_count` null positions with no value store at all.
///
/// Scan operators materialize these for columns that are absent from the
/// scanned data. A constant null block compares equal to any block of the
/// same element type whose positions are all null, and never narrows to a
/// vector.
pub struct ConstantNullBlock {
    element_type: ElementType,
    position_count: usize,
}

impl ConstantNullBlock {
    pub fn new(element_type: ElementType, position_count: usize) -> ConstantNullBlock {
        ConstantNullBlock {
            element_type,
            position_count,
        }
    }
}

impl Block for ConstantNullBlock {
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static) {
        self
    }

    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn position_count(&self) -> usize {
        self.position_count
    }

    fn is_null(&self, position: usize) -> bool {
        assert!(position < self.position_count);
        true
    }

    fn value_count(&self, position: usize) -> usize {
        assert!(position < self.position_count);
        0
    }

    fn first_value_index(&self, position: usize) -> usize {
        assert!(position < self.position_count);
        0
    }

    fn value_bytes_at(&self, value_index: usize) -> &[u8] {
        panic!("value index {value_index} out of range: constant null block holds no values");
    }

    fn filter(self: Arc<Self>, positions: Vec<usize>) -> Result<BlockRef> {
        Ok(Arc::new(FilterBlock::try_new(self, positions)?))
    }

    fn as_vector(self: Arc<Self>) -> Option<VectorRef> {
        None
    }
}
