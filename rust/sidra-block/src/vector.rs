//! The dense, null-free, single-valued specialization of a block.

use std::sync::Arc;

use sidra_common::Result;

use crate::block::Block;

/// A shared, immutable reference to a vector.
///
/// `VectorRef` upcasts to [`BlockRef`](crate::block::BlockRef) wherever a
/// plain block is expected.
pub type VectorRef = Arc<dyn Vector>;

/// A block whose shape is statically 1:1 and non-null: position `i` maps
/// directly to value `i` in the underlying store, with no null tracking and
/// no value-count accounting.
///
/// Operators that know they are working with guaranteed non-null
/// single-valued data narrow a block to its vector form
/// ([`Block::as_vector`]) to skip the per-position metadata entirely. The
/// inherited position accessors answer trivially: [`Block::is_null`] is
/// always `false`, [`Block::value_count`] is always 1 and
/// [`Block::first_value_index`] is the identity.
pub trait Vector: Block {
    /// Returns a zero-copy view of this vector remapping positions onto
    /// `positions`, with the same validation as [`Block::filter`].
    ///
    /// Unlike the general block case, the result is again a vector: a
    /// selection of non-null single-valued positions stays non-null and
    /// single-valued, so narrowing a filtered vector succeeds
    /// unconditionally.
    fn filter_vector(self: Arc<Self>, positions: Vec<usize>) -> Result<VectorRef>;
}
