//! The abstract column contract shared by every block implementation.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sidra_common::{Result, verify_data};

use crate::element_type::ElementType;
use crate::null_mask::NullMask;
use crate::offsets::Offsets;
use crate::vector::VectorRef;

/// A shared, immutable reference to a block.
///
/// Blocks never change after construction, so a `BlockRef` may be read
/// concurrently from any number of execution threads without locking.
/// Derived views (filters, narrowed vectors) hold clones of the references
/// they were built from; the underlying value store lives as long as its
/// longest-lived holder.
pub type BlockRef = Arc<dyn Block>;

/// A single logical column of query results.
///
/// Each logical position of a block may hold zero (null), one, or many
/// values. Values live in a dense, type-specialized store addressed by
/// *value index*; positions map onto value-index ranges through the block's
/// accounting metadata. Concrete implementations exist per [`ElementType`],
/// all exposing this same object-safe contract so filter views can compose
/// over any of them.
///
/// Position accessors treat an out-of-bounds position as a programming error
/// in the calling operator and panic, like slice indexing. Recoverable
/// conditions (bad filter positions, malformed construction input) surface
/// as [`Result`]s from the fallible constructors instead.
pub trait Block: Send + Sync + 'static {
    /// Returns this block as a type-erased `Any` for downcasting to the
    /// concrete implementation.
    fn as_any(&self) -> &(dyn Any + Send + Sync + 'static);

    /// The logical value kind held by this block, fixed at construction.
    fn element_type(&self) -> ElementType;

    /// Total number of logical rows represented.
    fn position_count(&self) -> usize;

    /// Returns `true` if the position is null.
    fn is_null(&self, position: usize) -> bool;

    /// Number of values at the position; 0 for null positions.
    fn value_count(&self, position: usize) -> usize;

    /// The value-store index of the first value at the position.
    fn first_value_index(&self, position: usize) -> usize;

    /// The canonical byte image of the value at a *value-store* index (not a
    /// logical position): the raw payload for variable-length kinds, the
    /// native primitive byte image for fixed-width kinds.
    ///
    /// The returned slice borrows the underlying store; no per-call
    /// allocation takes place. Panics if `value_index` lies outside the
    /// store range addressable by this block.
    fn value_bytes_at(&self, value_index: usize) -> &[u8];

    /// Returns a zero-copy view of this block remapping logical positions
    /// onto `positions`.
    ///
    /// Entries may repeat and appear in any order; an empty sequence yields a
    /// legal zero-position block. Every entry must be less than
    /// [`position_count`](Block::position_count); offending entries fail with
    /// an invalid-argument error at construction.
    fn filter(self: Arc<Self>, positions: Vec<usize>) -> Result<BlockRef>;

    /// Narrows this block to its dense 1:1 vector form.
    ///
    /// Succeeds only when every position holds exactly one non-null value;
    /// otherwise returns `None`. Absence is an expected negative result, not
    /// a failure: callers branch on it.
    fn as_vector(self: Arc<Self>) -> Option<VectorRef>;

    /// A human-readable summary of this block for logs and test output.
    fn describe(&self) -> String {
        format!(
            "block<{}>[positions={}]",
            self.element_type(),
            self.position_count()
        )
    }
}

/// Structural equality over observable content.
///
/// Two blocks are equal iff they have the same element type, the same
/// position count, and for every position the same nullness, the same value
/// count and pairwise-equal value byte images in order. The comparison never
/// depends on representation: a base block, a filter view and a narrowed
/// vector with the same observable content all compare equal.
///
/// Double values compare by byte image, i.e. bitwise: NaN equals NaN and
/// `-0.0` differs from `0.0`.
pub fn blocks_equal(left: &dyn Block, right: &dyn Block) -> bool {
    if left.element_type() != right.element_type()
        || left.position_count() != right.position_count()
    {
        return false;
    }
    for position in 0..left.position_count() {
        let null = left.is_null(position);
        if null != right.is_null(position) {
            return false;
        }
        if null {
            continue;
        }
        let count = left.value_count(position);
        if count != right.value_count(position) {
            return false;
        }
        let left_first = left.first_value_index(position);
        let right_first = right.first_value_index(position);
        for i in 0..count {
            if left.value_bytes_at(left_first + i) != right.value_bytes_at(right_first + i) {
                return false;
            }
        }
    }
    true
}

/// Feeds the observable content of a block into a hasher: the position
/// count, then per position the null flag and, for valid positions, the
/// value count and value byte images in order.
///
/// Blocks that compare equal under [`blocks_equal`] produce identical hash
/// input regardless of representation.
pub fn hash_block<H: Hasher>(block: &dyn Block, state: &mut H) {
    block.position_count().hash(state);
    for position in 0..block.position_count() {
        let null = block.is_null(position);
        null.hash(state);
        if null {
            continue;
        }
        let count = block.value_count(position);
        count.hash(state);
        let first = block.first_value_index(position);
        for i in 0..count {
            block.value_bytes_at(first + i).hash(state);
        }
    }
}

impl PartialEq for dyn Block {
    fn eq(&self, other: &Self) -> bool {
        blocks_equal(self, other)
    }
}

impl Eq for dyn Block {}

impl Hash for dyn Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_block(self, state)
    }
}

impl fmt::Display for dyn Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for dyn Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Validates the `first_value_indexes`/`nulls`/store-size relationships every
/// per-type block constructor must uphold:
/// - `first_value_indexes`, when present, covers `nulls.len()` positions,
///   starts at 0 and ends exactly at the store size; null positions own zero
///   values and valid positions at least one
/// - when absent, the store is 1:1 with the positions and the mask carries no
///   nulls
pub(crate) fn validate_accounting(
    store_len: usize,
    first_value_indexes: Option<&Offsets>,
    nulls: &NullMask,
) -> Result<()> {
    match first_value_indexes {
        Some(indexes) => {
            verify_data!(first_value_indexes, indexes.item_count() == nulls.len());
            verify_data!(first_value_indexes, indexes.first() == 0);
            verify_data!(first_value_indexes, indexes.last() as usize == store_len);
            for position in 0..indexes.item_count() {
                let range = indexes.range_at(position);
                let count = (range.end - range.start) as usize;
                if nulls.is_null(position) {
                    verify_data!(nulls, count == 0);
                } else {
                    verify_data!(nulls, count >= 1);
                }
            }
        }
        None => {
            verify_data!(values, store_len == nulls.len());
            verify_data!(nulls, !nulls.has_nulls());
        }
    }
    Ok(())
}
