//! Closed enumeration of the logical value kinds a column can hold.

use std::fmt;

/// Identifies the logical value kind held by a block or vector.
///
/// The enumeration is closed: operator pipelines switch on it exhaustively at
/// their boundaries to pick a concrete per-type code path, while the
/// per-position read path goes through the small [`Block`](crate::block::Block)
/// interface for composability with filter views.
///
/// Every block, vector and filter view carries an `ElementType`, and the tag
/// must match across composition: a filter view's element type equals its
/// delegate's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Boolean values, stored one byte per value.
    Boolean,
    /// 32-bit signed integers.
    Int,
    /// 64-bit signed integers.
    Long,
    /// 64-bit floating point values.
    Double,
    /// Variable-length byte sequences.
    Bytes,
    /// Opaque composite/aggregate intermediate state, stored as
    /// variable-length byte payloads.
    Composite,
}

impl ElementType {
    /// Returns `true` for kinds whose values all occupy the same number of
    /// bytes.
    pub fn is_fixed_width(&self) -> bool {
        self.fixed_size().is_some()
    }

    /// Returns the per-value size in bytes for fixed-width kinds, `None` for
    /// variable-length kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ElementType::Boolean => Some(1),
            ElementType::Int => Some(4),
            ElementType::Long => Some(8),
            ElementType::Double => Some(8),
            ElementType::Bytes | ElementType::Composite => None,
        }
    }

    /// Returns `true` for kinds whose value store addresses entries through
    /// byte-range offsets.
    pub fn requires_offsets(&self) -> bool {
        !self.is_fixed_width()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Boolean => "boolean",
            ElementType::Int => "int",
            ElementType::Long => "long",
            ElementType::Double => "double",
            ElementType::Bytes => "bytes",
            ElementType::Composite => "composite",
        };
        f.write_str(name)
    }
}
