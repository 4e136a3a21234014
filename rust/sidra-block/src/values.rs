//! Type-specialized value stores backing blocks and vectors.

use sidra_common::{Result, verify_data};
use sidra_shared_vec::SharedVec;

use crate::element_type::ElementType;
use crate::offsets::Offsets;

/// Marker trait binding a Rust primitive to its [`ElementType`] tag.
///
/// Fixed-width blocks store their values as a contiguous `SharedVec<T>` of one
/// of these primitives, with no per-value heap object. Booleans are stored as
/// one byte per value.
pub trait PrimitiveElement: bytemuck::Pod + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;
}

impl PrimitiveElement for u8 {
    const ELEMENT_TYPE: ElementType = ElementType::Boolean;
}

impl PrimitiveElement for i32 {
    const ELEMENT_TYPE: ElementType = ElementType::Int;
}

impl PrimitiveElement for i64 {
    const ELEMENT_TYPE: ElementType = ElementType::Long;
}

impl PrimitiveElement for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Double;
}

/// A dense store of variable-length byte entries.
///
/// Entries are concatenated into a single shared byte buffer and addressed by
/// offset ranges: entry `i` occupies the byte range `offsets[i]..offsets[i+1]`
/// of `data`. There is no per-entry heap object, and cloning the store shares
/// the underlying buffer.
#[derive(Debug, Clone)]
pub struct BytesValues {
    data: SharedVec<u8>,
    offsets: Offsets,
}

impl BytesValues {
    /// Creates a store over an existing data buffer and entry offsets.
    ///
    /// # Errors
    ///
    /// Fails with a data-integrity error unless the offsets start at 0 and
    /// end exactly at the data length.
    pub fn try_new(data: SharedVec<u8>, offsets: Offsets) -> Result<BytesValues> {
        verify_data!(offsets, offsets.first() == 0);
        verify_data!(offsets, offsets.last() as usize == data.len());
        Ok(BytesValues { data, offsets })
    }

    /// Creates an empty store.
    pub fn empty() -> BytesValues {
        BytesValues {
            data: SharedVec::empty(),
            offsets: Offsets::new(),
        }
    }

    /// Builds a store by concatenating the given entries.
    pub fn from_slices<'a>(entries: impl IntoIterator<Item = &'a [u8]>) -> BytesValues {
        let mut data = Vec::new();
        let mut offsets = Offsets::new();
        for entry in entries {
            data.extend_from_slice(entry);
            offsets.push_length(entry.len());
        }
        BytesValues {
            data: SharedVec::from_vec(data),
            offsets,
        }
    }

    /// Returns the number of entries in the store.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.item_count()
    }

    /// Returns `true` if the store has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of bytes across all entries.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Returns the entry at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> &[u8] {
        let range = self.offsets.range_at(index);
        &self.data.as_slice()[range.start as usize..range.end as usize]
    }

    /// Returns an iterator over the entries of the store.
    pub fn iter(&self) -> BytesValuesIter<'_> {
        BytesValuesIter {
            values: self,
            index: 0,
        }
    }
}

/// Iterator over the entries of a [`BytesValues`] store.
pub struct BytesValuesIter<'a> {
    values: &'a BytesValues,
    index: usize,
}

impl<'a> Iterator for BytesValuesIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.values.len() {
            let entry = self.values.get(self.index);
            self.index += 1;
            Some(entry)
        } else {
            None
        }
    }
}
