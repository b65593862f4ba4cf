//! Bit-packed identifiers shared by every index component
//!
//! Layouts (most significant bits first):
//!
//! - `ConjunctionId`: `| reserved(16) | doc_id(32) | index(8) | size(8) |`
//! - `EntryId`: `| ConjunctionId(63) | include(1) |`
//! - `FieldValueKey`: `| field_id(8) | value_id(56) |`
//! - `BitmapConjunctionId`: `| reserved(24) | doc_id(32) | index(8) |`
//!
//! Ordering of `EntryId` is the ordering of its `u64`: conjunction first, with the
//! exclude occurrence (bit 0) sorting before the include occurrence (bit 1).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IndexerError, Result};

/// External document identifier
pub type DocId = u32;

/// Maximum value id representable in a `FieldValueKey`
pub const MAX_VALUE_ID: u64 = (1 << 56) - 1;

/// Maximum number of conjunctions per document and include predicates per conjunction
pub const MAX_CONJUNCTION_INDEX: usize = u8::MAX as usize;
pub const MAX_CONJUNCTION_SIZE: usize = u8::MAX as usize;

/// Dense per-index field identifier (at most 256 fields)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(pub u8);

impl FieldId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field_{}", self.0)
    }
}

/// Packed (document, conjunction index, conjunction size) triple
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConjunctionId(u64);

impl ConjunctionId {
    /// Pack a conjunction identity, failing on sub-field overflow
    pub fn new(doc_id: DocId, index: usize, size: usize) -> Result<Self> {
        if index > MAX_CONJUNCTION_INDEX {
            return Err(IndexerError::ConjunctionIndexOverflow(index));
        }
        if size > MAX_CONJUNCTION_SIZE {
            return Err(IndexerError::ConjunctionSizeOverflow(size));
        }
        Ok(Self(((doc_id as u64) << 16) | ((index as u64) << 8) | size as u64))
    }

    pub fn doc_id(self) -> DocId {
        (self.0 >> 16) as DocId
    }

    pub fn index(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn size(self) -> u8 {
        self.0 as u8
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Smallest id ordered strictly after this one
    ///
    /// Only meaningful as a skip target; the result need not name a real conjunction.
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ConjunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conj({}:{}/{})", self.doc_id(), self.index(), self.size())
    }
}

/// One posting-list element: a conjunction plus its include/exclude flag
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(u64);

impl EntryId {
    /// End-of-list sentinel
    pub const NULL: EntryId = EntryId(u64::MAX);

    pub fn new(conj: ConjunctionId, include: bool) -> Self {
        Self((conj.0 << 1) | include as u64)
    }

    pub fn conjunction(self) -> ConjunctionId {
        ConjunctionId(self.0 >> 1)
    }

    pub fn is_include(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "EntryId(NULL)");
        }
        let sign = if self.is_include() { '+' } else { '-' };
        write!(f, "EntryId({}{})", sign, self.conjunction())
    }
}

/// Term identity: field id plus a 56-bit value id
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldValueKey(u64);

impl FieldValueKey {
    pub fn new(field: FieldId, value_id: u64) -> Result<Self> {
        if value_id > MAX_VALUE_ID {
            return Err(IndexerError::ValueIdOverflow(value_id));
        }
        Ok(Self(((field.0 as u64) << 56) | value_id))
    }

    pub fn field(self) -> FieldId {
        FieldId((self.0 >> 56) as u8)
    }

    pub fn value_id(self) -> u64 {
        self.0 & MAX_VALUE_ID
    }
}

impl fmt::Display for FieldValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.field(), self.value_id())
    }
}

/// Conjunction identity used by the bitmap layout (no size component)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitmapConjunctionId(u64);

impl BitmapConjunctionId {
    pub fn new(doc_id: DocId, index: usize) -> Result<Self> {
        if index > MAX_CONJUNCTION_INDEX {
            return Err(IndexerError::ConjunctionIndexOverflow(index));
        }
        Ok(Self(((doc_id as u64) << 8) | index as u64))
    }

    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub fn doc_id(self) -> DocId {
        (self.0 >> 8) as DocId
    }

    pub fn index(self) -> u8 {
        self.0 as u8
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<ConjunctionId> for BitmapConjunctionId {
    fn from(id: ConjunctionId) -> Self {
        Self(((id.doc_id() as u64) << 8) | id.index() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conjunction_id_round_trip() {
        for &(doc, idx, size) in &[(0u32, 0usize, 0usize), (1, 2, 3), (u32::MAX, 255, 255), (42, 0, 255)] {
            let id = ConjunctionId::new(doc, idx, size).unwrap();
            assert_eq!(id.doc_id(), doc);
            assert_eq!(id.index() as usize, idx);
            assert_eq!(id.size() as usize, size);
        }
    }

    #[test]
    fn test_conjunction_id_overflow() {
        assert!(matches!(
            ConjunctionId::new(1, 256, 1),
            Err(IndexerError::ConjunctionIndexOverflow(256))
        ));
        assert!(matches!(
            ConjunctionId::new(1, 0, 256),
            Err(IndexerError::ConjunctionSizeOverflow(256))
        ));
    }

    #[test]
    fn test_entry_id_ordering() {
        let a = ConjunctionId::new(7, 1, 2).unwrap();
        let b = ConjunctionId::new(7, 2, 2).unwrap();

        let a_exc = EntryId::new(a, false);
        let a_inc = EntryId::new(a, true);
        let b_exc = EntryId::new(b, false);

        assert!(a_exc < a_inc);
        assert!(a_inc < b_exc);
        assert!(b_exc < EntryId::NULL);
        assert_eq!(a_inc.conjunction(), a);
        assert!(a_inc.is_include());
        assert!(!a_exc.is_include());
    }

    #[test]
    fn test_largest_entry_is_not_null() {
        let conj = ConjunctionId::new(u32::MAX, 255, 255).unwrap();
        assert!(!EntryId::new(conj, true).is_null());
    }

    #[test]
    fn test_field_value_key() {
        let key = FieldValueKey::new(FieldId(3), 12345).unwrap();
        assert_eq!(key.field(), FieldId(3));
        assert_eq!(key.value_id(), 12345);

        assert!(FieldValueKey::new(FieldId(255), MAX_VALUE_ID).is_ok());
        assert!(matches!(
            FieldValueKey::new(FieldId(0), MAX_VALUE_ID + 1),
            Err(IndexerError::ValueIdOverflow(_))
        ));
    }

    #[test]
    fn test_bitmap_conjunction_id() {
        let id = BitmapConjunctionId::new(99, 4).unwrap();
        assert_eq!(id.doc_id(), 99);
        assert_eq!(id.index(), 4);

        let conj = ConjunctionId::new(99, 4, 3).unwrap();
        assert_eq!(BitmapConjunctionId::from(conj), id);
        assert!(BitmapConjunctionId::new(1, 300).is_err());
    }
}
