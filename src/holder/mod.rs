//! Entry holders: per-field storage of posting lists
//!
//! A holder owns the posting lists of one field within one index partition. Its
//! factory prepares predicates (pure, no mutation) and creates empty holders; the
//! holder itself absorbs prepared payloads, compiles once and answers query values
//! with borrowed posting lists.

mod default_holder;
mod entries;
mod keyword_holder;
mod payload;
mod range_holder;
mod registry;
mod segment_tree;

use std::fmt;

pub use default_holder::{DefaultHolder, DefaultHolderFactory, DEFAULT_HOLDER};
pub use entries::Entries;
pub use keyword_holder::{KeywordHolder, KeywordHolderFactory, KEYWORD_HOLDER};
pub use payload::{MatchedEntries, PreparedPayload, TermRef};
pub use range_holder::{RangeHolder, RangeHolderFactory, RANGE_HOLDER};
pub use registry::Registry;
pub use segment_tree::SegmentTree;

use crate::error::Result;
use crate::ids::EntryId;
use crate::index::FieldDesc;
use crate::models::{BoolExpr, Values};

/// Size counters reported by a holder
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HolderStats {
    /// Distinct terms (values, keywords, range nodes and points)
    pub terms: usize,
    /// Posting entries across all terms
    pub entries: usize,
}

impl std::ops::AddAssign for HolderStats {
    fn add_assign(&mut self, other: Self) {
        self.terms += other.terms;
        self.entries += other.entries;
    }
}

/// Storage of one field's posting lists
pub trait EntriesHolder: Send + Sync + fmt::Debug {
    /// Allocate whatever `commit` will need for `payload` without adding entries
    ///
    /// Every failure that depends on holder capacity (value id space) must surface
    /// here, so a conjunction whose predicates all reserved commits in full.
    fn reserve(&mut self, _desc: &FieldDesc, _payload: &PreparedPayload) -> Result<()> {
        Ok(())
    }

    /// Append `entry` under every term of a prepared payload
    fn commit(&mut self, desc: &FieldDesc, payload: &PreparedPayload, entry: EntryId) -> Result<()>;

    /// Sort posting lists and build lookup structures; the holder is read-only afterwards
    fn compile(&mut self) -> Result<()>;

    fn is_compiled(&self) -> bool;

    /// Posting lists matched by the query values of this field
    ///
    /// Parse failures surface as `QueryParse`; querying before `compile` is `NotCompiled`.
    fn get_entries<'a>(&'a self, desc: &FieldDesc, values: &Values) -> Result<Vec<MatchedEntries<'a>>>;

    fn stats(&self) -> HolderStats;
}

/// Named constructor of a holder kind
pub trait HolderFactory: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Turn one predicate into a payload without touching any holder
    fn prepare(&self, desc: &FieldDesc, expr: &BoolExpr) -> Result<PreparedPayload>;

    fn create(&self) -> Box<dyn EntriesHolder>;
}

pub(crate) fn payload_mismatch(holder: &str, payload: &PreparedPayload) -> crate::error::IndexerError {
    crate::error::IndexerError::Internal(format!(
        "{} holder cannot commit a {} payload",
        holder,
        payload.kind()
    ))
}

pub(crate) fn unsupported_operator(
    desc: &FieldDesc,
    holder: &str,
    expr: &BoolExpr,
) -> crate::error::IndexerError {
    crate::error::IndexerError::UnsupportedOperator {
        field: desc.name.clone(),
        holder: holder.to_string(),
        operator: expr.operator.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::Registry;
    use crate::config::{FieldOption, HolderSettings};
    use crate::index::{FieldCatalog, FieldDesc};

    pub fn field(name: &str, option: FieldOption) -> Arc<FieldDesc> {
        field_with(name, option, &HolderSettings::default())
    }

    pub fn field_with(name: &str, option: FieldOption, settings: &HolderSettings) -> Arc<FieldDesc> {
        let registry = Registry::with_builtins(settings);
        let mut catalog = FieldCatalog::new();
        catalog.configure(&registry, name, option).unwrap()
    }
}
