use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Index layout produced by the builder
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexLayout {
    /// One holder set per conjunction size, retrieved bucket by bucket
    #[default]
    SizeGrouped,
    /// One shared holder set; the threshold comes from each matched conjunction
    Compacted,
    /// Per-value bitmaps combined with OR / AND / AND-NOT
    Bitmap,
}

impl IndexLayout {
    pub fn name(&self) -> &'static str {
        match self {
            IndexLayout::SizeGrouped => "size_grouped",
            IndexLayout::Compacted => "compacted",
            IndexLayout::Bitmap => "bitmap",
        }
    }
}

/// What the builder does when a conjunction fails to prepare
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadConjunctionPolicy {
    /// Abort the whole build
    #[default]
    FailFast,
    /// Drop the offending conjunction, log it and continue
    SkipBadConjunction,
}

/// What retrieval does when a query value fails to parse
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryParsePolicy {
    /// Log and drop the predicate, continue with the remaining fields
    #[default]
    LogAndSkip,
    /// Fail the whole query
    Strict,
}

/// Settings consumed by the built-in entry holders
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HolderSettings {
    /// Joins multi-valued keyword queries before the automaton pass
    pub keyword_separator: String,
    /// Ranges spanning at most this many integers are indexed as points
    pub range_expand_threshold: i64,
}

impl Default for HolderSettings {
    fn default() -> Self {
        Self {
            keyword_separator: "\n".to_string(),
            range_expand_threshold: 32,
        }
    }
}

/// Per-field configuration: which holder stores it, which parser reads its values
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldOption {
    pub container: String,
    pub parser: String,
}

impl Default for FieldOption {
    fn default() -> Self {
        Self {
            container: "default".to_string(),
            parser: "common".to_string(),
        }
    }
}

impl FieldOption {
    pub fn new(container: impl Into<String>, parser: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            parser: parser.into(),
        }
    }

    pub fn keyword() -> Self {
        Self::new("keyword", "string")
    }

    pub fn range() -> Self {
        Self::new("range", "number")
    }
}

/// Indexer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    pub layout: IndexLayout,
    pub bad_conjunction: BadConjunctionPolicy,
    pub query_parse: QueryParsePolicy,
    pub holders: HolderSettings,
    /// Maximum number of idle collectors / scratch bitmaps kept per index
    pub collector_pool_size: usize,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            layout: IndexLayout::default(),
            bad_conjunction: BadConjunctionPolicy::default(),
            query_parse: QueryParsePolicy::default(),
            holders: HolderSettings::default(),
            collector_pool_size: 16,
        }
    }
}

impl IndexerSettings {
    /// Load settings from JSON; missing keys take their defaults
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn with_layout(mut self, layout: IndexLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_bad_conjunction(mut self, policy: BadConjunctionPolicy) -> Self {
        self.bad_conjunction = policy;
        self
    }

    pub fn with_query_parse(mut self, policy: QueryParsePolicy) -> Self {
        self.query_parse = policy;
        self
    }

    pub fn with_keyword_separator(mut self, separator: impl Into<String>) -> Self {
        self.holders.keyword_separator = separator.into();
        self
    }

    pub fn with_range_expand_threshold(mut self, threshold: i64) -> Self {
        self.holders.range_expand_threshold = threshold;
        self
    }

    pub fn with_collector_pool_size(mut self, size: usize) -> Self {
        self.collector_pool_size = size;
        self
    }
}
