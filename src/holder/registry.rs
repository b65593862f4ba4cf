use std::collections::HashMap;
use std::sync::Arc;

use super::{DefaultHolderFactory, HolderFactory, KeywordHolderFactory, RangeHolderFactory};
use crate::config::HolderSettings;
use crate::error::{IndexerError, Result};
use crate::parser::{CommonParser, NumberParser, StringParser, ValueParser};

/// Name -> constructor tables for holders and parsers
///
/// Owned by a builder rather than global, so independent builders never see each
/// other's registrations.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    holders: HashMap<String, Arc<dyn HolderFactory>>,
    parsers: HashMap<String, Arc<dyn ValueParser>>,
}

impl Registry {
    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the `default`, `keyword` and `range` holders and the
    /// `common`, `number` and `string` parsers
    pub fn with_builtins(settings: &HolderSettings) -> Self {
        let holders: [Arc<dyn HolderFactory>; 3] = [
            Arc::new(DefaultHolderFactory),
            Arc::new(KeywordHolderFactory::new(settings.keyword_separator.clone())),
            Arc::new(RangeHolderFactory::new(settings.range_expand_threshold)),
        ];
        let parsers: [Arc<dyn ValueParser>; 3] = [
            Arc::new(CommonParser),
            Arc::new(NumberParser),
            Arc::new(StringParser),
        ];

        Self {
            holders: holders.into_iter().map(|h| (h.name().to_string(), h)).collect(),
            parsers: parsers.into_iter().map(|p| (p.name().to_string(), p)).collect(),
        }
    }

    pub fn register_holder(&mut self, factory: Arc<dyn HolderFactory>) -> Result<()> {
        let name = factory.name().to_string();
        if self.holders.contains_key(&name) {
            return Err(IndexerError::DuplicateRegistration { kind: "holder", name });
        }
        self.holders.insert(name, factory);
        Ok(())
    }

    pub fn register_parser(&mut self, parser: Arc<dyn ValueParser>) -> Result<()> {
        let name = parser.name().to_string();
        if self.parsers.contains_key(&name) {
            return Err(IndexerError::DuplicateRegistration { kind: "parser", name });
        }
        self.parsers.insert(name, parser);
        Ok(())
    }

    pub fn holder(&self, name: &str) -> Result<Arc<dyn HolderFactory>> {
        self.holders
            .get(name)
            .cloned()
            .ok_or_else(|| IndexerError::UnknownHolder(name.to_string()))
    }

    pub fn parser(&self, name: &str) -> Result<Arc<dyn ValueParser>> {
        self.parsers
            .get(name)
            .cloned()
            .ok_or_else(|| IndexerError::UnknownParser(name.to_string()))
    }

    pub fn holder_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.holders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn parser_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
