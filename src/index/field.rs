use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::FieldOption;
use crate::error::{IndexerError, Result};
use crate::holder::{HolderFactory, Registry};
use crate::ids::FieldId;
use crate::models::Values;
use crate::parser::{Term, ValueParser};

/// Resolved configuration of one field
#[derive(Debug, Clone)]
pub struct FieldDesc {
    pub id: FieldId,
    pub name: String,
    pub option: FieldOption,
    pub parser: Arc<dyn ValueParser>,
    pub holder: Arc<dyn HolderFactory>,
}

impl FieldDesc {
    /// Parse indexing-time predicate values
    pub fn parse_values(&self, values: &Values) -> Result<Vec<Term>> {
        self.parser
            .parse(values)
            .map_err(|reason| IndexerError::ValueParse {
                field: self.name.clone(),
                reason,
            })
    }

    /// Parse query-time assignment values
    pub fn parse_query(&self, values: &Values) -> Result<Vec<Term>> {
        self.parser
            .parse(values)
            .map_err(|reason| IndexerError::QueryParse {
                field: self.name.clone(),
                reason,
            })
    }
}

/// Field name -> dense id table, at most 256 entries
#[derive(Debug, Default, Clone)]
pub struct FieldCatalog {
    fields: Vec<Arc<FieldDesc>>,
    by_name: HashMap<String, FieldId>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field with an explicit option
    pub fn configure(
        &mut self,
        registry: &Registry,
        name: &str,
        option: FieldOption,
    ) -> Result<Arc<FieldDesc>> {
        if self.by_name.contains_key(name) {
            return Err(IndexerError::FieldAlreadyConfigured(name.to_string()));
        }
        if self.fields.len() > u8::MAX as usize {
            return Err(IndexerError::FieldIdOverflow(name.to_string()));
        }

        let holder = registry.holder(&option.container)?;
        let parser = registry.parser(&option.parser)?;
        let id = FieldId(self.fields.len() as u8);
        let desc = Arc::new(FieldDesc {
            id,
            name: name.to_string(),
            option,
            parser,
            holder,
        });
        self.fields.push(desc.clone());
        self.by_name.insert(name.to_string(), id);
        Ok(desc)
    }

    /// Look up a field, registering it with the default option when unseen
    pub fn get_or_configure(&mut self, registry: &Registry, name: &str) -> Result<Arc<FieldDesc>> {
        if let Some(desc) = self.get(name) {
            return Ok(desc.clone());
        }
        debug!(field = name, "Auto-configuring field with default option");
        self.configure(registry, name, FieldOption::default())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FieldDesc>> {
        self.by_name
            .get(name)
            .map(|id| &self.fields[id.as_usize()])
    }

    pub fn by_id(&self, id: FieldId) -> Option<&Arc<FieldDesc>> {
        self.fields.get(id.as_usize())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FieldDesc>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HolderSettings;

    #[test]
    fn test_configure_and_lookup() {
        let registry = Registry::with_builtins(&HolderSettings::default());
        let mut catalog = FieldCatalog::new();

        let title = catalog
            .configure(&registry, "title", FieldOption::keyword())
            .unwrap();
        let age = catalog.get_or_configure(&registry, "age").unwrap();

        assert_eq!(title.id, FieldId(0));
        assert_eq!(age.id, FieldId(1));
        assert_eq!(age.option, FieldOption::default());
        assert_eq!(catalog.get("title").unwrap().holder.name(), "keyword");
        assert_eq!(catalog.by_id(FieldId(1)).unwrap().name, "age");
        assert_eq!(catalog.get_or_configure(&registry, "age").unwrap().id, FieldId(1));
    }

    #[test]
    fn test_configure_errors() {
        let registry = Registry::with_builtins(&HolderSettings::default());
        let mut catalog = FieldCatalog::new();
        catalog.configure(&registry, "a", FieldOption::default()).unwrap();

        assert!(matches!(
            catalog.configure(&registry, "a", FieldOption::range()),
            Err(IndexerError::FieldAlreadyConfigured(_))
        ));
        assert!(matches!(
            catalog.configure(&registry, "b", FieldOption::new("trie", "common")),
            Err(IndexerError::UnknownHolder(_))
        ));
        assert!(matches!(
            catalog.configure(&registry, "c", FieldOption::new("default", "date")),
            Err(IndexerError::UnknownParser(_))
        ));
    }

    #[test]
    fn test_field_id_overflow() {
        let registry = Registry::with_builtins(&HolderSettings::default());
        let mut catalog = FieldCatalog::new();
        for i in 0..256 {
            catalog.get_or_configure(&registry, &format!("f{}", i)).unwrap();
        }
        assert!(matches!(
            catalog.get_or_configure(&registry, "one_too_many"),
            Err(IndexerError::FieldIdOverflow(_))
        ));
    }
}
