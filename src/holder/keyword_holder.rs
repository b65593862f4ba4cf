use aho_corasick::AhoCorasick;
use std::collections::HashMap;

use super::{
    payload_mismatch, unsupported_operator, Entries, EntriesHolder, HolderFactory, HolderStats,
    MatchedEntries, PreparedPayload, TermRef,
};
use crate::error::{IndexerError, Result};
use crate::ids::EntryId;
use crate::index::FieldDesc;
use crate::models::{BoolExpr, Values};

pub const KEYWORD_HOLDER: &str = "keyword";

/// Substring holder: a query matches every indexed keyword occurring in its text
///
/// Multi-valued queries are joined with the separator and scanned once.
#[derive(Debug)]
pub struct KeywordHolder {
    separator: String,
    keywords: Vec<String>,
    positions: HashMap<String, usize>,
    plists: Vec<Entries>,
    automaton: Option<AhoCorasick>,
    compiled: bool,
}

impl KeywordHolder {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            keywords: Vec::new(),
            positions: HashMap::new(),
            plists: Vec::new(),
            automaton: None,
            compiled: false,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl EntriesHolder for KeywordHolder {
    fn reserve(&mut self, _desc: &FieldDesc, payload: &PreparedPayload) -> Result<()> {
        if self.compiled {
            return Err(IndexerError::Internal("keyword holder already compiled".to_string()));
        }
        match payload {
            PreparedPayload::Keywords(_) => Ok(()),
            other => Err(payload_mismatch(KEYWORD_HOLDER, other)),
        }
    }

    fn commit(&mut self, _desc: &FieldDesc, payload: &PreparedPayload, entry: EntryId) -> Result<()> {
        if self.compiled {
            return Err(IndexerError::Internal("keyword holder already compiled".to_string()));
        }
        let PreparedPayload::Keywords(keywords) = payload else {
            return Err(payload_mismatch(KEYWORD_HOLDER, payload));
        };

        for keyword in keywords {
            let idx = match self.positions.get(keyword) {
                Some(&idx) => idx,
                None => {
                    self.keywords.push(keyword.clone());
                    self.plists.push(Entries::new());
                    self.positions.insert(keyword.clone(), self.keywords.len() - 1);
                    self.keywords.len() - 1
                }
            };
            self.plists[idx].push(entry);
        }
        Ok(())
    }

    fn compile(&mut self) -> Result<()> {
        for plist in &mut self.plists {
            plist.compile();
        }
        if !self.keywords.is_empty() {
            let automaton = AhoCorasick::new(&self.keywords)
                .map_err(|e| IndexerError::Internal(format!("keyword automaton: {}", e)))?;
            self.automaton = Some(automaton);
        }
        self.compiled = true;
        Ok(())
    }

    fn is_compiled(&self) -> bool {
        self.compiled
    }

    fn get_entries<'a>(&'a self, desc: &FieldDesc, values: &Values) -> Result<Vec<MatchedEntries<'a>>> {
        if !self.compiled {
            return Err(IndexerError::NotCompiled("keyword holder"));
        }
        let Some(automaton) = &self.automaton else {
            return Ok(Vec::new());
        };

        let text = desc
            .parse_query(values)?
            .iter()
            .map(|term| term.to_keyword())
            .collect::<Vec<_>>()
            .join(&self.separator);

        let mut hits: Vec<usize> = automaton
            .find_overlapping_iter(&text)
            .map(|m| m.pattern().as_usize())
            .collect();
        hits.sort_unstable();
        hits.dedup();

        Ok(hits
            .into_iter()
            .map(|idx| MatchedEntries::new(TermRef::Keyword(idx as u32), self.plists[idx].as_slice()))
            .collect())
    }

    fn stats(&self) -> HolderStats {
        HolderStats {
            terms: self.keywords.len(),
            entries: self.plists.iter().map(Entries::len).sum(),
        }
    }
}

/// Creates [`KeywordHolder`]s; supports the EQ operator only
#[derive(Debug, Clone)]
pub struct KeywordHolderFactory {
    separator: String,
}

impl KeywordHolderFactory {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl HolderFactory for KeywordHolderFactory {
    fn name(&self) -> &str {
        KEYWORD_HOLDER
    }

    fn prepare(&self, desc: &FieldDesc, expr: &BoolExpr) -> Result<PreparedPayload> {
        if !expr.operator.is_eq() {
            return Err(unsupported_operator(desc, KEYWORD_HOLDER, expr));
        }

        let mut keywords = Vec::new();
        for term in desc.parse_values(&expr.value)? {
            let keyword = term.to_keyword();
            // An empty pattern would match every query.
            if keyword.is_empty() {
                return Err(IndexerError::ValueParse {
                    field: desc.name.clone(),
                    reason: "empty keyword".to_string(),
                });
            }
            keywords.push(keyword);
        }
        keywords.sort_unstable();
        keywords.dedup();
        Ok(PreparedPayload::Keywords(keywords))
    }

    fn create(&self) -> Box<dyn EntriesHolder> {
        Box::new(KeywordHolder::new(self.separator.clone()))
    }
}
