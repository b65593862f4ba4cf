//! Value parsing: raw predicate/query values to canonical terms, and terms to value ids

mod dictionary;
mod value_parser;

pub use dictionary::ValueDictionary;
pub use value_parser::{CommonParser, NumberParser, StringParser, Term, ValueParser};
