//! Query-time merge of field scanners into matched conjunctions

mod collector;
mod merge;
mod options;

pub use collector::{ConjunctionCollector, DocIdCollector, ResultCollector};
pub use merge::{retrieve_dynamic, retrieve_k};
pub use options::RetrieveOptions;
