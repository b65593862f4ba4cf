pub mod document;
pub mod expr;
pub mod value;

pub use document::{parse_documents, Conjunction, Document};
pub use expr::{BoolExpr, Operator};
pub use value::{Assignments, Value, Values};
