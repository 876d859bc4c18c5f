//! Client-side search filters
//!
//! Facts returned by the store can be narrowed further with boolean search
//! expressions, one per attribute (activity, category, tag, description).

pub mod parser;
pub mod evaluator;

pub use parser::{parse_search, ParseError, SearchExpr};
pub use evaluator::{evaluate, SearchField, SearchFilters};
