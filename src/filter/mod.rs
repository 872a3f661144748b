pub mod parser;
pub mod query;

pub use parser::parse_query;
pub use query::{CaseQuery, SortKey, StatusFilter};
