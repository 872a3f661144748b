pub mod date;
pub mod fuzzy;

pub use date::{format_date, format_dwell, format_timestamp, parse_date_expr};
