//! Cell-level parsers shared by every statement layout.

pub mod amounts;
pub mod dates;

pub use amounts::{parse_amount, parse_direction_flag};
pub use dates::parse_date;
