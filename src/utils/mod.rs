pub mod date;
pub mod table;

pub use date::*;
