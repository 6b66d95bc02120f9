//! Reporting: the result table and its terminal rendering.

pub mod format;
pub mod table;

pub use format::*;
pub use table::*;
