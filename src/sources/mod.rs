//! Listing source implementations.

mod uindex;

pub use uindex::{UIndex, UIndexParser};
