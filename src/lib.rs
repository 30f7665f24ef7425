//! Taskconf: layered, named configuration sections for typed properties
//!
//! Components expose named, typed properties; users author multiple named
//! configuration sections and request combinations of them by name. This
//! crate normalizes loosely typed input into canonical, type-validated value
//! trees, merges them under strict or override discipline, resolves section
//! chains with memoization, and applies the result onto live objects
//! without clobbering untouched fields.

pub mod apply;
pub mod error;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod registry;
pub mod store;
pub mod types;
pub mod units;
pub mod value;
