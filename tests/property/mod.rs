//! Property-based tests over the canonical value algebra

mod merge_laws;
