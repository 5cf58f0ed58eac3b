//! Crate-wide foundation types.

pub mod error;
