//! User records held by the directory.

pub mod types;

pub use types::*;
