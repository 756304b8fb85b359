//! Command implementations

pub mod project;

pub use project::*;
