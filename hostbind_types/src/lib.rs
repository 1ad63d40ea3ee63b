//! Package Description Types
//!
//! This crate contains the data structures describing the public surface of a
//! native package (types, functions, constants, variables) together with the
//! native type-expression grammar used inside those descriptions.
//! It provides pure data structures without any file I/O or code generation
//! logic.

pub mod expr;
pub mod types;

// Re-export commonly used types at the crate root
pub use expr::*;
pub use types::*;
