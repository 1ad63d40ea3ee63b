//! Runtime support shared by generated shims.
//!
//! `handles.rs` and `convert.rs` are compiled here so they can be tested,
//! and their text is embedded into each shim by the shim renderer.

pub mod convert;
pub mod handles;

pub use handles::{Handle, HandleError, HandleRegistry, NULL_HANDLE};

/// Source text of the handle registry, embedded into generated shims.
pub const HANDLES_SOURCE: &str = include_str!("handles.rs");

/// Source text of the boundary conversions, embedded into generated shims.
pub const CONVERT_SOURCE: &str = include_str!("convert.rs");
