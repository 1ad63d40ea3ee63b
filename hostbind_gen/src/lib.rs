//! hostbind: generates Python bindings for a native Rust package.
//!
//! A package description (see [`types::PackageFile`]) is analyzed into a
//! [`model::Package`], lowered into a binding IR and rendered as four
//! files: a Rust shim exporting `extern "C"` entry points over a handle
//! registry, a pybindgen build script, a Python wrapper module and a
//! Makefile tying them together.

pub mod codegen;
pub mod config;
pub mod errors;
pub mod model;
pub mod naming;
pub mod runtime;

pub use hostbind_types as types;
