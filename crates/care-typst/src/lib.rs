//! Typst document helpers for report generation.
//!
//! This crate provides markup building for Typst sources and a wrapper around
//! the external `typst` binary that turns those sources into PDF files.

pub mod compiler;
pub mod markup;

pub use compiler::*;
pub use markup::*;
