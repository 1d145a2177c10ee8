//! Syntax highlighting backends for `markpane`.
//!
//! This crate implements the `CodeHighlighter` API from `markpane-core` and provides:
//! - `syntect` (feature: `syntect`): class-based HTML highlighting with auto-detection
//! - [`cache::CachedHighlighter`]: a memoizing wrapper usable with any backend
//!
//! The facade crate `markpane` enables the `syntect` backend by default, so most apps never need
//! to depend on this crate directly.
#[cfg(feature = "syntect")]
pub mod syntect;

#[cfg(feature = "syntect")]
pub mod auto;

pub mod cache;
