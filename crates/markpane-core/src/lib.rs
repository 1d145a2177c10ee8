//! `markpane-core` provides the small, dependency-light building blocks shared by the markpane
//! rendering crates.
//!
//! Heavier functionality (Markdown parsing, syntax highlighting backends, diagram engines) lives in
//! separate feature-gated crates. This crate only defines the seams between them.
//!
//! ## Design goals
//!
//! - Untrusted input: everything derived from user-authored markdown that ends up in markup
//!   (language tokens, code text) passes through [`lang`] or [`html`] first.
//! - Backends are swappable: the pipeline talks to [`text::CodeHighlighter`] and
//!   [`diagram::DiagramRenderer`] trait objects, so tests and apps can plug in their own.
//! - Failures stay local: every trait here returns a `Result` and callers turn errors into
//!   displayable fallbacks.
//!
//! Useful entry points:
//! - [`lang::classify`]: decide whether a fenced block is a diagram or highlightable code.
//! - [`text::CodeHighlighter`]: highlighter seam with [`text::NoHighlight`] as the null backend.
//! - [`diagram::DiagramRenderer`]: async diagram seam with [`diagram::NoDiagrams`].
pub mod diagram;
pub mod html;
pub mod lang;
pub mod text;
