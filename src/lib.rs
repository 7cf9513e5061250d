// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. diagram::DiagramError)
    clippy::module_name_repetitions
)]

//! # mdmd
//!
//! Render markdown in the terminal, drawing mermaid diagrams as text.
//!
//! Each document goes through a single forward pipeline:
//! - **Input**: a file inside the working directory, or standard input
//! - **Extract**: fenced `mermaid` blocks are drawn as text art and replaced
//!   with `text` fences; blocks that cannot be drawn keep their source
//! - **Format**: comrak layout, syntect highlighting and ANSI styling
//! - **Output**: written directly or through a pager
//!
//! ## Modules
//!
//! - [`input`]: Reading files and standard input
//! - [`extract`]: Diagram block extraction and substitution
//! - [`diagram`]: Flowchart parsing, layout and drawing
//! - [`format`]: Markdown layout and terminal styling
//! - [`highlight`]: Syntax highlighting
//! - [`render`]: The per-document pipeline
//! - [`pager`]: Output mode selection and pager process
//! - [`config`]: Saved defaults, environment and render options
//! - [`perf`]: Timing instrumentation

pub mod config;
pub mod diagram;
pub mod extract;
pub mod format;
pub mod highlight;
pub mod input;
pub mod pager;
pub mod perf;
pub mod render;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::RenderOptions;
    pub use crate::diagram::{DiagramError, DiagramOptions, DiagramRenderer, TextRenderer};
    pub use crate::extract::{BlockFailure, Extractor};
    pub use crate::render::{Rendered, render_document};
}
