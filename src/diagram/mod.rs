//! Mermaid diagram rendering to text.
//!
//! The [`DiagramRenderer`] trait is the seam the extractor calls through.
//! [`TextRenderer`] is the built-in implementation: it parses the flowchart
//! grammar and draws boxes and connectors on a character grid.

mod canvas;
mod layout;
mod parser;

use unicode_width::UnicodeWidthStr;

pub use parser::{Direction, Edge, Flowchart, LineStyle, Node, NodeShape, parse_flowchart};

/// Glyph set used for boxes and connectors.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charset {
    /// Unicode box-drawing characters
    #[default]
    Unicode,
    /// Plain 7-bit ASCII
    Ascii,
}

/// Options passed to a renderer for one diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagramOptions {
    /// Widest output the caller can display, in columns.
    pub max_width: Option<usize>,
    pub charset: Charset,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("diagram source is empty")]
    Empty,
    #[error("unsupported diagram type `{0}` (only flowchart and graph are supported)")]
    Unsupported(String),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("rendered diagram is {width} columns wide, limit is {max_width}")]
    TooWide { width: usize, max_width: usize },
    #[error("renderer panicked: {0}")]
    Panicked(String),
}

/// Converts diagram source into text art.
///
/// Implementations must be pure: no I/O and no shared state.
pub trait DiagramRenderer {
    /// Render `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiagramError`] describing why the source could not be
    /// rendered.
    fn render(&self, source: &str, options: &DiagramOptions) -> Result<String, DiagramError>;
}

impl<F> DiagramRenderer for F
where
    F: Fn(&str, &DiagramOptions) -> Result<String, DiagramError>,
{
    fn render(&self, source: &str, options: &DiagramOptions) -> Result<String, DiagramError> {
        self(source, options)
    }
}

/// Built-in flowchart renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl DiagramRenderer for TextRenderer {
    fn render(&self, source: &str, options: &DiagramOptions) -> Result<String, DiagramError> {
        let chart = parse_flowchart(source)?;
        if chart.nodes.is_empty() {
            return Err(DiagramError::Empty);
        }
        let art = layout::draw(&chart, options.charset);
        if let Some(max_width) = options.max_width {
            let width = art.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
            if width > max_width {
                return Err(DiagramError::TooWide { width, max_width });
            }
        }
        Ok(art)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_renderer_draws_node_labels() {
        let src = "flowchart TD\n    A[Start] --> B{Decision?}\n    B -->|Yes| C[Action]\n    B -->|No| D[End]\n    C --> D";
        let art = TextRenderer.render(src, &DiagramOptions::default()).unwrap();
        for label in ["Start", "Decision?", "Action", "End", "Yes", "No"] {
            assert!(art.contains(label), "missing {label} in\n{art}");
        }
    }

    #[test]
    fn test_left_right_chain_is_wider_than_tall() {
        let art = TextRenderer
            .render("flowchart LR\nA --> B --> C", &DiagramOptions::default())
            .unwrap();
        let width = art.lines().map(UnicodeWidthStr::width).max().unwrap();
        assert!(width > art.lines().count(), "{art}");
    }

    #[test]
    fn test_header_only_is_empty_error() {
        let err = TextRenderer
            .render("flowchart TD", &DiagramOptions::default())
            .unwrap_err();
        assert_eq!(err, DiagramError::Empty);
    }

    #[test]
    fn test_max_width_overflow_is_error() {
        let options = DiagramOptions {
            max_width: Some(10),
            ..DiagramOptions::default()
        };
        let err = TextRenderer
            .render("flowchart LR\nA --> B --> C", &options)
            .unwrap_err();
        assert!(matches!(err, DiagramError::TooWide { max_width: 10, .. }));
    }

    #[test]
    fn test_max_width_that_fits_is_ok() {
        let options = DiagramOptions {
            max_width: Some(80),
            ..DiagramOptions::default()
        };
        assert!(TextRenderer.render("flowchart LR\nA --> B", &options).is_ok());
    }

    #[test]
    fn test_closure_renderer() {
        let renderer = |src: &str, _: &DiagramOptions| -> Result<String, DiagramError> {
            Ok(src.to_uppercase())
        };
        assert_eq!(
            renderer.render("abc", &DiagramOptions::default()).unwrap(),
            "ABC"
        );
    }

    #[test]
    fn test_error_messages_are_readable() {
        let err = DiagramError::Parse {
            line: 3,
            message: "expected an edge at column 4".to_string(),
        };
        assert_eq!(err.to_string(), "line 3: expected an edge at column 4");
    }
}
