//! One document through the pipeline: diagram substitution, then formatting.

use crate::config::RenderOptions;
use crate::diagram::{DiagramOptions, DiagramRenderer};
use crate::extract::{BlockFailure, Extractor};
use crate::format::{FormatOptions, code_content_width, format_markdown, strip_ansi};

/// Terminal-ready text for one document plus the blocks that fell back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub failures: Vec<BlockFailure>,
}

/// Render `source` with `renderer` drawing its diagram blocks.
///
/// Never fails: a diagram that cannot be drawn is shown as its source and
/// listed in [`Rendered::failures`].
pub fn render_document(
    source: &str,
    options: &RenderOptions,
    renderer: &dyn DiagramRenderer,
) -> Rendered {
    let width = usize::from(options.width);
    // Art must fit the content area of the code frame it lands in.
    let diagram_options = DiagramOptions {
        max_width: Some(code_content_width(width)),
        charset: options.charset,
    };
    let substitution = Extractor::new(renderer)
        .with_options(diagram_options)
        .substitute(source);
    tracing::debug!(
        blocks = substitution.blocks,
        failures = substitution.failures.len(),
        "substituted diagram blocks"
    );

    let format_options = FormatOptions {
        width,
        color: options.color,
        highlight: options.highlight,
        ..FormatOptions::default()
    };
    let formatted = format_markdown(&substitution.text, &format_options);
    let text = if options.color {
        formatted
    } else {
        strip_ansi(&formatted).into_owned()
    };

    Rendered {
        text,
        failures: substitution.failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Charset, DiagramError, TextRenderer};

    const EXAMPLE: &str = "# T\n\n```mermaid\nflowchart LR\n    A --> B\n```\n";

    #[test]
    fn test_example_renders_boxes_in_text_frame() {
        let rendered = render_document(EXAMPLE, &RenderOptions::default(), &TextRenderer);
        assert!(rendered.failures.is_empty());
        assert!(rendered.text.starts_with("# T\n"));
        assert!(rendered.text.contains("┌ text "));
        assert!(rendered.text.contains("│ A ├"));
        assert!(!rendered.text.contains("mermaid"));
    }

    #[test]
    fn test_failure_shows_source_and_is_reported() {
        let failing = |_: &str, _: &DiagramOptions| -> Result<String, DiagramError> {
            Err(DiagramError::Unsupported("pie".to_string()))
        };
        let rendered = render_document(EXAMPLE, &RenderOptions::default(), &failing);
        assert_eq!(rendered.failures.len(), 1);
        assert!(rendered.text.contains("flowchart LR"));
        assert!(rendered.text.contains("A --> B"));
    }

    #[test]
    fn test_renderer_gets_width_left_inside_code_frame() {
        let seen = std::cell::Cell::new(None);
        let spy = |_: &str, o: &DiagramOptions| -> Result<String, DiagramError> {
            seen.set(o.max_width);
            Ok("x".to_string())
        };
        let options = RenderOptions {
            width: 40,
            ..RenderOptions::default()
        };
        render_document(EXAMPLE, &options, &spy);
        assert_eq!(seen.get(), Some(code_content_width(40)));

        render_document(EXAMPLE, &RenderOptions::default(), &spy);
        assert_eq!(seen.get(), Some(code_content_width(80)));
    }

    #[test]
    fn test_art_at_width_limit_is_shown_whole() {
        let full_width = |_: &str, o: &DiagramOptions| -> Result<String, DiagramError> {
            let width = o.max_width.unwrap_or(1);
            Ok(format!("<{}>", "=".repeat(width - 2)))
        };
        let options = RenderOptions {
            width: 37,
            ..RenderOptions::default()
        };
        let rendered = render_document(EXAMPLE, &options, &full_width);
        let art = format!("<{}>", "=".repeat(code_content_width(37) - 2));
        assert!(rendered.text.contains(&art), "{}", rendered.text);
    }

    #[test]
    fn test_diagram_wider_than_frame_falls_back_to_source() {
        let source = "```mermaid\nflowchart LR\nAlpha --> Bravo --> Charlie\n```\n";
        let options = RenderOptions {
            width: 37,
            ..RenderOptions::default()
        };
        let rendered = render_document(source, &options, &TextRenderer);
        assert_eq!(rendered.failures.len(), 1);
        assert!(matches!(
            rendered.failures[0].error,
            DiagramError::TooWide { max_width: 32, .. }
        ));
        assert!(rendered.text.contains("Alpha --> Bravo --> Charlie"));
    }

    #[test]
    fn test_wide_diagram_at_default_width_falls_back_to_source() {
        let source = "```mermaid\nflowchart LR\nA[AAAAAAAAAA] --> B[BBBBBBBBBB]\nB --> C[CCCCCCCCCC]\nC --> D[DDDDDDDDDD]\nD --> E[EEEEEEEEEE]\nE --> F[FFFFFFFFFF]\n```\n";
        let rendered = render_document(source, &RenderOptions::default(), &TextRenderer);
        assert_eq!(rendered.failures.len(), 1);
        assert!(rendered.text.contains("F[FFFFFFFFFF]"), "{}", rendered.text);
    }

    #[test]
    fn test_ascii_charset_reaches_renderer() {
        let options = RenderOptions {
            charset: Charset::Ascii,
            ..RenderOptions::default()
        };
        let rendered = render_document(EXAMPLE, &options, &TextRenderer);
        assert!(rendered.text.contains("| A +--->| B |"), "{}", rendered.text);
    }

    #[test]
    fn test_no_color_output_is_free_of_escapes() {
        let source = "# Head\n\nraw \u{1b}[31mred\u{1b}[0m text\n";
        let rendered = render_document(source, &RenderOptions::default(), &TextRenderer);
        assert!(!rendered.text.contains('\u{1b}'));
    }

    #[test]
    fn test_color_output_keeps_styles() {
        let options = RenderOptions {
            color: true,
            ..RenderOptions::default()
        };
        let rendered = render_document("# Head", &options, &TextRenderer);
        assert!(rendered.text.contains('\u{1b}'));
    }

    #[test]
    fn test_document_without_diagrams_formats_normally() {
        let rendered = render_document("hello *world*", &RenderOptions::default(), &TextRenderer);
        assert_eq!(rendered.text, "hello world\n");
    }
}
