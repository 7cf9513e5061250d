//! Markdown formatting for the terminal.
//!
//! [`format_markdown`] parses a document with comrak, lays it out for a fixed
//! width and paints it with ANSI styles. All inputs come from an immutable
//! [`FormatOptions`]; links are shown through a pluggable [`LinkRule`].

mod layout;
mod style;
mod types;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub use layout::code_content_width;
pub use style::{paint_line, style_for_inline, style_for_line_type};
pub use types::{InlineColor, InlineSpan, InlineStyle, LineType, RenderedLine};

/// Decides how a link is written out.
pub trait LinkRule: Send + Sync {
    /// Text shown for a link with visible `text` pointing at `url`.
    fn render(&self, text: &str, url: &str) -> String;
}

/// Shows `text (url)`, or only the url when the two are the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLinkRule;

impl LinkRule for PlainLinkRule {
    fn render(&self, text: &str, url: &str) -> String {
        let bare = url.strip_prefix("mailto:").unwrap_or(url);
        if text.is_empty() || text == url || text == bare {
            url.to_string()
        } else {
            format!("{text} ({url})")
        }
    }
}

/// Settings for one formatting call.
pub struct FormatOptions {
    /// Columns to wrap at.
    pub width: usize,
    /// Emit ANSI styling.
    pub color: bool,
    /// Syntax-highlight code blocks with a known language.
    pub highlight: bool,
    pub link_rule: Box<dyn LinkRule>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            width: 80,
            color: false,
            highlight: true,
            link_rule: Box::new(PlainLinkRule),
        }
    }
}

impl fmt::Debug for FormatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatOptions")
            .field("width", &self.width)
            .field("color", &self.color)
            .field("highlight", &self.highlight)
            .finish_non_exhaustive()
    }
}

/// Format `source` for display. The result ends with a newline unless empty.
pub fn format_markdown(source: &str, options: &FormatOptions) -> String {
    let _scope = crate::perf::scope("format.markdown");
    let lines = layout::layout_markdown(source, options);
    let mut out = String::with_capacity(source.len() + lines.len());
    for line in &lines {
        out.push_str(&paint_line(line, options.color));
        out.push('\n');
    }
    out
}

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
        .unwrap_or_else(|err| panic!("invalid ANSI escape pattern: {err}"))
});

/// Remove CSI and OSC escape sequences.
pub fn strip_ansi(text: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[a-zA-Z][^>]*>")
        .unwrap_or_else(|err| panic!("invalid HTML tag pattern: {err}"))
});

/// Remove opening and closing HTML tags, keeping the text between them.
///
/// Comments and declarations are not tags and are left alone.
pub fn strip_html_tags(text: &str) -> std::borrow::Cow<'_, str> {
    HTML_TAG.replace_all(text, "")
}
