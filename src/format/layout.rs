//! Markdown layout with comrak.
//!
//! Walks the comrak AST and produces wrapped, styled lines for a fixed
//! terminal width.

use comrak::nodes::{AstNode, ListDelimType, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{FormatOptions, strip_html_tags};
use super::types::{InlineSpan, InlineStyle, LineType, RenderedLine};
use crate::highlight::{highlight_code, is_highlightable};

/// Spaces between code and the right edge of a code frame.
const CODE_RIGHT_PADDING: usize = 1;
/// Columns a code frame adds around its content.
const CODE_FRAME_COLUMNS: usize = 4 + CODE_RIGHT_PADDING;

/// Columns left for code inside a frame laid out at `width`.
pub fn code_content_width(width: usize) -> usize {
    width.max(1).saturating_sub(CODE_FRAME_COLUMNS).max(1)
}

/// Lay out `source` into lines no wider than `options.width` where possible.
pub(super) fn layout_markdown(source: &str, options: &FormatOptions) -> Vec<RenderedLine> {
    let arena = Arena::new();
    let root = parse_document(&arena, source, &comrak_options());

    let mut layout = Layout {
        options,
        width: options.width.max(1),
        lines: Vec::new(),
    };
    layout.block(root, 0, None);

    let mut lines = layout.lines;
    while lines
        .last()
        .is_some_and(|line| line.line_type() == LineType::Empty)
    {
        lines.pop();
    }
    let leading = lines
        .iter()
        .take_while(|line| line.line_type() == LineType::Empty)
        .count();
    lines.drain(..leading);
    lines
}

fn comrak_options() -> Options {
    let mut options = Options::default();

    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    options
}

struct Layout<'o> {
    options: &'o FormatOptions,
    width: usize,
    lines: Vec<RenderedLine>,
}

impl Layout<'_> {
    fn push_spans(&mut self, wrapped: Vec<Vec<InlineSpan>>, line_type: LineType) {
        for spans in wrapped {
            self.lines.push(RenderedLine::from_spans(line_type, spans));
        }
    }

    fn blank(&mut self) {
        self.lines.push(RenderedLine::empty());
    }

    fn ensure_trailing_empty_lines(&mut self, count: usize) {
        let existing = self
            .lines
            .iter()
            .rev()
            .take_while(|line| line.line_type() == LineType::Empty)
            .count();
        for _ in existing..count {
            self.blank();
        }
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>, depth: usize, list_marker: Option<&str>) {
        match &node.data.borrow().value {
            NodeValue::Heading(heading) => {
                self.ensure_trailing_empty_lines(1);
                let text = extract_text(node).replace('\n', " ");
                let prefix = "#".repeat(usize::from(heading.level));
                self.lines.push(RenderedLine::new(
                    format!("{prefix} {text}"),
                    LineType::Heading(heading.level),
                ));
                self.blank();
            }

            NodeValue::Paragraph => {
                let spans = self.inline_spans(node);
                let wrapped = wrap_spans(&spans, self.width, "", "");
                self.push_spans(wrapped, LineType::Paragraph);
                self.blank();
            }

            NodeValue::CodeBlock(code_block) => {
                let language = code_block.info.split_whitespace().next();
                self.code_block(language, &code_block.literal);
                self.blank();
            }

            NodeValue::HtmlBlock(html) => {
                for raw_line in html.literal.lines() {
                    let text = strip_html_tags(raw_line);
                    // Lines holding only markup disappear.
                    if text.trim().is_empty() && !raw_line.trim().is_empty() {
                        continue;
                    }
                    self.lines
                        .push(RenderedLine::new(text.into_owned(), LineType::Paragraph));
                }
                self.ensure_trailing_empty_lines(1);
            }

            NodeValue::List(list) => {
                let start = list.start;
                let delimiter = match list.delimiter {
                    ListDelimType::Paren => ')',
                    ListDelimType::Period => '.',
                };
                let max_number = start + node.children().count().saturating_sub(1);
                let number_width = max_number.to_string().len();

                for (index, child) in node.children().enumerate() {
                    let marker = match list.list_type {
                        ListType::Bullet => "• ".to_string(),
                        ListType::Ordered => {
                            format!("{:>number_width$}{delimiter} ", start + index)
                        }
                    };
                    self.block(child, depth + 1, Some(&marker));
                }
                if depth == 0 {
                    self.blank();
                }
            }

            NodeValue::Item(_) => {
                let marker = list_marker.unwrap_or("• ").to_string();
                self.list_item(node, depth, &marker);
            }

            NodeValue::TaskItem(symbol) => {
                let marker = if symbol.is_some() { "✓ " } else { "□ " };
                self.list_item(node, depth, marker);
            }

            NodeValue::BlockQuote => {
                self.blockquote(node, 1);
                self.blank();
            }

            NodeValue::ThematicBreak => {
                self.lines.push(RenderedLine::new(
                    "─".repeat(self.width.min(80)),
                    LineType::HorizontalRule,
                ));
                self.blank();
            }

            NodeValue::Table(_) => {
                for line in render_table(node, self.width) {
                    self.lines.push(RenderedLine::new(line, LineType::Table));
                }
                self.blank();
            }

            NodeValue::FootnoteDefinition(def) => {
                let label = format!("[^{}]: ", def.name);
                let continuation = " ".repeat(label.width());
                let spans = self.inline_spans(node);
                let wrapped = wrap_spans(&spans, self.width, &label, &continuation);
                self.push_spans(wrapped, LineType::Paragraph);
                self.blank();
            }

            _ => {
                for child in node.children() {
                    self.block(child, depth, list_marker);
                }
            }
        }
    }

    fn list_item<'a>(&mut self, node: &'a AstNode<'a>, depth: usize, marker: &str) {
        let indent = "  ".repeat(depth.saturating_sub(1));
        let prefix_first = format!("{indent}{marker}");
        let prefix_next = format!("{indent}{}", " ".repeat(marker.width()));
        let mut paragraphs = 0usize;

        for child in node.children() {
            match &child.data.borrow().value {
                NodeValue::Paragraph => {
                    if paragraphs > 0 {
                        self.lines
                            .push(RenderedLine::new(String::new(), LineType::ListItem(depth)));
                    }
                    let spans = self.inline_spans(child);
                    let prefix = if paragraphs == 0 {
                        &prefix_first
                    } else {
                        &prefix_next
                    };
                    let wrapped = wrap_spans(&spans, self.width, prefix, &prefix_next);
                    self.push_spans(wrapped, LineType::ListItem(depth));
                    paragraphs += 1;
                }
                NodeValue::List(_) => self.block(child, depth, None),
                _ => {
                    if paragraphs == 0 {
                        self.lines.push(RenderedLine::new(
                            prefix_first.trim_end().to_string(),
                            LineType::ListItem(depth),
                        ));
                        paragraphs += 1;
                    }
                    self.block(child, depth, None);
                }
            }
        }

        if paragraphs == 0 {
            self.lines.push(RenderedLine::new(
                prefix_first.trim_end().to_string(),
                LineType::ListItem(depth),
            ));
        }
    }

    fn blockquote<'a>(&mut self, node: &'a AstNode<'a>, quote_depth: usize) {
        let prefix = quote_prefix(quote_depth);

        for child in node.children() {
            match &child.data.borrow().value {
                NodeValue::Paragraph => {
                    let spans = self.inline_spans(child);
                    let wrapped = wrap_spans(&spans, self.width, &prefix, &prefix);
                    self.push_spans(wrapped, LineType::BlockQuote);
                }
                NodeValue::BlockQuote => {
                    self.blockquote(child, quote_depth + 1);
                }
                _ => {
                    let text = extract_text(child);
                    for raw_line in text.lines() {
                        let spans = vec![InlineSpan::plain(raw_line)];
                        let wrapped = wrap_spans(&spans, self.width, &prefix, &prefix);
                        self.push_spans(wrapped, LineType::BlockQuote);
                    }
                }
            }
        }
    }

    fn code_block(&mut self, language: Option<&str>, literal: &str) {
        let code_lines = if self.options.highlight && is_highlightable(language) {
            highlight_code(language, literal)
        } else {
            let style = InlineStyle {
                code: true,
                ..InlineStyle::default()
            };
            literal
                .lines()
                .map(|line| vec![InlineSpan::new(line.to_string(), style)])
                .collect()
        };

        let content_width = literal
            .lines()
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0)
            .min(code_content_width(self.width));
        let frame_inner_width = content_width + 2 + CODE_RIGHT_PADDING;
        let label = format!(" {} ", language.unwrap_or("code"));
        let visible_label = truncate_text(&label, frame_inner_width);
        self.lines.push(RenderedLine::new(
            format!(
                "┌{visible_label}{}┐",
                "─".repeat(frame_inner_width.saturating_sub(visible_label.width()))
            ),
            LineType::CodeBlock,
        ));

        for spans in code_lines {
            let trimmed = truncate_spans(&spans, content_width);
            let used: usize = trimmed.iter().map(|span| span.text().width()).sum();
            let padding = " ".repeat(content_width.saturating_sub(used) + CODE_RIGHT_PADDING);

            let mut line_spans = Vec::with_capacity(trimmed.len() + 2);
            line_spans.push(InlineSpan::plain("│ "));
            line_spans.extend(trimmed);
            line_spans.push(InlineSpan::plain(format!("{padding} │")));
            self.lines
                .push(RenderedLine::from_spans(LineType::CodeBlock, line_spans));
        }

        self.lines.push(RenderedLine::new(
            format!("└{}┘", "─".repeat(frame_inner_width)),
            LineType::CodeBlock,
        ));
    }

    fn inline_spans<'a>(&self, node: &'a AstNode<'a>) -> Vec<InlineSpan> {
        let mut spans = Vec::new();
        self.collect_inline_spans(node, InlineStyle::default(), &mut spans);
        spans
    }

    fn collect_inline_spans<'a>(
        &self,
        node: &'a AstNode<'a>,
        style: InlineStyle,
        spans: &mut Vec<InlineSpan>,
    ) {
        match &node.data.borrow().value {
            NodeValue::List(_) | NodeValue::Item(_) | NodeValue::TaskItem(_) => {}
            NodeValue::Text(text) => {
                spans.push(InlineSpan::new(text.clone(), style));
            }
            NodeValue::HtmlInline(html) => {
                let text = strip_html_tags(html);
                if !text.is_empty() {
                    spans.push(InlineSpan::new(text.into_owned(), style));
                }
            }
            NodeValue::Code(code) => {
                let code_style = InlineStyle {
                    code: true,
                    emphasis: false,
                    strong: false,
                    strikethrough: false,
                    ..style
                };
                spans.push(InlineSpan::new(code.literal.clone(), code_style));
            }
            NodeValue::Emph => {
                let next = InlineStyle {
                    emphasis: true,
                    ..style
                };
                for child in node.children() {
                    self.collect_inline_spans(child, next, spans);
                }
            }
            NodeValue::Strong => {
                let next = InlineStyle {
                    strong: true,
                    ..style
                };
                for child in node.children() {
                    self.collect_inline_spans(child, next, spans);
                }
            }
            NodeValue::Strikethrough => {
                let next = InlineStyle {
                    strikethrough: true,
                    ..style
                };
                for child in node.children() {
                    self.collect_inline_spans(child, next, spans);
                }
            }
            NodeValue::Link(link) => {
                let text = extract_text(node);
                let shown = self.options.link_rule.render(&text, &link.url);
                let next = InlineStyle { link: true, ..style };
                spans.push(InlineSpan::new(shown, next));
            }
            NodeValue::Image(image) => {
                let alt = extract_text(node);
                let shown = if alt.is_empty() { &image.url } else { &alt };
                spans.push(InlineSpan::new(format!("[Image: {shown}]"), style));
            }
            NodeValue::FootnoteReference(reference) => {
                spans.push(InlineSpan::new(format!("[^{}]", reference.name), style));
            }
            NodeValue::SoftBreak | NodeValue::LineBreak => {
                spans.push(InlineSpan::new(" ".to_string(), style));
            }
            _ => {
                for child in node.children() {
                    self.collect_inline_spans(child, style, spans);
                }
            }
        }
    }
}

fn quote_prefix(depth: usize) -> String {
    let mut prefix = String::from("  ");
    for _ in 0..depth {
        prefix.push_str("│ ");
    }
    prefix
}

fn render_table<'a>(table_node: &'a AstNode<'a>, wrap_width: usize) -> Vec<String> {
    let (alignments, mut rows, has_header) = collect_table_rows(table_node);
    let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return Vec::new();
    }

    for row in &mut rows {
        row.resize(num_cols, String::new());
    }

    let mut col_widths = vec![1_usize; num_cols];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            col_widths[idx] = col_widths[idx].max(cell.width());
        }
    }

    // Row width is 1 + sum(col_width + 3).
    let max_table_width = wrap_width.max(4);
    while 1 + col_widths.iter().sum::<usize>() + (3 * num_cols) > max_table_width {
        let Some((widest_idx, _)) = col_widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if col_widths[widest_idx] <= 1 {
            break;
        }
        col_widths[widest_idx] -= 1;
    }

    let mid = render_table_border(&col_widths, '├', '┼', '┤');
    let mut lines = vec![render_table_border(&col_widths, '┌', '┬', '┐')];
    for (idx, row) in rows.iter().enumerate() {
        lines.push(render_table_row(row, &col_widths, &alignments));
        if has_header && idx == 0 {
            lines.push(mid.clone());
        }
    }
    lines.push(render_table_border(&col_widths, '└', '┴', '┘'));
    lines
}

fn collect_table_rows<'a>(
    table_node: &'a AstNode<'a>,
) -> (Vec<TableAlignment>, Vec<Vec<String>>, bool) {
    let alignments = match &table_node.data.borrow().value {
        NodeValue::Table(table) => table.alignments.clone(),
        _ => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut has_header = false;
    for row_node in table_node.children() {
        let NodeValue::TableRow(is_header) = row_node.data.borrow().value else {
            continue;
        };
        has_header |= is_header;

        let cells = row_node
            .children()
            .filter(|cell| matches!(cell.data.borrow().value, NodeValue::TableCell))
            .map(|cell| {
                extract_text(cell)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        rows.push(cells);
    }

    (alignments, rows, has_header)
}

fn render_table_border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut out = String::new();
    out.push(left);
    for (idx, width) in widths.iter().enumerate() {
        out.push_str(&"─".repeat(width + 2));
        if idx + 1 < widths.len() {
            out.push(middle);
        }
    }
    out.push(right);
    out
}

fn render_table_row(cells: &[String], widths: &[usize], alignments: &[TableAlignment]) -> String {
    let mut out = String::from("│");
    for (idx, width) in widths.iter().copied().enumerate() {
        let content = truncate_text(cells.get(idx).map_or("", String::as_str), width);
        let padding = width.saturating_sub(content.width());

        out.push(' ');
        match alignments.get(idx).copied().unwrap_or(TableAlignment::None) {
            TableAlignment::Right => {
                out.push_str(&" ".repeat(padding));
                out.push_str(&content);
            }
            TableAlignment::Center => {
                let left = padding / 2;
                out.push_str(&" ".repeat(left));
                out.push_str(&content);
                out.push_str(&" ".repeat(padding - left));
            }
            TableAlignment::Left | TableAlignment::None => {
                out.push_str(&content);
                out.push_str(&" ".repeat(padding));
            }
        }
        out.push_str(" │");
    }
    out
}

fn truncate_text(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) | NodeValue::HtmlInline(t) => text.push_str(t),
        NodeValue::Code(c) => {
            text.push('`');
            text.push_str(&c.literal);
            text.push('`');
        }
        NodeValue::FootnoteReference(reference) => {
            text.push_str("[^");
            text.push_str(&reference.name);
            text.push(']');
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => text.push('\n'),
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

fn wrap_spans(
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let mut lines: Vec<Vec<InlineSpan>> = Vec::new();
    let mut current: Vec<InlineSpan> = Vec::new();
    let mut current_len = 0usize;
    let mut has_word = false;

    let start_line = |prefix: &str, current: &mut Vec<InlineSpan>, current_len: &mut usize| {
        current.clear();
        *current_len = prefix.width();
        if !prefix.is_empty() {
            current.push(InlineSpan::plain(prefix));
        }
    };
    let finish_line = |current: &mut Vec<InlineSpan>, prefix: &str| {
        let keep = usize::from(!prefix.is_empty());
        while current.len() > keep
            && current
                .last()
                .is_some_and(|span| span.text().chars().all(char::is_whitespace))
        {
            current.pop();
        }
        std::mem::take(current)
    };

    let mut prefix = prefix_first;
    start_line(prefix, &mut current, &mut current_len);

    for token in spans.iter().flat_map(split_inline_tokens) {
        let token_len = token.text().width();
        let token_is_ws = token.text().chars().all(char::is_whitespace);

        if current_len + token_len > width && has_word {
            lines.push(finish_line(&mut current, prefix));
            prefix = prefix_next;
            start_line(prefix, &mut current, &mut current_len);
            has_word = false;
        }

        if token_is_ws && !has_word {
            // Leading whitespace at a line start is dropped.
            continue;
        }

        current_len += token_len;
        current.push(token);
        has_word = true;
    }

    lines.push(finish_line(&mut current, prefix));
    lines
}

fn split_inline_tokens(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut ws_state: Option<bool> = None;

    for ch in span.text().chars() {
        let is_ws = ch.is_whitespace();
        if ws_state.is_some_and(|state| state != is_ws) {
            out.push(InlineSpan::new(std::mem::take(&mut buf), span.style()));
        }
        buf.push(ch);
        ws_state = Some(is_ws);
    }

    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, span.style()));
    }

    out
}

fn truncate_spans(spans: &[InlineSpan], max_width: usize) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut remaining = max_width;
    for span in spans {
        if remaining == 0 {
            break;
        }
        let taken = truncate_text(span.text(), remaining);
        if taken.is_empty() {
            break;
        }
        remaining -= taken.width();
        let whole = taken.len() == span.text().len();
        out.push(InlineSpan::new(taken, span.style()));
        if !whole {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(source: &str, width: usize) -> Vec<RenderedLine> {
        let options = FormatOptions {
            width,
            ..FormatOptions::default()
        };
        layout_markdown(source, &options)
    }

    fn contents(lines: &[RenderedLine]) -> Vec<&str> {
        lines.iter().map(RenderedLine::content).collect()
    }

    #[test]
    fn test_empty_document_has_no_lines() {
        assert!(layout("", 80).is_empty());
    }

    #[test]
    fn test_heading_keeps_hash_prefix() {
        let lines = layout("## Section", 80);
        assert_eq!(contents(&lines), vec!["## Section"]);
        assert_eq!(lines[0].line_type(), LineType::Heading(2));
    }

    #[test]
    fn test_heading_is_separated_from_previous_block() {
        let lines = layout("para\n# Next", 80);
        assert_eq!(contents(&lines), vec!["para", "", "# Next"]);
    }

    #[test]
    fn test_paragraph_wraps_to_width() {
        let lines = layout("one two three four five six", 10);
        assert_eq!(contents(&lines), vec!["one two", "three four", "five six"]);
    }

    #[test]
    fn test_soft_breaks_are_reflowed() {
        let lines = layout("alpha\nbeta", 80);
        assert_eq!(contents(&lines), vec!["alpha beta"]);
    }

    #[test]
    fn test_inline_styles_create_spans() {
        let lines = layout("plain *em* **strong** `code` ~~gone~~", 80);
        let spans = lines[0].spans().unwrap();
        let style_of = |text: &str| {
            spans
                .iter()
                .find(|span| span.text() == text)
                .map(InlineSpan::style)
                .unwrap()
        };
        assert!(style_of("em").emphasis);
        assert!(style_of("strong").strong);
        assert!(style_of("code").code);
        assert!(style_of("gone").strikethrough);
    }

    #[test]
    fn test_link_uses_link_rule() {
        let lines = layout("see [docs](https://example.com) now", 80);
        assert_eq!(lines[0].content(), "see docs (https://example.com) now");
    }

    #[test]
    fn test_autolink_shows_url_once() {
        let lines = layout("visit https://example.com", 80);
        assert_eq!(lines[0].content(), "visit https://example.com");
    }

    #[test]
    fn test_code_block_renders_frame_without_fences() {
        let lines = layout("```rust\nfn main() {}\n```", 80);
        assert_eq!(
            contents(&lines),
            vec![
                "┌ rust ─────────┐",
                "│ fn main() {}  │",
                "└───────────────┘",
            ]
        );
    }

    #[test]
    fn test_code_frame_lines_have_equal_width() {
        let lines = layout("```text\n┌───┐\n│ A │\n└───┘\n```", 80);
        let widths: Vec<usize> = lines.iter().map(|l| l.content().width()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{widths:?}");
        assert!(lines[0].content().starts_with("┌ text "));
        assert_eq!(lines[2].content(), "│ │ A │  │");
    }

    #[test]
    fn test_code_block_truncates_to_width() {
        let lines = layout("```\nabcdefghijklmnopqrstuvwxyz\n```", 15);
        assert!(lines.iter().all(|l| l.content().width() <= 15));
        assert!(lines[1].content().starts_with("│ abcdefghij"));
    }

    #[test]
    fn test_unordered_list_uses_bullet_character() {
        let lines = layout("- one\n- two", 80);
        assert_eq!(contents(&lines), vec!["• one", "• two"]);
    }

    #[test]
    fn test_ordered_list_alignment_for_two_digits() {
        let source = (1..=10)
            .map(|i| format!("{i}. item"))
            .collect::<Vec<_>>()
            .join("\n");
        let lines = layout(&source, 80);
        assert_eq!(lines[0].content(), " 1. item");
        assert_eq!(lines[9].content(), "10. item");
    }

    #[test]
    fn test_list_wraps_with_hanging_indent() {
        let lines = layout("- alpha beta gamma delta", 12);
        assert_eq!(contents(&lines), vec!["• alpha beta", "  gamma", "  delta"]);
    }

    #[test]
    fn test_nested_list_indents_children() {
        let lines = layout("- parent\n  - child", 80);
        assert_eq!(contents(&lines), vec!["• parent", "  • child"]);
    }

    #[test]
    fn test_task_list_marker() {
        let lines = layout("- [x] done\n- [ ] todo", 80);
        assert_eq!(contents(&lines), vec!["✓ done", "□ todo"]);
    }

    #[test]
    fn test_blockquote_wraps_with_quote_prefix() {
        let lines = layout("> quoted words here", 12);
        assert!(lines.iter().all(|l| l.content().starts_with("  │ ")));
        assert_eq!(lines[0].line_type(), LineType::BlockQuote);
        assert!(lines.len() > 1);
    }

    #[test]
    fn test_nested_blockquote_adds_bar() {
        let lines = layout("> outer\n>\n> > inner", 80);
        assert!(contents(&lines).contains(&"  │ │ inner"));
    }

    #[test]
    fn test_gfm_table() {
        let lines = layout("| a | b |\n|---|--:|\n| x | 10 |", 80);
        assert_eq!(
            contents(&lines),
            vec![
                "┌───┬────┐",
                "│ a │  b │",
                "├───┼────┤",
                "│ x │ 10 │",
                "└───┴────┘",
            ]
        );
    }

    #[test]
    fn test_gfm_table_respects_layout_width() {
        let lines = layout(
            "| column one | column two |\n|---|---|\n| a long cell value | another long value |",
            24,
        );
        assert!(lines.iter().all(|l| l.content().width() <= 24));
    }

    #[test]
    fn test_thematic_break() {
        let lines = layout("a\n\n---\n\nb", 10);
        assert_eq!(contents(&lines), vec!["a", "", "──────────", "", "b"]);
    }

    #[test]
    fn test_footnote_reference_and_definition_render() {
        let lines = layout("text[^1]\n\n[^1]: the note", 80);
        let all = contents(&lines).join("\n");
        assert!(all.contains("text[^1]"));
        assert!(all.contains("[^1]: the note"));
    }

    #[test]
    fn test_wrap_drops_trailing_whitespace() {
        let spans = vec![InlineSpan::plain("aaa bbb")];
        let wrapped = wrap_spans(&spans, 4, "", "");
        let texts: Vec<String> = wrapped
            .iter()
            .map(|line| line.iter().map(InlineSpan::text).collect())
            .collect();
        assert_eq!(texts, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_truncate_spans_counts_display_width() {
        let spans = vec![InlineSpan::plain("日本語")];
        let truncated = truncate_spans(&spans, 5);
        assert_eq!(truncated[0].text(), "日本");
    }
}
