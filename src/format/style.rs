//! Terminal styling for laid-out lines.
//!
//! Uses ANSI colors that adapt to the terminal's palette, with darker
//! indexed colors when the terminal reports a light background.

use std::fmt::Write;

use crossterm::style::{Attribute, Color, ContentStyle};

use super::types::{InlineColor, InlineStyle, LineType, RenderedLine};
use crate::highlight::is_light_background;

/// Base style for a line type.
pub fn style_for_line_type(line_type: LineType, light_bg: bool) -> ContentStyle {
    let pick = |light: u8, dark: Color| {
        if light_bg {
            Color::AnsiValue(light)
        } else {
            dark
        }
    };
    match line_type {
        // Headings: bold, distinct color per level
        LineType::Heading(1) => {
            styled(pick(24, Color::Cyan), &[Attribute::Bold, Attribute::Underlined])
        }
        LineType::Heading(2) => styled(pick(22, Color::Green), &[Attribute::Bold]),
        LineType::Heading(3) => styled(pick(58, Color::Yellow), &[Attribute::Bold]),
        LineType::Heading(4) => styled(pick(24, Color::Blue), &[Attribute::Bold]),
        LineType::Heading(5) => styled(pick(54, Color::Magenta), &[Attribute::Bold]),
        LineType::Heading(_) => styled(pick(24, Color::Cyan), &[Attribute::Bold]),
        LineType::CodeBlock => styled(pick(238, Color::AnsiValue(245)), &[]),
        LineType::BlockQuote => styled(pick(24, Color::Blue), &[Attribute::Italic]),
        LineType::HorizontalRule => styled(pick(241, Color::AnsiValue(240)), &[Attribute::Dim]),
        LineType::ListItem(_) | LineType::Table | LineType::Paragraph | LineType::Empty => {
            ContentStyle::new()
        }
    }
}

fn styled(fg: Color, attributes: &[Attribute]) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(fg);
    for attribute in attributes {
        style.attributes.set(*attribute);
    }
    style
}

/// Merge inline flags onto a line's base style.
pub fn style_for_inline(base: ContentStyle, inline: InlineStyle, light_bg: bool) -> ContentStyle {
    let mut style = base;

    if let Some(fg) = inline.fg {
        style.foreground_color = Some(rgb(fg));
        style.attributes.unset(Attribute::Dim);
    }
    if let Some(bg) = inline.bg {
        style.background_color = Some(rgb(bg));
    }
    if inline.emphasis {
        style.attributes.set(Attribute::Italic);
    }
    if inline.strong {
        style.attributes.set(Attribute::Bold);
    }
    if inline.strikethrough {
        style.attributes.set(Attribute::CrossedOut);
    }
    if inline.link {
        style.attributes.set(Attribute::Underlined);
        if inline.fg.is_none() {
            style.foreground_color = Some(if light_bg {
                Color::Blue
            } else {
                Color::Rgb {
                    r: 110,
                    g: 170,
                    b: 255,
                }
            });
        }
    }
    if inline.code && inline.fg.is_none() && base.foreground_color.is_none() {
        style.foreground_color = Some(if light_bg {
            Color::AnsiValue(88)
        } else {
            Color::Red
        });
    }

    style
}

const fn rgb(color: InlineColor) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Turn a line into terminal text, with escape codes when `color` is set.
pub fn paint_line(line: &RenderedLine, color: bool) -> String {
    if !color {
        return line.content().to_string();
    }
    let light_bg = is_light_background();
    let base = style_for_line_type(line.line_type(), light_bg);
    let mut out = String::new();
    match line.spans() {
        Some(spans) => {
            for span in spans {
                let style = style_for_inline(base, span.style(), light_bg);
                let _ = write!(out, "{}", style.apply(span.text()));
            }
        }
        None => {
            let _ = write!(out, "{}", base.apply(line.content()));
        }
    }
    out
}
