//! Syntax highlighting for code blocks.
//!
//! Uses syntect for highlighting with Sublime Text syntax definitions.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::format::{InlineColor, InlineSpan, InlineStyle};

/// Fence languages that are shown as-is.
const PLAIN_LANGUAGES: &[&str] = &["text", "txt", "plain", "plaintext"];

/// Whether a fence language should go through the highlighter.
pub fn is_highlightable(language: Option<&str>) -> bool {
    language.is_some_and(|lang| {
        !PLAIN_LANGUAGES
            .iter()
            .any(|plain| plain.eq_ignore_ascii_case(lang))
    })
}

/// Split `code` into lines of styled spans.
///
/// Unknown and plain languages produce uncolored code spans.
pub fn highlight_code(language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>> {
    let plain_style = InlineStyle {
        code: true,
        ..InlineStyle::default()
    };
    let syntax_set = syntax_set();
    let syntax = language
        .filter(|lang| is_highlightable(Some(lang)))
        .and_then(|lang| {
            syntax_set
                .find_syntax_by_token(lang)
                .or_else(|| syntax_set.find_syntax_by_name(lang))
        });

    let Some(syntax) = syntax else {
        return code
            .lines()
            .map(|line| vec![InlineSpan::new(line.to_string(), plain_style)])
            .collect();
    };

    let _scope = crate::perf::scope("highlight.code_block");
    let mode = background_mode();
    let mut highlighter = HighlightLines::new(syntax, theme());
    let mut lines = Vec::new();
    for line in code.lines() {
        let ranges = highlighter
            .highlight_line(line, syntax_set)
            .unwrap_or_default();
        let spans = ranges
            .into_iter()
            .map(|(style, text)| {
                let fg = InlineColor {
                    r: style.foreground.r,
                    g: style.foreground.g,
                    b: style.foreground.b,
                };
                InlineSpan::new(
                    text.to_string(),
                    InlineStyle {
                        fg: Some(adjust_fg_for_background(fg, mode)),
                        ..plain_style
                    },
                )
            })
            .collect();
        lines.push(spans);
    }

    lines
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            BackgroundMode::Dark => [
                "Monokai Extended",
                "base16-eighties.dark",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
            BackgroundMode::Light => [
                "InspiredGitHub",
                "Solarized (light)",
                "base16-ocean.light",
            ]
            .as_slice(),
        };

        for name in preferred {
            if let Some(theme) = theme_set.themes.get(*name) {
                return theme.clone();
            }
        }

        theme_set
            .themes
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

fn background_mode() -> BackgroundMode {
    static MODE: OnceLock<BackgroundMode> = OnceLock::new();
    *MODE.get_or_init(|| {
        background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
    })
}

/// Whether the terminal reports a light background through `COLORFGBG`.
pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return BackgroundMode::Dark;
    };

    if bg >= 7 {
        BackgroundMode::Light
    } else {
        BackgroundMode::Dark
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn adjust_fg_for_background(color: InlineColor, mode: BackgroundMode) -> InlineColor {
    match mode {
        BackgroundMode::Dark => color,
        BackgroundMode::Light => {
            if luma(color) < 155.0 {
                return color;
            }
            let darken = |channel: u8| (f32::from(channel) * 0.42).round() as u8;
            InlineColor {
                r: darken(color.r),
                g: darken(color.g),
                b: darken(color.b),
            }
        }
    }
}

fn luma(color: InlineColor) -> f32 {
    0.0722f32.mul_add(
        f32::from(color.b),
        0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_produces_colored_spans() {
        let code = "fn main() {\n    let x = 1;\n}\n";
        let lines = highlight_code(Some("rust"), code);

        assert_eq!(lines.len(), 3);
        let has_color = lines
            .iter()
            .flatten()
            .any(|span| span.style().fg.is_some());
        assert!(has_color, "Expected at least one colored span for Rust");
    }

    #[test]
    fn test_highlight_unknown_language_falls_back_to_plain() {
        let lines = highlight_code(Some("nope"), "just text");

        assert_eq!(lines.len(), 1);
        assert!(lines.iter().flatten().all(|span| span.style().fg.is_none()));
    }

    #[test]
    fn test_text_fence_is_never_colored() {
        let art = "┌───┐\n│ A │\n└───┘";
        for lang in ["text", "txt", "plain", "TEXT"] {
            let lines = highlight_code(Some(lang), art);
            assert_eq!(lines.len(), 3);
            assert!(lines.iter().flatten().all(|span| span.style().fg.is_none()));
            assert_eq!(lines[1][0].text(), "│ A │");
        }
    }

    #[test]
    fn test_is_highlightable() {
        assert!(is_highlightable(Some("rust")));
        assert!(!is_highlightable(Some("text")));
        assert!(!is_highlightable(None));
    }

    #[test]
    fn test_highlight_plain_code_sets_code_style() {
        let lines = highlight_code(None, "plain");
        assert!(lines[0].iter().all(|span| span.style().code));
    }

    #[test]
    fn test_highlight_does_not_set_background_color() {
        let lines = highlight_code(Some("rust"), "fn main() {}");
        assert!(lines.iter().flatten().all(|span| span.style().bg.is_none()));
    }

    #[test]
    fn test_colorfgbg_dark_background() {
        assert_eq!(
            background_mode_from_colorfgbg(Some("15;0")),
            BackgroundMode::Dark
        );
    }

    #[test]
    fn test_colorfgbg_light_background() {
        assert_eq!(
            background_mode_from_colorfgbg(Some("0;15")),
            BackgroundMode::Light
        );
    }

    #[test]
    fn test_colorfgbg_missing_or_garbage_is_dark() {
        assert_eq!(background_mode_from_colorfgbg(None), BackgroundMode::Dark);
        assert_eq!(
            background_mode_from_colorfgbg(Some("default")),
            BackgroundMode::Dark
        );
    }

    #[test]
    fn test_light_mode_caps_luma_for_readability() {
        let bright = InlineColor {
            r: 240,
            g: 230,
            b: 120,
        };
        let adjusted = adjust_fg_for_background(bright, BackgroundMode::Light);
        assert!(adjusted.r < bright.r);
        assert!(luma(adjusted) < 120.0, "Adjusted color still too bright");
        assert_eq!(adjust_fg_for_background(bright, BackgroundMode::Dark), bright);
    }
}
