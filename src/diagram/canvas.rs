//! Character grid with line-junction merging.

use unicode_width::UnicodeWidthChar;

use super::Charset;
use super::parser::LineStyle;

const UP: u8 = 0b0001;
const DOWN: u8 = 0b0010;
const LEFT: u8 = 0b0100;
const RIGHT: u8 = 0b1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Glyph(char),
    /// Trailing half of a double-width glyph.
    Continuation,
    Line { arms: u8, style: LineStyle },
}

/// A growable grid of cells.
///
/// Lines are stored as connection arms so crossing and branching edges
/// resolve to the right junction glyph when the grid is rendered. Glyphs
/// (box borders, labels, arrows) are never overwritten by lines.
#[derive(Debug)]
pub(super) struct Canvas {
    rows: Vec<Vec<Cell>>,
    charset: Charset,
}

impl Canvas {
    pub(super) const fn new(charset: Charset) -> Self {
        Self {
            rows: Vec::new(),
            charset,
        }
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        if self.rows.len() <= y {
            self.rows.resize_with(y + 1, Vec::new);
        }
        let row = &mut self.rows[y];
        if row.len() <= x {
            row.resize(x + 1, Cell::Empty);
        }
        &mut row[x]
    }

    fn cell(&self, x: usize, y: usize) -> Cell {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    pub(super) fn glyph_at(&self, x: usize, y: usize) -> Option<char> {
        match self.cell(x, y) {
            Cell::Glyph(ch) => Some(ch),
            _ => None,
        }
    }

    /// Place a single glyph, replacing whatever was there.
    pub(super) fn put(&mut self, x: usize, y: usize, ch: char) {
        *self.cell_mut(x, y) = Cell::Glyph(ch);
        if ch.width().unwrap_or(1) == 2 {
            *self.cell_mut(x + 1, y) = Cell::Continuation;
        }
    }

    /// Write text starting at `x`, advancing by display width.
    pub(super) fn text(&mut self, x: usize, y: usize, text: &str) {
        let mut col = x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            self.put(col, y, ch);
            col += width;
        }
    }

    fn add_arms(&mut self, x: usize, y: usize, arms: u8, style: LineStyle) {
        let cell = self.cell_mut(x, y);
        match *cell {
            Cell::Empty => *cell = Cell::Line { arms, style },
            Cell::Line {
                arms: existing,
                style: existing_style,
            } => {
                *cell = Cell::Line {
                    arms: existing | arms,
                    style: if existing_style == LineStyle::Solid {
                        existing_style
                    } else {
                        style
                    },
                };
            }
            Cell::Glyph(_) | Cell::Continuation => {}
        }
    }

    /// Draw an axis-aligned segment between two points, inclusive.
    pub(super) fn segment(&mut self, from: (usize, usize), to: (usize, usize), style: LineStyle) {
        let ((x0, y0), (x1, y1)) = (from, to);
        if from == to {
            return;
        }
        if y0 == y1 {
            let (start, end) = (x0.min(x1), x0.max(x1));
            for x in start..=end {
                let mut arms = 0;
                if x > start {
                    arms |= LEFT;
                }
                if x < end {
                    arms |= RIGHT;
                }
                self.add_arms(x, y0, arms, style);
            }
        } else if x0 == x1 {
            let (start, end) = (y0.min(y1), y0.max(y1));
            for y in start..=end {
                let mut arms = 0;
                if y > start {
                    arms |= UP;
                }
                if y < end {
                    arms |= DOWN;
                }
                self.add_arms(x0, y, arms, style);
            }
        } else {
            debug_assert!(false, "diagonal segment {from:?} -> {to:?}");
        }
    }

    /// Draw consecutive segments through `points`.
    pub(super) fn polyline(&mut self, points: &[(usize, usize)], style: LineStyle) {
        for pair in points.windows(2) {
            self.segment(pair[0], pair[1], style);
        }
    }

    /// Render the grid, trimming trailing spaces and blank trailing rows.
    pub(super) fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let mut line = String::with_capacity(row.len());
                for cell in row {
                    match *cell {
                        Cell::Empty => line.push(' '),
                        Cell::Glyph(ch) => line.push(ch),
                        Cell::Continuation => {}
                        Cell::Line { arms, style } => line.push(self.line_glyph(arms, style)),
                    }
                }
                line.trim_end().to_string()
            })
            .collect();
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines.join("\n")
    }

    fn line_glyph(&self, arms: u8, style: LineStyle) -> char {
        let horizontal = arms & (UP | DOWN) == 0;
        let vertical = arms & (LEFT | RIGHT) == 0;
        match self.charset {
            Charset::Ascii => {
                if horizontal {
                    match style {
                        LineStyle::Solid => '-',
                        LineStyle::Dotted => '.',
                        LineStyle::Thick => '=',
                    }
                } else if vertical {
                    match style {
                        LineStyle::Dotted => ':',
                        LineStyle::Solid | LineStyle::Thick => '|',
                    }
                } else {
                    '+'
                }
            }
            Charset::Unicode => {
                if horizontal {
                    return match style {
                        LineStyle::Solid => '─',
                        LineStyle::Dotted => '┄',
                        LineStyle::Thick => '━',
                    };
                }
                if vertical {
                    return match style {
                        LineStyle::Solid => '│',
                        LineStyle::Dotted => '┆',
                        LineStyle::Thick => '┃',
                    };
                }
                match arms {
                    a if a == DOWN | RIGHT => '┌',
                    a if a == DOWN | LEFT => '┐',
                    a if a == UP | RIGHT => '└',
                    a if a == UP | LEFT => '┘',
                    a if a == UP | DOWN | RIGHT => '├',
                    a if a == UP | DOWN | LEFT => '┤',
                    a if a == LEFT | RIGHT | DOWN => '┬',
                    a if a == LEFT | RIGHT | UP => '┴',
                    _ => '┼',
                }
            }
        }
    }
}
