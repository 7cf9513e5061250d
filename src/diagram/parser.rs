//! Flowchart source parsing.
//!
//! Accepts the `flowchart` / `graph` grammar: node declarations with shapes,
//! edge chains, `&` groups and the two edge-label forms. Styling statements
//! are accepted and ignored.

use std::collections::HashMap;

use super::DiagramError;

/// Layout direction declared in the flowchart header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl Direction {
    /// Layers advance along the x axis.
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    /// Layers advance towards the origin (bottom-up or right-to-left).
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::BottomUp | Self::RightLeft)
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeShape {
    #[default]
    Rect,
    Rounded,
    Circle,
    Decision,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
    Thick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    /// Label lines; `<br>` in the source splits lines.
    pub label: Vec<String>,
    pub shape: NodeShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
    pub line: LineStyle,
    pub arrow: bool,
}

/// A parsed flowchart. Edge endpoints index into `nodes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flowchart {
    pub direction: Direction,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Flowchart {
    /// Look up a node by its identifier.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

const IGNORED_KEYWORDS: &[&str] = &[
    "subgraph",
    "end",
    "classDef",
    "class",
    "style",
    "linkStyle",
    "click",
    "direction",
];

/// Parse flowchart source.
///
/// # Errors
///
/// Returns [`DiagramError::Empty`] for blank input,
/// [`DiagramError::Unsupported`] when the header names another diagram
/// type and [`DiagramError::Parse`] for malformed statements.
pub fn parse_flowchart(source: &str) -> Result<Flowchart, DiagramError> {
    let mut lines = source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, strip_comment(line).trim()))
        .filter(|(_, line)| !line.is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Err(DiagramError::Empty);
    };

    let mut header_parts = split_statements(header).into_iter();
    let header_decl = header_parts.next().unwrap_or_default();
    let mut words = header_decl.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    if keyword != "flowchart" && keyword != "graph" {
        return Err(DiagramError::Unsupported(keyword.to_string()));
    }
    let direction = match words.next() {
        None => Direction::default(),
        Some(token) => Direction::parse(token).ok_or_else(|| DiagramError::Parse {
            line: header_line,
            message: format!("unknown direction `{token}`"),
        })?,
    };

    let mut builder = ChartBuilder::default();
    for statement in header_parts {
        builder
            .statement(statement)
            .map_err(|message| DiagramError::Parse {
                line: header_line,
                message,
            })?;
    }
    for (line_no, line) in lines {
        for statement in split_statements(line) {
            builder
                .statement(statement)
                .map_err(|message| DiagramError::Parse {
                    line: line_no,
                    message,
                })?;
        }
    }

    Ok(Flowchart {
        direction,
        nodes: builder.nodes,
        edges: builder.edges,
    })
}

fn strip_comment(line: &str) -> &str {
    line.find("%%").map_or(line, |pos| &line[..pos])
}

/// Split a line on `;` outside quoted labels.
fn split_statements(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(line[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(line[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

#[derive(Debug, Default)]
struct ChartBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

struct Link {
    line: LineStyle,
    arrow: bool,
    label: Option<String>,
}

impl ChartBuilder {
    fn statement(&mut self, text: &str) -> Result<(), String> {
        let first_word = text.split_whitespace().next().unwrap_or_default();
        if IGNORED_KEYWORDS.contains(&first_word) {
            return Ok(());
        }

        let mut cursor = Cursor::new(text);
        let mut previous = self.node_group(&mut cursor)?;
        loop {
            cursor.skip_ws();
            if cursor.eof() {
                break;
            }
            let link = cursor.link()?;
            let next = self.node_group(&mut cursor)?;
            for &from in &previous {
                for &to in &next {
                    self.edges.push(Edge {
                        from,
                        to,
                        label: link.label.clone(),
                        line: link.line,
                        arrow: link.arrow,
                    });
                }
            }
            previous = next;
        }
        Ok(())
    }

    fn node_group(&mut self, cursor: &mut Cursor) -> Result<Vec<usize>, String> {
        let mut group = vec![self.node_ref(cursor)?];
        loop {
            cursor.skip_ws();
            if !cursor.eat('&') {
                return Ok(group);
            }
            group.push(self.node_ref(cursor)?);
        }
    }

    fn node_ref(&mut self, cursor: &mut Cursor) -> Result<usize, String> {
        cursor.skip_ws();
        let column = cursor.column();
        let id = cursor.identifier();
        if id.is_empty() {
            return Err(match cursor.peek(0) {
                Some(ch) => format!("expected a node id at column {column}, found `{ch}`"),
                None => format!("expected a node id at column {column}"),
            });
        }
        let shape = cursor.shape(&id)?;
        Ok(self.intern(id, shape))
    }

    fn intern(&mut self, id: String, shape: Option<(NodeShape, String)>) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            if let Some((shape, label)) = shape {
                let node = &mut self.nodes[idx];
                node.shape = shape;
                node.label = split_label(&label);
            }
            return idx;
        }
        let (shape, label) = shape.unwrap_or_else(|| (NodeShape::Rect, id.clone()));
        let idx = self.nodes.len();
        self.index.insert(id.clone(), idx);
        self.nodes.push(Node {
            id,
            label: split_label(&label),
            shape,
        });
        idx
    }
}

fn split_label(label: &str) -> Vec<String> {
    let normalized = label
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n");
    normalized
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn column(&self) -> usize {
        self.pos + 1
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, ch)| self.peek(i) == Some(ch))
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek(0) == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.chars().count();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek(0).is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek(0).is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn identifier(&mut self) -> String {
        self.take_while(|ch| ch.is_alphanumeric() || ch == '_')
    }

    fn shape(&mut self, id: &str) -> Result<Option<(NodeShape, String)>, String> {
        let (shape, closer) = if self.eat_str("((") {
            (NodeShape::Circle, "))")
        } else if self.eat('(') {
            (NodeShape::Rounded, ")")
        } else if self.eat('{') {
            (NodeShape::Decision, "}")
        } else if self.eat('[') {
            (NodeShape::Rect, "]")
        } else {
            return Ok(None);
        };

        self.skip_ws();
        let label = if self.eat('"') {
            let text = self.take_while(|ch| ch != '"');
            if !self.eat('"') {
                return Err(format!("unterminated quoted label for `{id}`"));
            }
            self.skip_ws();
            text
        } else {
            let first = closer.chars().next().unwrap_or(']');
            self.take_while(|ch| ch != first)
        };

        if !self.eat_str(closer) {
            return Err(format!("unterminated label for `{id}`, expected `{closer}`"));
        }
        Ok(Some((shape, label.trim().to_string())))
    }

    fn link(&mut self) -> Result<Link, String> {
        let column = self.column();
        let line = match (self.peek(0), self.peek(1)) {
            (Some('-'), Some('.')) => LineStyle::Dotted,
            (Some('-'), Some('-')) => LineStyle::Solid,
            (Some('='), Some('=')) => LineStyle::Thick,
            _ => return Err(format!("expected an edge at column {column}")),
        };
        let token = self.take_while(|ch| matches!(ch, '-' | '.' | '='));
        let mut arrow = self.eat('>');
        let mut label = None;

        if !arrow && token.chars().count() == 2 {
            let (text, closed_with_arrow) = self.inline_label(line, column)?;
            arrow = closed_with_arrow;
            label = Some(text);
        }

        self.skip_ws();
        if self.eat('|') {
            let text = self.take_while(|ch| ch != '|');
            if !self.eat('|') {
                return Err(format!("unterminated edge label at column {column}"));
            }
            label = Some(text.trim().to_string());
        }

        Ok(Link {
            line,
            arrow,
            label: label.filter(|text| !text.is_empty()),
        })
    }

    /// Read `text -->` after an opening `--`, `-.` or `==`.
    fn inline_label(&mut self, line: LineStyle, column: usize) -> Result<(String, bool), String> {
        let closers: &[&str] = match line {
            LineStyle::Solid => &["-->", "---"],
            LineStyle::Dotted => &[".->", ".-"],
            LineStyle::Thick => &["==>", "==="],
        };
        let start = self.pos;
        while !self.eof() {
            if let Some(closer) = closers.iter().find(|closer| self.starts_with(closer)) {
                let text: String = self.chars[start..self.pos].iter().collect();
                self.pos += closer.chars().count();
                self.take_while(|ch| matches!(ch, '-' | '.' | '='));
                let arrow = closer.ends_with('>') || self.eat('>');
                return Ok((text.trim().to_string(), arrow));
            }
            self.pos += 1;
        }
        Err(format!("unterminated edge label at column {column}"))
    }
}
