//! Layered layout and orthogonal edge routing.
//!
//! The pipeline is the usual layered one: break cycles by reversing DFS back
//! edges, assign longest-path layers, split long edges with dummy slots,
//! order each layer by barycentre, then place layers along the flow axis and
//! route every edge as a polyline with one jog per layer gap.

use std::collections::VecDeque;

use unicode_width::UnicodeWidthStr;

use super::Charset;
use super::canvas::Canvas;
use super::parser::{Direction, Edge, Flowchart, Node, NodeShape};

/// Columns between siblings in a top-down layer.
const SIBLING_GAP_COLS: usize = 2;
/// Rows between siblings in a left-right layer.
const SIBLING_GAP_ROWS: usize = 1;
/// Columns between left-right layers when no edge label needs room.
const LAYER_GAP_COLS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Node(usize),
    Dummy,
}

/// A node or long-edge waypoint occupying a position in one layer.
#[derive(Debug, Clone)]
struct Slot {
    kind: SlotKind,
    layer: usize,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
}

impl Slot {
    const fn is_dummy(&self) -> bool {
        matches!(self.kind, SlotKind::Dummy)
    }

    const fn center_x(&self) -> usize {
        self.x + self.width / 2
    }

    const fn middle_y(&self) -> usize {
        self.y + self.height / 2
    }

    const fn right(&self) -> usize {
        self.x + self.width.saturating_sub(1)
    }

    const fn bottom(&self) -> usize {
        self.y + self.height.saturating_sub(1)
    }
}

/// Lay out and paint a flowchart onto a text grid.
pub(super) fn draw(chart: &Flowchart, charset: Charset) -> String {
    let mut layout = Layout::build(chart);
    layout.order();
    layout.place(chart);
    layout.paint(chart, charset)
}

#[derive(Debug)]
struct Layout {
    direction: Direction,
    slots: Vec<Slot>,
    /// Slot ids per logical layer, in drawing order.
    layers: Vec<Vec<usize>>,
    /// Slot ids per edge from logical source to logical sink. `None` for
    /// self loops, which are not drawn.
    chains: Vec<Option<Vec<usize>>>,
    /// Start coordinate and extent of each positional layer along the flow axis.
    layer_start: Vec<usize>,
    layer_size: Vec<usize>,
}

impl Layout {
    fn build(chart: &Flowchart) -> Self {
        let node_count = chart.nodes.len();
        let reversed = back_edges(node_count, &chart.edges);
        let logical: Vec<Option<(usize, usize)>> = chart
            .edges
            .iter()
            .zip(&reversed)
            .map(|(edge, &flip)| {
                if edge.from == edge.to {
                    None
                } else if flip {
                    Some((edge.to, edge.from))
                } else {
                    Some((edge.from, edge.to))
                }
            })
            .collect();
        let node_layers = longest_path_layers(node_count, &logical);
        let layer_count = node_layers.iter().max().map_or(0, |max| max + 1);

        let mut slots: Vec<Slot> = chart
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let (width, height) = node_size(node);
                Slot {
                    kind: SlotKind::Node(idx),
                    layer: node_layers[idx],
                    width,
                    height,
                    x: 0,
                    y: 0,
                }
            })
            .collect();

        let mut layers = vec![Vec::new(); layer_count];
        for (idx, &layer) in node_layers.iter().enumerate() {
            layers[layer].push(idx);
        }

        let mut chains = Vec::with_capacity(logical.len());
        for pair in logical {
            let Some((from, to)) = pair else {
                chains.push(None);
                continue;
            };
            let mut chain = vec![from];
            for layer in node_layers[from] + 1..node_layers[to] {
                let id = slots.len();
                slots.push(Slot {
                    kind: SlotKind::Dummy,
                    layer,
                    width: 1,
                    height: 1,
                    x: 0,
                    y: 0,
                });
                layers[layer].push(id);
                chain.push(id);
            }
            chain.push(to);
            chains.push(Some(chain));
        }

        Self {
            direction: chart.direction,
            slots,
            layers,
            chains,
            layer_start: Vec::new(),
            layer_size: Vec::new(),
        }
    }

    /// Reduce crossings with alternating barycentre sweeps.
    fn order(&mut self) {
        let mut preds = vec![Vec::new(); self.slots.len()];
        let mut succs = vec![Vec::new(); self.slots.len()];
        for chain in self.chains.iter().flatten() {
            for pair in chain.windows(2) {
                succs[pair[0]].push(pair[1]);
                preds[pair[1]].push(pair[0]);
            }
        }

        let layer_count = self.layers.len();
        for _ in 0..2 {
            for layer in 1..layer_count {
                self.reorder(layer, &preds);
            }
            for layer in (0..layer_count.saturating_sub(1)).rev() {
                self.reorder(layer, &succs);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn reorder(&mut self, layer: usize, neighbours: &[Vec<usize>]) {
        let mut position = vec![0usize; self.slots.len()];
        for slots in &self.layers {
            for (idx, &slot) in slots.iter().enumerate() {
                position[slot] = idx;
            }
        }

        let mut keyed: Vec<(f64, usize)> = self.layers[layer]
            .iter()
            .enumerate()
            .map(|(idx, &slot)| {
                let adjacent = &neighbours[slot];
                let key = if adjacent.is_empty() {
                    idx as f64
                } else {
                    adjacent.iter().map(|&n| position[n] as f64).sum::<f64>()
                        / adjacent.len() as f64
                };
                (key, slot)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.layers[layer] = keyed.into_iter().map(|(_, slot)| slot).collect();
    }

    fn positional(&self, layer: usize) -> usize {
        if self.direction.is_reversed() {
            self.layers.len() - 1 - layer
        } else {
            layer
        }
    }

    fn logical(&self, positional: usize) -> usize {
        self.positional(positional)
    }

    /// Slot ids of an edge ordered along the flow axis.
    fn positional_chain(&self, edge: usize) -> Option<Vec<usize>> {
        let mut chain = self.chains[edge].clone()?;
        if self.direction.is_reversed() {
            chain.reverse();
        }
        Some(chain)
    }

    fn layer_end(&self, slot: &Slot) -> usize {
        let p = self.positional(slot.layer);
        self.layer_start[p] + self.layer_size[p].saturating_sub(1)
    }

    fn layer_begin(&self, slot: &Slot) -> usize {
        self.layer_start[self.positional(slot.layer)]
    }

    fn place(&mut self, chart: &Flowchart) {
        if self.direction.is_horizontal() {
            self.place_horizontal(chart);
        } else {
            self.place_vertical(chart);
        }
    }

    fn place_vertical(&mut self, chart: &Flowchart) {
        let gap_rows = if chart.edges.iter().any(|e| e.label.is_some()) {
            4
        } else {
            3
        };
        let layer_count = self.layers.len();
        self.layer_start = vec![0; layer_count];
        self.layer_size = vec![1; layer_count];

        let mut y = 0;
        let mut widths = vec![0; layer_count];
        for p in 0..layer_count {
            let members = &self.layers[self.logical(p)];
            let height = members
                .iter()
                .map(|&s| self.slots[s].height)
                .max()
                .unwrap_or(1);
            self.layer_start[p] = y;
            self.layer_size[p] = height;
            y += height + gap_rows;
            widths[p] = members.iter().map(|&s| self.slots[s].width).sum::<usize>()
                + SIBLING_GAP_COLS * members.len().saturating_sub(1);
        }

        let max_width = widths.iter().copied().max().unwrap_or(0);
        for p in 0..layer_count {
            let layer = self.logical(p);
            let mut x = (max_width - widths[p]) / 2;
            for idx in 0..self.layers[layer].len() {
                let id = self.layers[layer][idx];
                let slot = &mut self.slots[id];
                slot.x = x;
                slot.y = self.layer_start[p];
                if slot.is_dummy() {
                    slot.height = self.layer_size[p];
                }
                x += slot.width + SIBLING_GAP_COLS;
            }
        }
    }

    fn place_horizontal(&mut self, chart: &Flowchart) {
        let layer_count = self.layers.len();
        let mut gaps = vec![LAYER_GAP_COLS; layer_count];
        for (idx, edge) in chart.edges.iter().enumerate() {
            let (Some(label), Some(chain)) = (&edge.label, self.positional_chain(idx)) else {
                continue;
            };
            let p = self.positional(self.slots[chain[0]].layer);
            gaps[p] = gaps[p].max(label.width() + 6);
        }

        self.layer_start = vec![0; layer_count];
        self.layer_size = vec![1; layer_count];
        let mut x = 0;
        let mut heights = vec![0; layer_count];
        for p in 0..layer_count {
            let members = &self.layers[self.logical(p)];
            let width = members
                .iter()
                .map(|&s| self.slots[s].width)
                .max()
                .unwrap_or(1);
            self.layer_start[p] = x;
            self.layer_size[p] = width;
            x += width + gaps[p];
            heights[p] = members.iter().map(|&s| self.slots[s].height).sum::<usize>()
                + SIBLING_GAP_ROWS * members.len().saturating_sub(1);
        }

        let max_height = heights.iter().copied().max().unwrap_or(0);
        for p in 0..layer_count {
            let layer = self.logical(p);
            let mut y = (max_height - heights[p]) / 2;
            for idx in 0..self.layers[layer].len() {
                let id = self.layers[layer][idx];
                let slot = &mut self.slots[id];
                slot.x = self.layer_start[p];
                slot.y = y;
                if slot.is_dummy() {
                    slot.width = self.layer_size[p];
                }
                y += slot.height + SIBLING_GAP_ROWS;
            }
        }
    }

    fn paint(&self, chart: &Flowchart, charset: Charset) -> String {
        let mut canvas = Canvas::new(charset);
        for slot in &self.slots {
            if let SlotKind::Node(idx) = slot.kind {
                draw_node(&mut canvas, slot, &chart.nodes[idx], charset);
            }
        }
        for (idx, edge) in chart.edges.iter().enumerate() {
            if let Some(chain) = self.positional_chain(idx) {
                self.route(&mut canvas, edge, &chain, charset);
            }
        }
        canvas.render()
    }

    fn route(&self, canvas: &mut Canvas, edge: &Edge, chain: &[usize], charset: Charset) {
        let glyphs = EdgeGlyphs::for_charset(charset);
        let first = &self.slots[chain[0]];
        let last = &self.slots[chain[chain.len() - 1]];
        let head_at_end = last.kind == SlotKind::Node(edge.to);
        let horizontal = self.direction.is_horizontal();

        let mut points = Vec::with_capacity(chain.len() * 3 + 1);
        let mut last_jog = 0;
        if horizontal {
            points.push((first.right() + 1, first.middle_y()));
        } else {
            points.push((first.center_x(), first.bottom() + 1));
        }
        for pair in chain.windows(2) {
            let (prev, next) = (&self.slots[pair[0]], &self.slots[pair[1]]);
            if horizontal {
                let jog = self.layer_begin(next).saturating_sub(2);
                points.push((jog, prev.middle_y()));
                points.push((jog, next.middle_y()));
                if next.is_dummy() {
                    points.push((next.right(), next.middle_y()));
                } else {
                    points.push((next.x.saturating_sub(1), next.middle_y()));
                }
            } else {
                let jog = self.layer_end(prev) + 2;
                last_jog = jog;
                points.push((prev.center_x(), jog));
                points.push((next.center_x(), jog));
                if next.is_dummy() {
                    points.push((next.center_x(), next.bottom()));
                } else {
                    points.push((next.center_x(), next.y.saturating_sub(1)));
                }
            }
        }
        canvas.polyline(&points, edge.line);

        let start = points[0];
        let end = points[points.len() - 1];
        if horizontal {
            attach(canvas, (first.right(), first.middle_y()), glyphs.vertical, glyphs.tee_right);
        } else {
            attach(canvas, (first.center_x(), first.bottom()), glyphs.horizontal, glyphs.tee_down);
        }
        if edge.arrow && head_at_end {
            let arrow = if horizontal { glyphs.arrow_right } else { glyphs.arrow_down };
            canvas.put(end.0, end.1, arrow);
        } else {
            if horizontal {
                attach(canvas, (last.x, last.middle_y()), glyphs.vertical, glyphs.tee_left);
            } else {
                attach(canvas, (last.center_x(), last.y), glyphs.horizontal, glyphs.tee_up);
            }
            if edge.arrow {
                let arrow = if horizontal { glyphs.arrow_left } else { glyphs.arrow_up };
                canvas.put(start.0, start.1, arrow);
            }
        }

        if let Some(label) = &edge.label {
            if horizontal {
                canvas.text(first.right() + 2, first.middle_y(), label);
            } else {
                canvas.text(last.center_x() + 2, last_jog + 1, label);
            }
        }
    }
}

/// Replace a straight border glyph with a tee where an edge leaves a box.
fn attach(canvas: &mut Canvas, at: (usize, usize), border: char, tee: char) {
    if canvas.glyph_at(at.0, at.1) == Some(border) {
        canvas.put(at.0, at.1, tee);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Mark the edges that close a cycle during a depth-first walk.
fn back_edges(node_count: usize, edges: &[Edge]) -> Vec<bool> {
    let mut outgoing = vec![Vec::new(); node_count];
    for (idx, edge) in edges.iter().enumerate() {
        if edge.from != edge.to {
            outgoing[edge.from].push((idx, edge.to));
        }
    }

    let mut state = vec![Visit::New; node_count];
    let mut reversed = vec![false; edges.len()];
    for root in 0..node_count {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        let mut stack = vec![(root, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            if let Some(&(edge, to)) = outgoing[node].get(cursor) {
                frame.1 += 1;
                match state[to] {
                    Visit::New => {
                        state[to] = Visit::Active;
                        stack.push((to, 0));
                    }
                    Visit::Active => reversed[edge] = true,
                    Visit::Done => {}
                }
            } else {
                state[node] = Visit::Done;
                stack.pop();
            }
        }
    }
    reversed
}

/// Longest-path layering over an acyclic edge set.
fn longest_path_layers(node_count: usize, edges: &[Option<(usize, usize)>]) -> Vec<usize> {
    let mut indegree = vec![0usize; node_count];
    let mut successors = vec![Vec::new(); node_count];
    for &(from, to) in edges.iter().flatten() {
        successors[from].push(to);
        indegree[to] += 1;
    }

    let mut layers = vec![0usize; node_count];
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&n| indegree[n] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for &next in &successors[node] {
            layers[next] = layers[next].max(layers[node] + 1);
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    layers
}

fn node_size(node: &Node) -> (usize, usize) {
    let text_width = node
        .label
        .iter()
        .map(|line| line.width())
        .max()
        .unwrap_or(0);
    (text_width + 4, node.label.len().max(1) + 2)
}

fn draw_node(canvas: &mut Canvas, slot: &Slot, node: &Node, charset: Charset) {
    let glyphs = BoxGlyphs::new(node.shape, charset);
    let (x, y, w) = (slot.x, slot.y, slot.width);
    let right = slot.right();
    let bottom = slot.bottom();

    canvas.put(x, y, glyphs.top_left);
    canvas.put(right, y, glyphs.top_right);
    canvas.put(x, bottom, glyphs.bottom_left);
    canvas.put(right, bottom, glyphs.bottom_right);
    for col in x + 1..right {
        canvas.put(col, y, glyphs.horizontal);
        canvas.put(col, bottom, glyphs.horizontal);
    }
    for row in y + 1..bottom {
        canvas.put(x, row, glyphs.left);
        canvas.put(right, row, glyphs.right);
    }
    for (idx, line) in node.label.iter().enumerate() {
        let col = x + (w - line.width()) / 2;
        canvas.text(col, y + 1 + idx, line);
    }
}

#[derive(Debug, Clone, Copy)]
struct BoxGlyphs {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    left: char,
    right: char,
}

impl BoxGlyphs {
    const fn new(shape: NodeShape, charset: Charset) -> Self {
        let (corners, horizontal, sides) = match (charset, shape) {
            (Charset::Unicode, NodeShape::Rect) => (['┌', '┐', '└', '┘'], '─', ['│', '│']),
            (Charset::Unicode, NodeShape::Rounded) => (['╭', '╮', '╰', '╯'], '─', ['│', '│']),
            (Charset::Unicode, NodeShape::Circle) => (['╭', '╮', '╰', '╯'], '─', ['(', ')']),
            (Charset::Unicode, NodeShape::Decision) => (['╱', '╲', '╲', '╱'], '─', ['│', '│']),
            (Charset::Ascii, NodeShape::Rect) => (['+', '+', '+', '+'], '-', ['|', '|']),
            (Charset::Ascii, NodeShape::Rounded) => (['.', '.', '\'', '\''], '-', ['|', '|']),
            (Charset::Ascii, NodeShape::Circle) => (['.', '.', '\'', '\''], '-', ['(', ')']),
            (Charset::Ascii, NodeShape::Decision) => (['/', '\\', '\\', '/'], '-', ['|', '|']),
        };
        Self {
            top_left: corners[0],
            top_right: corners[1],
            bottom_left: corners[2],
            bottom_right: corners[3],
            horizontal,
            left: sides[0],
            right: sides[1],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EdgeGlyphs {
    horizontal: char,
    vertical: char,
    tee_down: char,
    tee_up: char,
    tee_right: char,
    tee_left: char,
    arrow_down: char,
    arrow_up: char,
    arrow_right: char,
    arrow_left: char,
}

impl EdgeGlyphs {
    const fn for_charset(charset: Charset) -> Self {
        match charset {
            Charset::Unicode => Self {
                horizontal: '─',
                vertical: '│',
                tee_down: '┬',
                tee_up: '┴',
                tee_right: '├',
                tee_left: '┤',
                arrow_down: '▼',
                arrow_up: '▲',
                arrow_right: '►',
                arrow_left: '◄',
            },
            Charset::Ascii => Self {
                horizontal: '-',
                vertical: '|',
                tee_down: '+',
                tee_up: '+',
                tee_right: '+',
                tee_left: '+',
                arrow_down: 'v',
                arrow_up: '^',
                arrow_right: '>',
                arrow_left: '<',
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::parse_flowchart;

    fn render(src: &str) -> String {
        draw(&parse_flowchart(src).unwrap(), Charset::Unicode)
    }

    #[test]
    fn test_top_down_pair() {
        let art = render("flowchart TD\nA --> B");
        let expected = [
            "┌───┐",
            "│ A │",
            "└─┬─┘",
            "  │",
            "  │",
            "  ▼",
            "┌───┐",
            "│ B │",
            "└───┘",
        ]
        .join("\n");
        assert_eq!(art, expected);
    }

    #[test]
    fn test_left_right_pair() {
        let art = render("flowchart LR\nA --> B");
        let expected = [
            "┌───┐    ┌───┐",
            "│ A ├───►│ B │",
            "└───┘    └───┘",
        ]
        .join("\n");
        assert_eq!(art, expected);
    }

    #[test]
    fn test_bottom_up_points_arrow_upwards() {
        let art = render("flowchart BT\nA --> B");
        let lines: Vec<&str> = art.lines().collect();
        assert!(lines[1].contains('B'), "target should be on top:\n{art}");
        assert!(art.contains('▲'));
        assert!(!art.contains('▼'));
    }

    #[test]
    fn test_right_left_points_arrow_left() {
        let art = render("flowchart RL\nA --> B");
        let row = art.lines().nth(1).unwrap();
        assert!(row.find('B').unwrap() < row.find('A').unwrap(), "{art}");
        assert!(art.contains('◄'));
    }

    #[test]
    fn test_open_link_has_no_arrow() {
        let art = render("flowchart TD\nA --- B");
        assert!(!art.contains('▼'));
        assert!(art.contains('┴'), "line should attach to target border:\n{art}");
    }

    #[test]
    fn test_fan_out_branches_from_one_stub() {
        let art = render("flowchart TD\nA --> B\nA --> C");
        assert!(art.contains('┴') || art.contains('┼') || art.contains('┘'));
        assert_eq!(art.matches('▼').count(), 2);
    }

    #[test]
    fn test_cycle_is_drawn_without_panic() {
        let art = render("flowchart TD\nA --> B\nB --> C\nC --> A");
        for label in ["A", "B", "C"] {
            assert!(art.contains(label));
        }
        assert!(art.contains('▲'), "back edge should point up:\n{art}");
    }

    #[test]
    fn test_long_edge_routes_around_middle_layer() {
        let art = render("flowchart TD\nA --> B --> C\nA --> C");
        assert!(art.lines().any(|l| l.contains("│ B │  │")), "{art}");
        assert_eq!(art.matches('▼').count(), 2, "both edges into C share one arrow");
    }

    #[test]
    fn test_edge_labels_are_printed() {
        let art = render("flowchart TD\nA -->|Yes| B");
        assert!(art.contains("Yes"));
        let art = render("flowchart LR\nA -->|No| B");
        assert!(art.contains("─No─"), "{art}");
    }

    #[test]
    fn test_self_loop_is_ignored() {
        let art = render("flowchart TD\nA --> A");
        assert_eq!(art, "┌───┐\n│ A │\n└───┘");
    }

    #[test]
    fn test_ascii_charset_avoids_box_drawing() {
        let chart = parse_flowchart("flowchart TD\nA[Start] --> B{Go?}").unwrap();
        let art = draw(&chart, Charset::Ascii);
        assert!(art.is_ascii(), "{art}");
        assert!(art.contains("Start"));
        assert!(art.contains('v'));
    }

    #[test]
    fn test_back_edges_marks_only_cycle_closer() {
        let chart = parse_flowchart("flowchart TD\nA --> B\nB --> C\nC --> A\nA --> C").unwrap();
        let reversed = back_edges(chart.nodes.len(), &chart.edges);
        assert_eq!(reversed, vec![false, false, true, false]);
    }

    #[test]
    fn test_longest_path_layers() {
        let layers = longest_path_layers(3, &[Some((0, 1)), Some((1, 2)), Some((0, 2))]);
        assert_eq!(layers, vec![0, 1, 2]);
    }
}
