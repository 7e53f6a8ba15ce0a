//! Text rendering of a [`GridLayout`] for terminals.
//!
//! Dimensions are converted from dp to character cells: 8dp per column and
//! 16dp per line, rounding up. Tiles are boxed and, when colour is enabled,
//! painted with their style using 24-bit ANSI escapes.

use crate::grid::{Color, GridLayout, Tile, TileStyle};

const DP_PER_COLUMN: u32 = 8;
const DP_PER_LINE: u32 = 16;
const RESET: &str = "\x1b[0m";

fn columns_for(dp: u32) -> usize {
    dp.div_ceil(DP_PER_COLUMN) as usize
}

fn lines_for(dp: u32) -> usize {
    dp.div_ceil(DP_PER_LINE) as usize
}

/// Box-drawing corners `(top-left, top-right, bottom-left, bottom-right)`
const fn corners(corner_radius: u32) -> (char, char, char, char) {
    if corner_radius > 0 {
        ('╭', '╮', '╰', '╯')
    } else {
        ('┌', '┐', '└', '┘')
    }
}

/// Draws grid layouts as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRenderer {
    color: bool,
}

impl TextRenderer {
    /// Create a renderer; `color` enables ANSI colour output
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// Render `layout` as newline-terminated lines
    #[must_use]
    pub fn render(&self, layout: &GridLayout) -> String {
        let label_width = layout
            .rows
            .iter()
            .flatten()
            .map(|tile| tile.label.to_string().len())
            .max()
            .unwrap_or(1);
        let inner = label_width + 2;
        let cell = inner + 2;
        let gap = columns_for(layout.spacing);
        let start = columns_for(layout.padding.start);
        let end = columns_for(layout.padding.end);
        let width = start + layout.columns * cell + layout.columns.saturating_sub(1) * gap + end;

        let (tl, tr, bl, br) = corners(layout.corner_radius);
        let border = "─".repeat(inner);

        let mut lines: Vec<String> = Vec::new();
        lines.extend((0..lines_for(layout.padding.top)).map(|_| String::new()));

        for (row_index, row) in layout.rows.iter().enumerate() {
            if row_index > 0 {
                lines.extend((0..lines_for(layout.spacing)).map(|_| String::new()));
            }

            let top = self.row_line(row, start, gap, |_| format!("{tl}{border}{tr}"));
            let middle = self.row_line(row, start, gap, |tile| {
                format!("│{}│", center(&tile.label.to_string(), inner))
            });
            let bottom = self.row_line(row, start, gap, |_| format!("{bl}{border}{br}"));
            lines.extend([top, middle, bottom]);
        }

        let bottom_lines = lines_for(layout.padding.bottom).max(1);
        let mut footer = vec![String::new(); bottom_lines];
        let button = format!("( {} )", layout.add_button.label);
        let margin_lines = lines_for(layout.add_button.margin);
        let button_line = bottom_lines.saturating_sub(1 + margin_lines);
        let indent =
            width.saturating_sub(columns_for(layout.add_button.margin) + button.chars().count());
        footer[button_line] = format!("{}{button}", " ".repeat(indent));
        lines.extend(footer);

        let mut out = String::new();
        for line in lines {
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    /// One text line across a row of tiles
    fn row_line<F>(&self, row: &[Tile], start: usize, gap: usize, segment: F) -> String
    where
        F: Fn(&Tile) -> String,
    {
        let mut line = " ".repeat(start);
        for (i, tile) in row.iter().enumerate() {
            if i > 0 {
                line.push_str(&" ".repeat(gap));
            }
            let text = segment(tile);
            if self.color {
                line.push_str(&paint(&text, tile.style));
            } else {
                line.push_str(&text);
            }
        }
        line
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let left = width.saturating_sub(len) / 2;
    let right = width.saturating_sub(len + left);
    format!("{}{text}{}", " ".repeat(left), " ".repeat(right))
}

fn paint(text: &str, style: TileStyle) -> String {
    let Color { r: fr, g: fg, b: fb } = style.foreground;
    let Color { r: br, g: bg, b: bb } = style.background;
    format!("\x1b[38;2;{fr};{fg};{fb}m\x1b[48;2;{br};{bg};{bb}m{text}{RESET}")
}
