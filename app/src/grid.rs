//! Grid rendering.
//!
//! Everything here is a pure function of the tile count and a fixed
//! [`GridConfig`]: the same inputs always produce the same tiles and layout.
//! Dimensions are in density-independent pixels (dp).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque RGB colour, written as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Colour from its channels
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Error parsing a `#RRGGBB` colour
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid colour {0:?}, expected #RRGGBB")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseColorError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Background/foreground pair for one tile parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStyle {
    /// Tile fill
    pub background: Color,
    /// Label colour
    pub foreground: Color,
}

/// Even/odd classification of a tile index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    /// Index divisible by two (labels 1, 3, 5, ...)
    Even,
    /// Index not divisible by two (labels 2, 4, 6, ...)
    Odd,
}

impl Parity {
    /// Parity of a 0-based tile index
    #[must_use]
    pub const fn of(index: u64) -> Self {
        if index % 2 == 0 { Self::Even } else { Self::Odd }
    }
}

/// Fixed rendering configuration
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Tiles per row
    pub columns: usize,
    /// Gap between tiles, both directions
    pub spacing: u32,
    /// Content padding on every edge
    pub padding: u32,
    /// Minimum bottom content padding
    pub bottom_padding: u32,
    /// Tile corner radius
    pub corner_radius: u32,
    /// Add button diameter
    pub fab_size: u32,
    /// Add button distance from the screen edge
    pub fab_margin: u32,
    /// Style of tiles with even index
    pub even: TileStyle,
    /// Style of tiles with odd index
    pub odd: TileStyle,
    /// Accessibility description format; `{}` is replaced by the tile label
    pub tile_description: String,
    /// Caption of the add button
    pub add_label: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            spacing: 8,
            padding: 16,
            bottom_padding: 16,
            corner_radius: 12,
            fab_size: 56,
            fab_margin: 16,
            even: TileStyle {
                background: Color::rgb(0xBB, 0xDE, 0xFB),
                foreground: Color::rgb(0x0D, 0x47, 0xA1),
            },
            odd: TileStyle {
                background: Color::rgb(0x0D, 0x47, 0xA1),
                foreground: Color::rgb(0xFF, 0xFF, 0xFF),
            },
            tile_description: "Item {}".to_string(),
            add_label: "+".to_string(),
        }
    }
}

impl GridConfig {
    /// Style for tiles of the given parity
    #[must_use]
    pub const fn style(&self, parity: Parity) -> TileStyle {
        match parity {
            Parity::Even => self.even,
            Parity::Odd => self.odd,
        }
    }

    /// Bottom content padding that keeps the add button clear of the last row
    #[must_use]
    pub const fn effective_bottom_padding(&self) -> u32 {
        effective_bottom_padding(self.bottom_padding, self.fab_size, self.fab_margin, self.padding)
    }
}

/// `max(base, fab_size + fab_margin + padding)`
#[must_use]
pub const fn effective_bottom_padding(base: u32, fab_size: u32, fab_margin: u32, padding: u32) -> u32 {
    let clearance = fab_size.saturating_add(fab_margin).saturating_add(padding);
    if clearance > base { clearance } else { base }
}

/// One rendered grid cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// 0-based position
    pub index: u64,
    /// Displayed number, `index + 1`
    pub label: u64,
    /// Even/odd classification of `index`
    pub parity: Parity,
    /// Colours selected by `parity`
    pub style: TileStyle,
    /// Accessibility text: the formatted label only, with no surrounding brackets
    pub content_description: String,
}

/// Substitute `label` for every `{}` in `format`
#[must_use]
pub fn describe(format: &str, label: u64) -> String {
    format.replace("{}", &label.to_string())
}

/// The tile at `index`
#[must_use]
pub fn tile(index: u64, config: &GridConfig) -> Tile {
    let parity = Parity::of(index);
    let label = index + 1;
    Tile {
        index,
        label,
        parity,
        style: config.style(parity),
        content_description: describe(&config.tile_description, label),
    }
}

/// Tiles `0..count`, lazily
pub fn tiles(count: u64, config: &GridConfig) -> impl Iterator<Item = Tile> + '_ {
    (0..count).map(move |index| tile(index, config))
}

/// Exactly `count` tiles, in index order
#[must_use]
pub fn render(count: u64, config: &GridConfig) -> Vec<Tile> {
    tiles(count, config).collect()
}

/// Content padding around the tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentPadding {
    /// Leading edge
    pub start: u32,
    /// Top edge
    pub top: u32,
    /// Trailing edge
    pub end: u32,
    /// Bottom edge, already cleared for the add button
    pub bottom: u32,
}

/// The floating add button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddButton {
    /// Caption
    pub label: String,
    /// Diameter
    pub size: u32,
    /// Distance from the bottom/end screen edges
    pub margin: u32,
}

/// A laid out screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    /// Tiles per full row
    pub columns: usize,
    /// Gap between tiles, both directions
    pub spacing: u32,
    /// Tile corner radius
    pub corner_radius: u32,
    /// Padding around the tiles
    pub padding: ContentPadding,
    /// Tiles grouped into rows; only the last row may be short
    pub rows: Vec<Vec<Tile>>,
    /// Add button overlaying the bottom end corner
    pub add_button: AddButton,
}

impl GridLayout {
    /// Total number of tiles across all rows
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Lay out `count` tiles
///
/// A `columns` of 0 is treated as 1.
#[must_use]
pub fn layout(count: u64, config: &GridConfig) -> GridLayout {
    let columns = config.columns.max(1);
    let mut rows: Vec<Vec<Tile>> = Vec::new();
    for tile in tiles(count, config) {
        match rows.last_mut() {
            Some(row) if row.len() < columns => row.push(tile),
            _ => {
                let mut row = Vec::with_capacity(columns);
                row.push(tile);
                rows.push(row);
            },
        }
    }

    GridLayout {
        columns,
        spacing: config.spacing,
        corner_radius: config.corner_radius,
        padding: ContentPadding {
            start: config.padding,
            top: config.padding,
            end: config.padding,
            bottom: config.effective_bottom_padding(),
        },
        rows,
        add_button: AddButton {
            label: config.add_label.clone(),
            size: config.fab_size,
            margin: config.fab_margin,
        },
    }
}
