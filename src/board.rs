//! Board geometry and tile state.
//!
//! The board is a rectangular grid of tile types. Tile types are not fixed
//! by the engine: each scenario declares its own palette in `board.json`,
//! mapping single-character symbols to named types, and the grid is written
//! as one string per row. Rule actions mutate tiles by palette name.

use std::fmt;

use serde_json::Value as Json;

use crate::error::{ParseErrorKind, ParseResult};
use crate::rules::ParseContext;
use crate::schema;

/// A coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A handle to one tile type in the board's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(usize);

impl TileId {
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index of this tile type within the palette.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The scenario board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Width of the board in tiles.
    width: u16,
    /// Height of the board in tiles.
    height: u16,
    /// Palette symbols, indexed by `TileId`.
    symbols: Vec<char>,
    /// Palette type names, indexed by `TileId`.
    names: Vec<String>,
    /// Tiles stored in row-major order.
    tiles: Vec<TileId>,
}

impl Board {
    /// Create a board from already-validated parts.
    ///
    /// Returns `None` if a dimension is zero, the palette vectors disagree,
    /// or the tile count does not match the dimensions.
    #[must_use]
    pub(crate) fn new(
        width: u16,
        height: u16,
        symbols: Vec<char>,
        names: Vec<String>,
        tiles: Vec<TileId>,
    ) -> Option<Self> {
        if width == 0 || height == 0 || symbols.len() != names.len() {
            return None;
        }
        if tiles.len() != usize::from(width) * usize::from(height) {
            return None;
        }
        if tiles.iter().any(|t| t.0 >= names.len()) {
            return None;
        }

        Some(Self {
            width,
            height,
            symbols,
            names,
            tiles,
        })
    }

    /// Build a board from the `board.json` document.
    pub(crate) fn build(cx: &ParseContext<'_>, json: &Json) -> ParseResult<Self> {
        let obj = schema::object(cx, json)?;
        schema::forbid_unknown(cx, obj, &["width", "height", "palette", "rows"])?;

        let width = schema::dimension(&cx.field("width"), schema::required(cx, obj, "width")?)?;
        let height = schema::dimension(&cx.field("height"), schema::required(cx, obj, "height")?)?;

        let palette_cx = cx.field("palette");
        let palette = schema::object(&palette_cx, schema::required(cx, obj, "palette")?)?;
        let mut symbols = Vec::new();
        let mut names = Vec::new();
        // Map iteration order depends on serde_json feature flags; sort the
        // symbols so tile ids do not depend on how the author ordered keys.
        let mut entries: Vec<(&String, &Json)> = palette.iter().collect();
        entries.sort_by_key(|(key, _)| *key);
        for (key, value) in entries {
            let entry_cx = palette_cx.field(key);
            let mut chars = key.chars();
            let symbol = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(entry_cx
                        .invalid(format!("palette key '{key}' must be a single character")));
                }
            };
            let name = schema::string(&entry_cx, value)?;
            if names.iter().any(|n| n == name) {
                return Err(entry_cx.invalid(format!("duplicate tile type name '{name}'")));
            }
            symbols.push(symbol);
            names.push(name.to_owned());
        }
        if symbols.is_empty() {
            return Err(palette_cx.invalid("the palette must define at least one tile type"));
        }

        let rows_cx = cx.field("rows");
        let rows = schema::array(&rows_cx, schema::required(cx, obj, "rows")?)?;
        if rows.len() != usize::from(height) {
            return Err(rows_cx.invalid(format!(
                "expected {height} rows, found {}",
                rows.len()
            )));
        }
        let mut tiles = Vec::with_capacity(usize::from(width) * usize::from(height));
        for (y, row) in rows.iter().enumerate() {
            let row_cx = rows_cx.index(y);
            let text = schema::string(&row_cx, row)?;
            let mut count = 0usize;
            for symbol in text.chars() {
                let Some(id) = symbols.iter().position(|s| *s == symbol) else {
                    return Err(row_cx.invalid(format!(
                        "symbol '{symbol}' is not in the palette"
                    )));
                };
                tiles.push(TileId(id));
                count += 1;
            }
            if count != usize::from(width) {
                return Err(row_cx.invalid(format!(
                    "expected {width} tiles in this row, found {count}"
                )));
            }
        }

        Self::new(width, height, symbols, names, tiles)
            .ok_or_else(|| cx.error(ParseErrorKind::Invalid {
                message: "board dimensions and rows disagree".to_owned(),
            }))
    }

    /// Get the width of the board.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the height of the board.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Check if a coordinate is within the board bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Convert a coordinate to an index into the tiles array.
    fn coord_to_index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x))
        } else {
            None
        }
    }

    /// Get the tile at the given coordinate.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<TileId> {
        self.coord_to_index(coord).map(|idx| self.tiles[idx])
    }

    /// The number of tile types in the palette.
    #[must_use]
    pub fn palette_len(&self) -> usize {
        self.names.len()
    }

    /// The type name for a tile id.
    #[must_use]
    pub fn tile_name(&self, id: TileId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Look up a tile id by its type name.
    #[must_use]
    pub fn tile_id(&self, name: &str) -> Option<TileId> {
        self.names.iter().position(|n| n == name).map(TileId)
    }

    /// Iterate over all coordinates and tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, TileId)> + '_ {
        let width = self.width;
        (0..self.height)
            .flat_map(move |y| (0..width).map(move |x| Coord::new(x, y)))
            .zip(self.tiles.iter().copied())
    }

    /// Render the grid back to one palette-symbol string per row.
    #[must_use]
    pub fn render_rows(&self) -> Vec<String> {
        let width = usize::from(self.width);
        self.tiles
            .chunks(width)
            .map(|row| row.iter().map(|t| self.symbols[t.0]).collect())
            .collect()
    }

    /// Set every listed coordinate to the given tile type.
    ///
    /// Coordinates outside the board are ignored; triggers validate bounds
    /// before any action runs.
    pub(crate) fn set_all(&mut self, coords: &[Coord], tile: TileId) {
        for coord in coords {
            if let Some(idx) = self.coord_to_index(*coord) {
                self.tiles[idx] = tile;
            }
        }
    }

    /// Overwrite the listed coordinates with the tile list applied
    /// cyclically, in coordinate order.
    pub(crate) fn fill_cycle(&mut self, coords: &[Coord], tiles: &[TileId]) {
        if tiles.is_empty() {
            return;
        }
        for (i, coord) in coords.iter().enumerate() {
            if let Some(idx) = self.coord_to_index(*coord) {
                self.tiles[idx] = tiles[i % tiles.len()];
            }
        }
    }
}
