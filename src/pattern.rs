//! Sparse weighted grids for ship footprints and targeting masks.
//!
//! A pattern is authored as a dense rectangle of integer weights plus a
//! center cell, but stored sparsely: only non-zero weights are kept, keyed
//! by their offset from the center. Queries outside the stored cells return
//! zero, so patterns compose cheaply with boards of any size.

use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::error::ParseResult;
use crate::rules::ParseContext;
use crate::schema;

/// A quarter-turn rotation, clockwise in board coordinates (y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Rotate 90 degrees.
    R90,
    /// Rotate 180 degrees.
    R180,
    /// Rotate 270 degrees.
    R270,
}

impl Rotation {
    const fn turns(self) -> u8 {
        match self {
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }
}

/// An immutable sparse grid of signed weights around a center cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Non-zero weights keyed by `(dx, dy)` offset from the center.
    cells: BTreeMap<(i32, i32), i64>,
}

impl Pattern {
    /// Create a pattern from a dense row grid and a center cell.
    ///
    /// `center` is `(x, y)` into the grid. Returns `None` if the grid is
    /// empty, ragged, or the center lies outside it.
    #[must_use]
    pub fn from_rows(center: (usize, usize), rows: &[Vec<i64>]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        let (cx, cy) = center;
        if cx >= width || cy >= height {
            return None;
        }

        let mut cells = BTreeMap::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, &weight) in row.iter().enumerate() {
                if weight == 0 {
                    continue;
                }
                let dx = i32::try_from(x).ok()?.checked_sub(i32::try_from(cx).ok()?)?;
                let dy = i32::try_from(y).ok()?.checked_sub(i32::try_from(cy).ok()?)?;
                cells.insert((dx, dy), weight);
            }
        }
        Some(Self { cells })
    }

    /// Build a pattern from its JSON form: `{"center": [x, y], "rows": [[..]]}`.
    pub(crate) fn build(cx: &ParseContext<'_>, json: &Json) -> ParseResult<Self> {
        let obj = schema::object(cx, json)?;
        schema::forbid_unknown(cx, obj, &["center", "rows"])?;

        let center_cx = cx.field("center");
        let center = schema::array(&center_cx, schema::required(cx, obj, "center")?)?;
        let (center_x, center_y) = match center {
            [x, y] => (
                schema::index(&center_cx.index(0), x)?,
                schema::index(&center_cx.index(1), y)?,
            ),
            _ => return Err(center_cx.invalid("center must be a [x, y] pair")),
        };

        let rows_cx = cx.field("rows");
        let rows_json = schema::array(&rows_cx, schema::required(cx, obj, "rows")?)?;
        let mut rows = Vec::with_capacity(rows_json.len());
        for (y, row) in rows_json.iter().enumerate() {
            let row_cx = rows_cx.index(y);
            let weights = schema::array(&row_cx, row)?;
            let mut parsed = Vec::with_capacity(weights.len());
            for (x, weight) in weights.iter().enumerate() {
                parsed.push(schema::integer(&row_cx.index(x), weight)?);
            }
            rows.push(parsed);
        }

        Self::from_rows((center_x, center_y), &rows).ok_or_else(|| {
            cx.invalid("pattern rows must form a non-empty rectangle containing the center")
        })
    }

    /// The weight at the given offset from the center; zero if unset.
    #[must_use]
    pub fn weight(&self, dx: i32, dy: i32) -> i64 {
        self.cells.get(&(dx, dy)).copied().unwrap_or(0)
    }

    /// Number of non-zero cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the pattern has no non-zero cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over `((dx, dy), weight)` for every non-zero cell.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), i64)> + '_ {
        self.cells.iter().map(|(&offset, &weight)| (offset, weight))
    }

    /// A copy rotated by the given quarter turns about the center.
    #[must_use]
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let cells = self
            .cells
            .iter()
            .map(|(&(dx, dy), &weight)| {
                let mut offset = (dx, dy);
                for _ in 0..rotation.turns() {
                    offset = (-offset.1, offset.0);
                }
                (offset, weight)
            })
            .collect();
        Self { cells }
    }
}
