//! Virtualization and wrap-index mapping.
//!
//! The lattice is unbounded; only the window of cells intersecting the
//! (buffered) viewport is ever enumerated.  Each virtual cell folds onto the
//! finite item list through [`resolve_index`], so the same item can appear
//! in several cells at once.  [`Tile::key`] keeps those duplicates apart.

use super::error::GridError;
use super::geom::Vec2;
use super::item::Item;
use super::layout::Layout;
use super::lens::{max_possible_distance, LensParams};

/// A coordinate in the infinite lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VirtualCell {
    pub row: i64,
    pub col: i64,
}

impl VirtualCell {
    pub const ORIGIN: VirtualCell = VirtualCell { row: 0, col: 0 };

    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Lattice-space position of the cell's top-left corner (offset not applied).
    pub fn origin(self, layout: &Layout) -> Vec2 {
        Vec2::new(
            self.col as f64 * layout.cell_width(),
            self.row as f64 * layout.cell_height(),
        )
    }

    /// Lattice-space position of the cell's centre.
    pub fn center(self, layout: &Layout) -> Vec2 {
        self.origin(layout) + layout.tile_size().half()
    }
}

/// Fold a virtual cell onto `[0, len)` along the raveled `row * columns + col`
/// sequence.  `None` only for an empty list.
pub fn resolve_index(cell: VirtualCell, columns: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let n = len as i64;
    let raveled = cell.row.wrapping_mul(columns).wrapping_add(cell.col);
    Some(raveled.rem_euclid(n) as usize)
}

/// Key that stays unique when one item occupies several visible cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub item_id: String,
    pub cell: VirtualCell,
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.item_id, self.cell.row, self.cell.col)
    }
}

/// Per-frame view model for one visible cell.
#[derive(Debug, Clone)]
pub struct Tile<'a> {
    pub item: &'a Item,
    pub item_index: usize,
    pub cell: VirtualCell,
    /// Screen-space top-left (offset applied).
    pub position: Vec2,
    pub size: Vec2,
    pub lens: LensParams,
    pub key: TileKey,
}

impl Tile<'_> {
    pub fn center(&self) -> Vec2 {
        self.position + self.size.half()
    }

    /// Hit test against the rectangle as drawn, scaled about its centre
    /// by the lens.
    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size.half() * self.lens.scale;
        let c = self.center();
        (point.x - c.x).abs() <= half.x && (point.y - c.y).abs() <= half.y
    }
}

/// One consistent view of everything enumeration depends on.  Taken by
/// value at the start of a pass so a concurrent resize cannot tear it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub layout: Layout,
    pub offset: Vec2,
    pub viewport: Vec2,
    pub lens_radius: f64,
}

/// Inclusive cell range intersecting the buffered viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min_row: i64,
    pub max_row: i64,
    pub min_col: i64,
    pub max_col: i64,
}

impl CellRange {
    pub fn len(&self) -> usize {
        let rows = (self.max_row - self.min_row + 1).max(0) as usize;
        let cols = (self.max_col - self.min_col + 1).max(0) as usize;
        rows * cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cells(self) -> impl Iterator<Item = VirtualCell> {
        (self.min_row..=self.max_row)
            .flat_map(move |row| (self.min_col..=self.max_col).map(move |col| VirtualCell::new(row, col)))
    }
}

impl FrameSnapshot {
    fn validate(&self) -> Result<(), GridError> {
        let Vec2 { x: w, y: h } = self.viewport;
        if !self.viewport.is_finite() || w <= 0.0 || h <= 0.0 || !self.offset.is_finite() {
            return Err(GridError::degenerate(w, h));
        }
        if self.layout.cell_width() <= 0.0 || self.layout.cell_height() <= 0.0 {
            return Err(GridError::degenerate(w, h));
        }
        Ok(())
    }

    /// Cells whose rectangles could intersect the buffered viewport.
    pub fn visible_range(&self) -> Result<CellRange, GridError> {
        self.validate()?;
        let buffer = self.layout.buffer();
        let (cell_w, cell_h) = (self.layout.cell_width(), self.layout.cell_height());
        let Vec2 { x: ox, y: oy } = self.offset;
        let Vec2 { x: vw, y: vh } = self.viewport;

        Ok(CellRange {
            min_col: ((-ox - buffer) / cell_w).floor() as i64,
            max_col: ((-ox + vw + buffer) / cell_w).ceil() as i64,
            min_row: ((-oy - buffer) / cell_h).floor() as i64,
            max_row: ((-oy + vh + buffer) / cell_h).ceil() as i64,
        })
    }

    /// Enumerate visible tiles in row-major order.
    pub fn try_enumerate<'a>(&self, items: &'a [Item]) -> Result<Vec<Tile<'a>>, GridError> {
        if items.is_empty() {
            return Err(GridError::EmptyItemList);
        }
        let range = self.visible_range()?;
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let viewport_center = self.viewport.half();
        let max_distance = max_possible_distance(self.viewport);
        let size = self.layout.tile_size();

        let mut tiles = Vec::with_capacity(range.len());
        for cell in range.cells() {
            let Some(index) = resolve_index(cell, self.layout.columns, items.len()) else {
                continue;
            };
            let item = &items[index];
            let position = cell.origin(&self.layout) + self.offset;
            let lens = LensParams::compute(
                position + size.half(),
                viewport_center,
                max_distance,
                self.lens_radius,
            );
            tiles.push(Tile {
                item,
                item_index: index,
                cell,
                position,
                size,
                lens,
                key: TileKey {
                    item_id: item.id.clone(),
                    cell,
                },
            });
        }
        Ok(tiles)
    }

    /// Like [`try_enumerate`](Self::try_enumerate), but absorbs errors into
    /// an empty frame.
    pub fn enumerate<'a>(&self, items: &'a [Item]) -> Vec<Tile<'a>> {
        match self.try_enumerate(items) {
            Ok(tiles) => {
                tracing::trace!("enumerated {} tiles", tiles.len());
                tiles
            }
            Err(err) => {
                tracing::debug!("no tiles: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::core::layout::compute_layout;
    use crate::core::lens::DEFAULT_LENS_RADIUS;

    fn items(n: usize) -> Vec<Item> {
        (0..n).map(|i| Item::new(format!("item-{i}"), format!("Item {i}"))).collect()
    }

    fn snapshot(viewport: Vec2, offset: Vec2) -> FrameSnapshot {
        FrameSnapshot {
            layout: compute_layout(viewport.x, viewport.y).unwrap(),
            offset,
            viewport,
            lens_radius: DEFAULT_LENS_RADIUS,
        }
    }

    #[test]
    fn resolve_index_is_total() {
        for n in 1..=9usize {
            for row in -20..=20 {
                for col in -20..=20 {
                    let idx = resolve_index(VirtualCell::new(row, col), 8, n).unwrap();
                    assert!(idx < n, "({row},{col}) n={n} gave {idx}");
                }
            }
        }
    }

    #[test]
    fn resolve_index_is_periodic_along_raveled_sequence() {
        let columns = 8;
        let n = 5usize;
        for row in -6..=6i64 {
            for col in -10..=10i64 {
                let a = resolve_index(VirtualCell::new(row, col), columns, n);
                // Shift the raveled value by a multiple of n through the column.
                let b = resolve_index(VirtualCell::new(row, col + 3 * n as i64), columns, n);
                // And through a row change compensated in the column.
                let c = resolve_index(VirtualCell::new(row + 1, col - columns + n as i64), columns, n);
                assert_eq!(a, b);
                assert_eq!(a, c);
            }
        }
    }

    #[test]
    fn resolve_index_handles_negative_cells() {
        assert_eq!(resolve_index(VirtualCell::new(0, -1), 8, 8), Some(7));
        assert_eq!(resolve_index(VirtualCell::new(-1, 0), 8, 8), Some(0));
        assert_eq!(resolve_index(VirtualCell::new(-1, 3), 8, 5), Some(0));
        assert_eq!(resolve_index(VirtualCell::ORIGIN, 8, 0), None);
    }

    #[test]
    fn single_item_fills_every_cell() {
        let list = items(1);
        let snap = snapshot(Vec2::new(1280.0, 800.0), Vec2::new(-333.0, 917.0));
        let tiles = snap.enumerate(&list);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.item_index == 0 && t.item.id == "item-0"));
    }

    #[test]
    fn keys_are_unique_even_for_duplicate_items() {
        let list = items(2);
        let snap = snapshot(Vec2::new(1280.0, 800.0), Vec2::ZERO);
        let tiles = snap.enumerate(&list);
        let keys: HashSet<String> = tiles.iter().map(|t| t.key.to_string()).collect();
        assert_eq!(keys.len(), tiles.len());
        assert!(tiles.len() > 2);
    }

    #[test]
    fn visible_tiles_cover_the_buffered_viewport() {
        let viewport = Vec2::new(1280.0, 800.0);
        let offset = Vec2::new(123.4, -56.7);
        let snap = snapshot(viewport, offset);
        let list = items(8);
        let tiles = snap.enumerate(&list);
        let buffer = snap.layout.buffer();

        let range = snap.visible_range().unwrap();
        assert_eq!(tiles.len(), range.len());

        // Every tile rectangle that touches the buffered viewport is present.
        let cell_w = snap.layout.cell_width();
        let cell_h = snap.layout.cell_height();
        for row in -10..10i64 {
            for col in -10..10i64 {
                let x = col as f64 * cell_w + offset.x;
                let y = row as f64 * cell_h + offset.y;
                let intersects = x + snap.layout.tile_width > -buffer
                    && x < viewport.x + buffer
                    && y + snap.layout.tile_height > -buffer
                    && y < viewport.y + buffer;
                if intersects {
                    assert!(tiles.iter().any(|t| t.cell == VirtualCell::new(row, col)));
                }
            }
        }
    }

    #[test]
    fn tile_positions_follow_offset() {
        let snap = snapshot(Vec2::new(1280.0, 800.0), Vec2::new(10.0, 20.0));
        let list = items(8);
        let tiles = snap.enumerate(&list);
        let t = tiles.iter().find(|t| t.cell == VirtualCell::new(1, 2)).unwrap();
        assert_eq!(t.position.x, 2.0 * snap.layout.cell_width() + 10.0);
        assert_eq!(t.position.y, 1.0 * snap.layout.cell_height() + 20.0);
        assert_eq!(t.item_index, 10 % 8);
    }

    #[test]
    fn empty_list_yields_no_tiles() {
        let snap = snapshot(Vec2::new(1280.0, 800.0), Vec2::ZERO);
        assert!(snap.enumerate(&[]).is_empty());
        assert_eq!(snap.try_enumerate(&[]).unwrap_err(), GridError::EmptyItemList);
    }

    #[test]
    fn degenerate_viewport_yields_no_tiles() {
        let mut snap = snapshot(Vec2::new(1280.0, 800.0), Vec2::ZERO);
        snap.viewport = Vec2::new(0.0, 800.0);
        assert!(snap.enumerate(&items(3)).is_empty());
        snap.viewport = Vec2::new(1280.0, 800.0);
        snap.offset = Vec2::new(f64::INFINITY, 0.0);
        assert!(snap.enumerate(&items(3)).is_empty());
    }
}
