//! Snap solver: pick the cell nearest the viewport centre after a
//! projected fling, and the exact offset that centres it.

use super::geom::Vec2;
use super::lattice::VirtualCell;
use super::layout::Layout;

pub const DEFAULT_VELOCITY_LOOKAHEAD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    /// Offset that puts `cell`'s centre exactly on the viewport centre.
    pub target: Vec2,
    pub cell: VirtualCell,
}

/// Offset at which `cell` is centred in a viewport of size `viewport`.
pub fn centering_offset(cell: VirtualCell, viewport: Vec2, layout: &Layout) -> Vec2 {
    viewport.half() - cell.center(layout)
}

/// Project `raw` forward by `velocity * lookahead`, round to the nearest
/// cell (half away from zero) and return the cell-aligned target.
pub fn resolve_snap(
    raw: Vec2,
    velocity: Vec2,
    viewport: Vec2,
    layout: &Layout,
    lookahead: f64,
) -> Snap {
    let projected = raw + velocity * lookahead;
    let center_in_lattice = viewport.half() - projected;
    let half_tile = layout.tile_size().half();

    let cell = VirtualCell::new(
        ((center_in_lattice.y - half_tile.y) / layout.cell_height()).round() as i64,
        ((center_in_lattice.x - half_tile.x) / layout.cell_width()).round() as i64,
    );

    Snap {
        target: centering_offset(cell, viewport, layout),
        cell,
    }
}
