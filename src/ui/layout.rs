//! Layout helpers: split the terminal area into regions and map terminal
//! cells to the grid engine's virtual pixels.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::core::geom::Vec2;

/// Virtual pixels per terminal cell.  Cells are roughly twice as tall as
/// wide, which keeps tiles at their 3:4 aspect on screen.
pub const CELL_PX_W: f64 = 8.0;
pub const CELL_PX_H: f64 = 16.0;

/// Primary screen layout: grid pane and a bottom status bar.
pub struct AppLayout {
    pub grid_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // grid (takes all remaining space)
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            grid_area: chunks[0],
            status_area: chunks[1],
        }
    }
}

/// Engine viewport size for a terminal area.
pub fn viewport_px(area: Rect) -> Vec2 {
    Vec2::new(area.width as f64 * CELL_PX_W, area.height as f64 * CELL_PX_H)
}

/// Centre of terminal cell (`column`, `row`) in the engine's pixel space,
/// relative to `area`.  Cells left of / above the area map to negative
/// coordinates so drags that leave the pane keep tracking.
pub fn cell_to_px(area: Rect, column: u16, row: u16) -> Vec2 {
    Vec2::new(
        (column as f64 - area.x as f64 + 0.5) * CELL_PX_W,
        (row as f64 - area.y as f64 + 0.5) * CELL_PX_H,
    )
}

/// Inverse of [`cell_to_px`] for a pixel x coordinate (may be negative).
pub fn px_to_col(area: Rect, x: f64) -> i32 {
    area.x as i32 + (x / CELL_PX_W).floor() as i32
}

pub fn px_to_row(area: Rect, y: f64) -> i32 {
    area.y as i32 + (y / CELL_PX_H).floor() as i32
}

pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bar_takes_the_last_row() {
        let layout = AppLayout::from_area(Rect::new(0, 0, 100, 40));
        assert_eq!(layout.grid_area, Rect::new(0, 0, 100, 39));
        assert_eq!(layout.status_area, Rect::new(0, 39, 100, 1));
    }

    #[test]
    fn cell_pixel_mapping_round_trips() {
        let area = Rect::new(2, 1, 80, 30);
        assert_eq!(viewport_px(area), Vec2::new(640.0, 480.0));
        let p = cell_to_px(area, 12, 6);
        assert_eq!(p, Vec2::new(84.0, 88.0));
        assert_eq!(px_to_col(area, p.x), 12);
        assert_eq!(px_to_row(area, p.y), 6);
        assert!(cell_to_px(area, 0, 0).x < 0.0);
        assert!(contains(area, 2, 1) && !contains(area, 82, 1));
    }
}
