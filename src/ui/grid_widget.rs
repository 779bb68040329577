//! Grid widget: draws one frame of visible tiles into the terminal buffer.
//!
//! ## Pipeline
//!
//! 1. Ask the engine for this frame's tiles (already lens-annotated).
//! 2. Fold in each tile's entrance stagger, timed from when it appeared.
//! 3. Sort far-to-near by z-index so the lens centre ends up on top.
//! 4. For each tile: project the scaled pixel rectangle onto cells, fill it,
//!    draw the thumbnail with `▀` half-blocks, then the label.
//!
//! Opacity fades colours toward the background.  Blur has no terminal
//! equivalent, so it coarsens the thumbnail instead (blocky sampling).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style},
    widgets::{Block, BorderType, Borders, Widget},
};

use crate::core::geom::Vec2;
use crate::core::grid::GridEngine;
use crate::core::lattice::Tile;
use crate::core::lens::Entrance;
use crate::ui::layout::{px_to_col, px_to_row};
use crate::ui::theme::{fade, Theme};

/// Below this opacity a tile is not worth drawing.
const MIN_VISIBLE_OPACITY: f64 = 0.02;

pub struct GridWidget<'a> {
    pub engine: &'a GridEngine,
    pub image_cache: &'a HashMap<PathBuf, Arc<image::RgbaImage>>,
    /// Highlight the focused tile (only once the grid has settled).
    pub highlight_focus: bool,
}

/// Per-tile values after folding in the entrance animation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Look {
    scale: f64,
    opacity: f64,
    blur: f64,
}

fn look(tile: &Tile<'_>, entrance: Entrance) -> Look {
    Look {
        scale: tile.lens.scale * entrance.scale,
        opacity: tile.lens.opacity * entrance.opacity,
        blur: tile.lens.blur,
    }
}

/// Cell rectangle covered by a tile of pixel `size` scaled about `center`,
/// clipped to `area`.  `None` when nothing is left.
pub fn tile_cell_rect(area: Rect, center: Vec2, size: Vec2, scale: f64) -> Option<Rect> {
    let half = size.half() * scale;
    let x0 = px_to_col(area, center.x - half.x);
    let x1 = px_to_col(area, center.x + half.x);
    let y0 = px_to_row(area, center.y - half.y);
    let y1 = px_to_row(area, center.y + half.y);

    let left = x0.max(area.x as i32);
    let right = x1.min(area.x as i32 + area.width as i32);
    let top = y0.max(area.y as i32);
    let bottom = y1.min(area.y as i32 + area.height as i32);
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

impl Widget for GridWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(Theme::background()));
        if area.width == 0 || area.height == 0 {
            return;
        }

        let mut tiles = self.engine.tiles();
        tiles.sort_by_key(|t| t.lens.z_index);
        let focused = self.engine.focused_cell();

        for tile in &tiles {
            let look = look(tile, self.engine.entrance(tile));
            if look.opacity < MIN_VISIBLE_OPACITY {
                continue;
            }
            let Some(rect) = tile_cell_rect(area, tile.center(), tile.size, look.scale) else {
                continue;
            };
            let is_focused = self.highlight_focus && focused == Some(tile.cell);
            render_tile(tile, rect, look, is_focused, self.image_cache, buf);
        }
    }
}

fn render_tile(
    tile: &Tile<'_>,
    rect: Rect,
    look: Look,
    focused: bool,
    image_cache: &HashMap<PathBuf, Arc<image::RgbaImage>>,
    buf: &mut Buffer,
) {
    let fill = fade(Theme::tile_fill(), look.opacity);
    buf.set_style(rect, Style::default().bg(fill));

    let inner = if focused && rect.width > 2 && rect.height > 2 {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::focused_border_style().bg(fill));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    } else {
        rect
    };

    let label_rows = if inner.height >= 4 { 2 } else { 0 };
    let image_area = Rect {
        height: inner.height.saturating_sub(label_rows),
        ..inner
    };

    if let Some(thumb) = tile.item.image.as_ref().and_then(|p| image_cache.get(p)) {
        render_image_halfblocks(thumb, image_area, look.opacity, look.blur, buf);
    } else {
        render_placeholder(tile, image_area, look.opacity, buf);
    }

    if label_rows > 0 {
        let y = inner.y + inner.height - label_rows;
        let name_style = Style::default().fg(fade(Theme::label_fg(), look.opacity)).bg(fill);
        buf.set_stringn(inner.x, y, &tile.item.name, inner.width as usize, name_style);
        if let Some(price) = &tile.item.price {
            let price_style = Style::default().fg(fade(Theme::price_fg(), look.opacity)).bg(fill);
            buf.set_stringn(inner.x, y + 1, price, inner.width as usize, price_style);
        }
    }
}

/// Initial letter centred on a tinted fill for items without a thumbnail.
fn render_placeholder(tile: &Tile<'_>, area: Rect, opacity: f64, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let tint = fade(placeholder_tint(tile.item_index), opacity);
    buf.set_style(area, Style::default().bg(tint));
    let initial: String = tile.item.name.chars().take(1).collect();
    let x = area.x + area.width / 2;
    let y = area.y + area.height / 2;
    buf.set_stringn(
        x,
        y,
        initial,
        1,
        Style::default().fg(fade(Theme::label_fg(), opacity)).bg(tint),
    );
}

fn placeholder_tint(index: usize) -> Color {
    const TINTS: [(u8, u8, u8); 6] = [
        (92, 64, 51),
        (60, 80, 110),
        (70, 100, 72),
        (110, 70, 96),
        (104, 92, 52),
        (58, 96, 104),
    ];
    let (r, g, b) = TINTS[index % TINTS.len()];
    Color::Rgb(r, g, b)
}

// ─── image (halfblock renderer) ─────────────────────────────────

/// Render a thumbnail using Unicode `▀` half-blocks (2 pixels per cell),
/// fitted and centred in `area`.  `blur` coarsens the sampling grid.
fn render_image_halfblocks(
    thumb: &image::RgbaImage,
    area: Rect,
    opacity: f64,
    blur: f64,
    buf: &mut Buffer,
) {
    use image::imageops::FilterType;

    if area.width == 0 || area.height == 0 || thumb.width() == 0 || thumb.height() == 0 {
        return;
    }

    let max_px_w = area.width as f64;
    let max_px_h = area.height as f64 * 2.0;
    let (src_w, src_h) = (thumb.width() as f64, thumb.height() as f64);
    let scale = (max_px_w / src_w).min(max_px_h / src_h);
    let fit_w = (src_w * scale).round().max(1.0) as u32;
    let fit_h = (src_h * scale).round().max(1.0) as u32;

    // Blur: shrink further, then sample back up blockily.
    let block = 1.0 + blur.max(0.0);
    let small_w = ((fit_w as f64 / block).round() as u32).max(1);
    let small_h = ((fit_h as f64 / block).round() as u32).max(1);
    let rgba = image::imageops::resize(thumb, small_w, small_h, FilterType::Triangle);

    let col_offset = area.width.saturating_sub(fit_w as u16) / 2;
    let row_offset = (area.height as u32).saturating_sub(fit_h.div_ceil(2)) / 2;

    let sample = |x: u32, y: u32| {
        let sx = (x * small_w / fit_w).min(small_w - 1);
        let sy = (y * small_h / fit_h).min(small_h - 1);
        let p = rgba.get_pixel(sx, sy);
        fade(Color::Rgb(p[0], p[1], p[2]), opacity * p[3] as f64 / 255.0)
    };

    for row in 0..fit_h.div_ceil(2) {
        let yt = row * 2;
        let yb = yt + 1;
        let y = area.y as u32 + row_offset + row;
        if y >= (area.y + area.height) as u32 {
            break;
        }
        for col in 0..fit_w.min(area.width as u32) {
            let fg = sample(col, yt);
            let x = area.x + col_offset + col as u16;
            let Some(cell) = buf.cell_mut(Position::new(x, y as u16)) else {
                continue;
            };
            cell.set_char('▀').set_fg(fg);
            if yb < fit_h {
                cell.set_bg(sample(col, yb));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridTuning;
    use crate::core::item::Catalog;
    use crate::core::lattice::VirtualCell;
    use crate::core::lens::ENTRANCE_WINDOW;
    use crate::ui::layout::{cell_to_px, viewport_px};

    fn ready_engine(area: Rect) -> GridEngine {
        let mut engine = GridEngine::new(Catalog::demo().items().to_vec(), GridTuning::default());
        let vp = viewport_px(area);
        engine.resize(vp.x, vp.y);
        engine.advance(ENTRANCE_WINDOW);
        engine
    }

    #[test]
    fn tile_rect_scales_about_centre_and_clips() {
        let area = Rect::new(0, 0, 100, 40);
        let r = tile_cell_rect(area, Vec2::new(400.0, 320.0), Vec2::new(160.0, 160.0), 1.0).unwrap();
        assert_eq!(r, Rect::new(40, 15, 20, 10));

        let big = tile_cell_rect(area, Vec2::new(400.0, 320.0), Vec2::new(160.0, 160.0), 1.5).unwrap();
        assert!(big.width > r.width && big.height > r.height);

        let clipped = tile_cell_rect(area, Vec2::new(0.0, 0.0), Vec2::new(160.0, 160.0), 1.0).unwrap();
        assert_eq!(clipped, Rect::new(0, 0, 10, 5));

        assert!(tile_cell_rect(area, Vec2::new(-500.0, 0.0), Vec2::new(160.0, 160.0), 1.0).is_none());
    }

    #[test]
    fn entrance_hides_far_tiles_first() {
        let area = Rect::new(0, 0, 200, 60);
        let mut engine = GridEngine::new(Catalog::demo().items().to_vec(), GridTuning::default());
        let vp = viewport_px(area);
        engine.resize(vp.x, vp.y);
        engine.advance(std::time::Duration::from_millis(300));
        let tiles = engine.tiles();
        let near = tiles
            .iter()
            .min_by(|a, b| a.lens.delay_factor.total_cmp(&b.lens.delay_factor))
            .unwrap();
        let far = tiles
            .iter()
            .max_by(|a, b| a.lens.delay_factor.total_cmp(&b.lens.delay_factor))
            .unwrap();
        let near_look = look(near, engine.entrance(near));
        let far_look = look(far, engine.entrance(far));
        assert!(near_look.opacity > far_look.opacity);
        assert_eq!(look(far, Entrance::DONE).opacity, far.lens.opacity);
    }

    #[test]
    fn renders_focused_tile_with_border_and_label() {
        let area = Rect::new(0, 0, 200, 60);
        let engine = ready_engine(area);
        let cache = HashMap::new();
        let mut buf = Buffer::empty(area);
        GridWidget {
            engine: &engine,
            image_cache: &cache,
            highlight_focus: true,
        }
        .render(area, &mut buf);

        let text: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        let demo = Catalog::demo();
        assert!(text.contains('╭'));
        assert!(text.contains(demo.items()[0].name.as_str()));
    }

    #[test]
    fn halfblocks_fill_image_area() {
        let thumb = image::RgbaImage::from_pixel(40, 40, image::Rgba([200, 10, 10, 255]));
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        render_image_halfblocks(&thumb, area, 1.0, 0.0, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "▀");
        assert_eq!(buf[(9, 4)].symbol(), "▀");
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(200, 10, 10));
    }

    #[test]
    fn centre_click_hits_focused_cell() {
        let area = Rect::new(0, 0, 200, 60);
        let engine = ready_engine(area);
        let p = cell_to_px(area, 100, 30);
        assert_eq!(engine.tile_at(p).map(|t| t.cell), Some(VirtualCell::ORIGIN));
    }
}
