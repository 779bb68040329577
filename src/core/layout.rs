//! Layout engine: tile size, lattice period and gap from the viewport size.

use super::error::GridError;
use super::geom::Vec2;

/// Viewports narrower than this use the compact ("mobile") layout.
pub const MOBILE_BREAKPOINT: f64 = 768.0;
/// Width / height of every tile.
pub const TILE_ASPECT: f64 = 3.0 / 4.0;

const GAP_DESKTOP: f64 = 60.0;
const GAP_MOBILE: f64 = 24.0;
const MAX_TILE_WIDTH_DESKTOP: f64 = 260.0;
const PREFETCH_DESKTOP: f64 = 250.0;
const PREFETCH_MOBILE: f64 = 100.0;

/// Lattice metrics handed to the mapper, the snap solver and the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub tile_width: f64,
    pub tile_height: f64,
    /// Column period used by the wrap-index formula.
    pub columns: i64,
    pub rows: i64,
    pub gap: f64,
    pub compact: bool,
}

impl Layout {
    /// Horizontal distance between neighbouring tile origins.
    pub fn cell_width(&self) -> f64 {
        self.tile_width + self.gap
    }

    pub fn cell_height(&self) -> f64 {
        self.tile_height + self.gap
    }

    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    /// Prefetch margin around the viewport for enumeration.
    pub fn buffer(&self) -> f64 {
        if self.compact {
            PREFETCH_MOBILE
        } else {
            PREFETCH_DESKTOP
        }
    }
}

/// Derive the layout for a viewport.  Pure and idempotent.
pub fn compute_layout(width: f64, height: f64) -> Result<Layout, GridError> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(GridError::degenerate(width, height));
    }

    let compact = width < MOBILE_BREAKPOINT;
    let tile_width = if compact {
        width * 0.36
    } else {
        (width * 0.18).min(MAX_TILE_WIDTH_DESKTOP)
    };

    Ok(Layout {
        tile_width,
        tile_height: tile_width / TILE_ASPECT,
        columns: if compact { 4 } else { 8 },
        rows: if compact { 4 } else { 6 },
        gap: if compact { GAP_MOBILE } else { GAP_DESKTOP },
        compact,
    })
}

/// Remembers the last observed viewport so resize storms that report the
/// same size do not trigger recomputation.
#[derive(Debug, Default)]
pub struct LayoutTracker {
    last_size: Option<Vec2>,
    current: Option<Layout>,
}

impl LayoutTracker {
    /// Returns the new layout only when the size genuinely changed and is
    /// usable.  A degenerate size is remembered but yields no layout.
    pub fn observe(&mut self, width: f64, height: f64) -> Option<Layout> {
        let size = Vec2::new(width, height);
        if self.last_size == Some(size) {
            return None;
        }
        self.last_size = Some(size);

        match compute_layout(width, height) {
            Ok(layout) => {
                tracing::debug!(
                    "layout: {width}x{height} tile={:.1}x{:.1} cols={} compact={}",
                    layout.tile_width,
                    layout.tile_height,
                    layout.columns,
                    layout.compact,
                );
                self.current = Some(layout);
                Some(layout)
            }
            Err(err) => {
                tracing::debug!("layout skipped: {err}");
                self.current = None;
                None
            }
        }
    }

    pub fn current(&self) -> Option<Layout> {
        self.current
    }

    pub fn viewport(&self) -> Option<Vec2> {
        self.last_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_layout_caps_tile_width() {
        let layout = compute_layout(1920.0, 1080.0).unwrap();
        assert!(!layout.compact);
        assert_eq!(layout.tile_width, 260.0);
        assert_eq!(layout.columns, 8);
        assert_eq!(layout.rows, 6);
        assert_eq!(layout.gap, 60.0);
        assert!((layout.tile_height - 260.0 * 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(layout.buffer(), 250.0);
    }

    #[test]
    fn desktop_layout_scales_below_cap() {
        let layout = compute_layout(1000.0, 800.0).unwrap();
        assert!((layout.tile_width - 180.0).abs() < 1e-9);
        assert!((layout.tile_height - 240.0).abs() < 1e-9);
    }

    #[test]
    fn mobile_layout_below_breakpoint() {
        let layout = compute_layout(767.0, 900.0).unwrap();
        assert!(layout.compact);
        assert!((layout.tile_width - 767.0 * 0.36).abs() < 1e-9);
        assert_eq!(layout.columns, 4);
        assert_eq!(layout.gap, 24.0);
        assert_eq!(layout.buffer(), 100.0);

        assert!(!compute_layout(768.0, 900.0).unwrap().compact);
    }

    #[test]
    fn degenerate_viewport_is_rejected() {
        assert!(matches!(
            compute_layout(0.0, 500.0),
            Err(GridError::DegenerateViewport { .. })
        ));
        assert!(compute_layout(500.0, 0.0).is_err());
        assert!(compute_layout(f64::NAN, 500.0).is_err());
    }

    #[test]
    fn tracker_only_recomputes_on_change() {
        let mut tracker = LayoutTracker::default();
        assert!(tracker.observe(1000.0, 800.0).is_some());
        assert!(tracker.observe(1000.0, 800.0).is_none());
        assert!(tracker.current().is_some());
        assert!(tracker.observe(1000.0, 700.0).is_some());
        assert!(tracker.observe(0.0, 700.0).is_none());
        assert!(tracker.current().is_none());
    }
}
