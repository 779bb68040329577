//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer takes the engine's per-frame tiles and turns them into cells
//! on the terminal.  No filesystem I/O happens here.

pub mod grid_widget;
pub mod layout;
pub mod theme;
