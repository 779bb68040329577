//! Input handling: maps key/mouse events onto the grid engine.
//!
//! Mouse positions are converted to the engine's virtual pixels through
//! the area the grid was last drawn into.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::config::Action;
use crate::core::geom::Vec2;
use crate::ui::layout::{cell_to_px, contains};

use super::state::AppState;

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    let Some(action) = state.config.match_key(key) else {
        return;
    };

    match action {
        Action::Quit => state.should_quit = true,
        Action::PanLeft => state.engine.nudge(0, -1),
        Action::PanRight => state.engine.nudge(0, 1),
        Action::PanUp => state.engine.nudge(-1, 0),
        Action::PanDown => state.engine.nudge(1, 0),
        Action::Activate => state.engine.activate_focused(),
        Action::Recenter => state.engine.recenter(),
        Action::Reload => {
            if let Err(err) = state.reload() {
                tracing::warn!("reload failed: {err:#}");
                state.status_message = Some(format!("reload failed: {err}"));
            }
        }
    }
}

/// Process a mouse event: left button drags/taps, wheel scrolls.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    let area = state.grid_area;
    let at = cell_to_px(area, mouse.column, mouse.row);
    let step = state.config.wheel_step_px;
    let horizontal = mouse.modifiers.contains(KeyModifiers::SHIFT);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if contains(area, mouse.column, mouse.row) {
                state.engine.pointer_down(at);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => state.engine.pointer_move(at),
        MouseEventKind::Up(MouseButton::Left) => state.engine.pointer_up(at),
        MouseEventKind::ScrollDown if horizontal => state.engine.wheel(Vec2::new(step, 0.0)),
        MouseEventKind::ScrollUp if horizontal => state.engine.wheel(Vec2::new(-step, 0.0)),
        MouseEventKind::ScrollDown => state.engine.wheel(Vec2::new(0.0, step)),
        MouseEventKind::ScrollUp => state.engine.wheel(Vec2::new(0.0, -step)),
        MouseEventKind::ScrollRight => state.engine.wheel(Vec2::new(step, 0.0)),
        MouseEventKind::ScrollLeft => state.engine.wheel(Vec2::new(-step, 0.0)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ratatui::layout::Rect;

    use super::*;
    use crate::config::AppConfig;
    use crate::core::grid::{GridEvent, InteractionState};
    use crate::core::item::Catalog;
    use crate::ui::layout::viewport_px;

    fn state() -> AppState {
        let mut state = AppState::new(Catalog::demo(), false, AppConfig::default(), false);
        state.grid_area = Rect::new(0, 0, 200, 60);
        let vp = viewport_px(state.grid_area);
        state.engine.resize(vp.x, vp.y);
        state.engine.drain_events();
        state
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn press(state: &mut AppState, code: KeyCode) {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn quit_keys() {
        let mut s = state();
        press(&mut s, KeyCode::Char('q'));
        assert!(s.should_quit);

        let mut s = state();
        handle_key(&mut s, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(s.should_quit);
    }

    #[test]
    fn arrows_move_focus_one_cell() {
        let mut s = state();
        press(&mut s, KeyCode::Right);
        assert_eq!(s.engine.focused_index(), Some(1));
        press(&mut s, KeyCode::Char('h'));
        press(&mut s, KeyCode::Char('h'));
        assert_eq!(s.engine.focused_index(), Some(7));
    }

    #[test]
    fn enter_activates_focused_tile() {
        let mut s = state();
        press(&mut s, KeyCode::Enter);
        s.pump_grid_events();
        let name = &s.catalog.items()[0].name;
        assert!(s.status_message.as_deref().unwrap_or("").contains(name.as_str()));
        assert!(s.interacted);
    }

    #[test]
    fn mouse_drag_pans_and_release_settles() {
        let mut s = state();
        let start = s.engine.raw_offset();
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), 100, 30));
        handle_mouse(&mut s, mouse(MouseEventKind::Drag(MouseButton::Left), 90, 30));
        assert_eq!(s.engine.state(), InteractionState::Dragging);
        assert_eq!(s.engine.raw_offset(), start + Vec2::new(-80.0, 0.0));

        handle_mouse(&mut s, mouse(MouseEventKind::Up(MouseButton::Left), 90, 30));
        assert_eq!(s.engine.state(), InteractionState::Settling);
    }

    #[test]
    fn click_without_drag_opens_tile() {
        let mut s = state();
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), 100, 30));
        handle_mouse(&mut s, mouse(MouseEventKind::Up(MouseButton::Left), 100, 30));
        assert_eq!(
            s.engine.drain_events(),
            vec![GridEvent::InteractionBegan, GridEvent::TileActivated(0)]
        );
    }

    #[test]
    fn press_outside_grid_is_ignored() {
        let mut s = state();
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), 100, 60));
        handle_mouse(&mut s, mouse(MouseEventKind::Drag(MouseButton::Left), 50, 40));
        assert_eq!(s.engine.state(), InteractionState::Idle);
    }

    #[test]
    fn wheel_scrolls_with_configured_step() {
        let mut s = state();
        let start = s.engine.raw_offset();
        handle_mouse(&mut s, mouse(MouseEventKind::ScrollDown, 10, 10));
        assert_eq!(s.engine.raw_offset(), start + Vec2::new(0.0, -40.0));

        let mut shifted = mouse(MouseEventKind::ScrollDown, 10, 10);
        shifted.modifiers = KeyModifiers::SHIFT;
        handle_mouse(&mut s, shifted);
        assert_eq!(s.engine.raw_offset(), start + Vec2::new(-40.0, -40.0));

        s.engine.advance(Duration::from_millis(100));
        assert_eq!(s.engine.state(), InteractionState::Settling);
    }
}
