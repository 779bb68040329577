//! The grid engine: one explicit simulation object that owns the raw and
//! rendered offsets, the interaction state machine, and focus.
//!
//! The host feeds it input (`pointer_*`, `wheel`, `nudge`), viewport sizes
//! (`resize`) and time (`advance`, `poll_settled`), and drains
//! [`GridEvent`]s.  Nothing here knows about terminals.
//!
//! Exactly one writer owns the raw offset at a time, selected by
//! [`InteractionState`]:
//!
//! | state            | raw offset written by       | spring target  |
//! |------------------|-----------------------------|----------------|
//! | `Idle`           | nobody                      | raw            |
//! | `Dragging`       | pointer deltas              | raw            |
//! | `WheelScrolling` | wheel deltas                | raw            |
//! | `IdleDemo`       | [`IdleDrift`]               | raw            |
//! | `Settling`       | snap solver (once)          | snap target    |

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::error::GridError;
use super::geom::Vec2;
use super::idle::IdleDrift;
use super::item::Item;
use super::lattice::{resolve_index, FrameSnapshot, Tile, TileKey, VirtualCell};
use super::layout::{Layout, LayoutTracker};
use super::lens::{Entrance, DEFAULT_LENS_RADIUS, ENTRANCE_WINDOW};
use super::snap::{centering_offset, resolve_snap, DEFAULT_VELOCITY_LOOKAHEAD};
use super::spring::{Spring2, SpringConfig};
use super::velocity::VelocityTracker;

// ───────────────────────────────────────── tuning ────────────

/// Tunable constants for the lens, spring and input handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTuning {
    /// Fraction of the centre-to-corner distance at which the lens fully
    /// attenuates a tile.
    pub lens_radius: f64,
    /// Seconds of release velocity added to the raw offset before snapping.
    pub velocity_lookahead: f64,
    pub spring: SpringConfig,
    /// Settled iff both rendered velocity components are strictly below this (px/s).
    pub settle_threshold: f64,
    /// Quiet time after the last wheel event before snapping.
    pub wheel_idle: Duration,
    /// Multiplier turning the last wheel delta into a fling velocity.
    pub wheel_velocity_gain: f64,
    /// Pointer travel (px) before a press becomes a drag rather than a tap.
    pub drag_slop: f64,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            lens_radius: DEFAULT_LENS_RADIUS,
            velocity_lookahead: DEFAULT_VELOCITY_LOOKAHEAD,
            spring: SpringConfig::default(),
            settle_threshold: 2.0,
            wheel_idle: Duration::from_millis(60),
            wheel_velocity_gain: 15.0,
            drag_slop: 3.0,
        }
    }
}

// ───────────────────────────────────────── state / events ────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging,
    WheelScrolling,
    IdleDemo,
    Settling,
}

impl InteractionState {
    /// User input currently owns the raw offset.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Dragging | Self::WheelScrolling)
    }
}

/// Notifications for the host.  Item references are indices into
/// [`GridEngine::items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    FocusChanged(usize),
    SettledChanged(bool),
    TileActivated(usize),
    InteractionBegan,
}

/// Settle rule: no active input and both velocity components strictly
/// below `threshold`.
pub fn is_settled(state: InteractionState, velocity: Vec2, threshold: f64) -> bool {
    !state.is_active() && velocity.x.abs() < threshold && velocity.y.abs() < threshold
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Vec2,
    last: Vec2,
    dragging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Focus {
    cell: VirtualCell,
    index: usize,
}

// ───────────────────────────────────────── engine ────────────

#[derive(Debug)]
pub struct GridEngine {
    items: Vec<Item>,
    tuning: GridTuning,
    layout: LayoutTracker,
    raw: Vec2,
    spring: Spring2,
    state: InteractionState,
    /// Engine time, advanced only by [`advance`](Self::advance).
    clock: Duration,
    /// Clock value at the first usable layout.
    ready_at: Option<Duration>,
    /// When each visible tile first appeared, kept while entrances can
    /// still be playing.
    mounted: HashMap<TileKey, Duration>,
    press: Option<Press>,
    pointer_velocity: VelocityTracker,
    wheel_deadline: Option<Duration>,
    last_wheel_delta: Vec2,
    idle_requested: bool,
    drift: Option<IdleDrift>,
    focus: Option<Focus>,
    /// Last value reported through `SettledChanged`.
    settled: bool,
    events: Vec<GridEvent>,
}

impl GridEngine {
    /// Start a fresh session over `items`.  Nothing is drawn until the first
    /// [`resize`](Self::resize) with a usable viewport.
    pub fn new(items: Vec<Item>, tuning: GridTuning) -> Self {
        if items.is_empty() {
            tracing::debug!("grid session started: {}", GridError::EmptyItemList);
        }
        Self {
            items,
            tuning,
            layout: LayoutTracker::default(),
            raw: Vec2::ZERO,
            spring: Spring2::new(Vec2::ZERO, tuning.spring),
            state: InteractionState::Idle,
            clock: Duration::ZERO,
            ready_at: None,
            mounted: HashMap::new(),
            press: None,
            pointer_velocity: VelocityTracker::default(),
            wheel_deadline: None,
            last_wheel_delta: Vec2::ZERO,
            idle_requested: false,
            drift: None,
            focus: None,
            settled: true,
            events: Vec::new(),
        }
    }

    // ── accessors ────────────────────────────────────────────────

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[cfg(test)]
    pub fn layout(&self) -> Option<Layout> {
        self.layout.current()
    }

    #[cfg(test)]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    #[cfg(test)]
    pub fn raw_offset(&self) -> Vec2 {
        self.raw
    }

    #[cfg(test)]
    pub fn rendered_offset(&self) -> Vec2 {
        self.spring.position()
    }

    /// Rendered velocity in px/s.
    #[cfg(test)]
    pub fn velocity(&self) -> Vec2 {
        self.spring.velocity()
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focus.map(|f| f.index)
    }

    pub fn focused_item(&self) -> Option<&Item> {
        self.focus.and_then(|f| self.items.get(f.index))
    }

    pub fn focused_cell(&self) -> Option<VirtualCell> {
        self.focus.map(|f| f.cell)
    }

    /// Time since the first usable layout.
    fn since_ready(&self) -> Option<Duration> {
        self.ready_at.map(|t| self.clock.saturating_sub(t))
    }

    /// Reveal progress of `tile`, timed from when it first became visible.
    /// Tiles that appear after the entrance window are drawn revealed.
    pub fn entrance(&self, tile: &Tile<'_>) -> Entrance {
        if self.since_ready().is_none() {
            return Entrance::at(tile.lens.delay_factor, Duration::ZERO);
        }
        match self.mounted.get(&tile.key) {
            Some(&at) => Entrance::at(tile.lens.delay_factor, self.clock.saturating_sub(at)),
            None => Entrance::DONE,
        }
    }

    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    // ── viewport ─────────────────────────────────────────────────

    /// Observe the viewport size.  Only a genuine change does any work.
    pub fn resize(&mut self, width: f64, height: f64) {
        let Some(layout) = self.layout.observe(width, height) else {
            return;
        };
        let viewport = Vec2::new(width, height);

        if self.ready_at.is_none() {
            // First layout: centre cell (0,0) with no animation.
            self.ready_at = Some(self.clock);
            let origin = centering_offset(VirtualCell::ORIGIN, viewport, &layout);
            self.raw = origin;
            self.spring.jump_to(origin);
            self.set_focus(VirtualCell::ORIGIN, &layout);
            self.track_mounts();
            return;
        }

        if self.state.is_active() {
            return;
        }
        // Keep the focused cell centred across resizes.
        self.cancel_drift();
        let cell = self
            .focus
            .map(|f| f.cell)
            .unwrap_or_else(|| resolve_snap(self.raw, Vec2::ZERO, viewport, &layout, 0.0).cell);
        let target = centering_offset(cell, viewport, &layout);
        self.raw = target;
        self.spring.jump_to(target);
        self.state = InteractionState::Idle;
        self.track_mounts();
    }

    /// Snapshot for one enumeration pass.
    pub fn frame(&self) -> Option<FrameSnapshot> {
        Some(FrameSnapshot {
            layout: self.layout.current()?,
            offset: self.spring.position(),
            viewport: self.layout.viewport()?,
            lens_radius: self.tuning.lens_radius,
        })
    }

    /// Tiles to draw this frame, row-major.
    pub fn tiles(&self) -> Vec<Tile<'_>> {
        match self.frame() {
            Some(snapshot) => snapshot.enumerate(&self.items),
            None => Vec::new(),
        }
    }

    /// Topmost tile whose lens-scaled rectangle contains `point`.
    pub fn tile_at(&self, point: Vec2) -> Option<Tile<'_>> {
        let mut hits: Vec<Tile<'_>> = self
            .tiles()
            .into_iter()
            .filter(|t| t.contains(point))
            .collect();
        hits.sort_by_key(|t| std::cmp::Reverse(t.lens.z_index));
        hits.into_iter().next()
    }

    // ── time ─────────────────────────────────────────────────────

    /// Advance engine time by one frame: idle drift, wheel-idle deadline,
    /// then the spring.
    pub fn advance(&mut self, dt: Duration) {
        self.clock += dt;

        if let (InteractionState::IdleDemo, Some(drift)) = (self.state, self.drift) {
            self.raw = drift.offset_at(self.clock);
            self.spring.set_target(self.raw);
        }

        if let Some(deadline) = self.wheel_deadline {
            if self.clock >= deadline {
                self.wheel_deadline = None;
                let velocity = self.last_wheel_delta * self.tuning.wheel_velocity_gain;
                tracing::trace!("wheel idle; fling {:?}", velocity);
                self.release(velocity);
            }
        }

        self.spring.step(dt.as_secs_f64());

        if self.state == InteractionState::Settling && self.spring.is_at_rest() {
            self.state = InteractionState::Idle;
        }
        self.track_mounts();
    }

    /// Sample the settle rule.  Call on a fixed cadence (100 ms).  Reports
    /// flips only, and arms the idle demo once settled.
    pub fn poll_settled(&mut self) -> bool {
        let settled = is_settled(self.state, self.spring.velocity(), self.tuning.settle_threshold);
        if settled != self.settled {
            self.settled = settled;
            self.events.push(GridEvent::SettledChanged(settled));
        }
        if settled
            && self.idle_requested
            && self.state == InteractionState::Idle
            && self.ready_at.is_some()
        {
            self.drift = Some(IdleDrift::start(self.raw, self.clock));
            self.state = InteractionState::IdleDemo;
            tracing::debug!("idle demo started");
        }
        settled
    }

    /// Host says whether the user has not interacted yet.
    pub fn set_idle(&mut self, idle: bool) {
        self.idle_requested = idle;
        if !idle && self.state == InteractionState::IdleDemo {
            self.cancel_drift();
            self.release(Vec2::ZERO);
        }
    }

    // ── pointer ──────────────────────────────────────────────────

    pub fn pointer_down(&mut self, position: Vec2) {
        self.press = Some(Press {
            origin: position,
            last: position,
            dragging: false,
        });
        self.pointer_velocity.reset();
        self.pointer_velocity.push(self.clock, position);
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        let Some(mut press) = self.press else {
            return;
        };
        if !press.dragging {
            if (position - press.origin).length() < self.tuning.drag_slop {
                return;
            }
            self.wheel_deadline = None;
            self.begin(InteractionState::Dragging);
            press.dragging = true;
        }

        self.raw += position - press.last;
        self.spring.set_target(self.raw);
        press.last = position;
        self.press = Some(press);
        self.pointer_velocity.push(self.clock, position);
    }

    pub fn pointer_up(&mut self, position: Vec2) {
        let Some(press) = self.press.take() else {
            return;
        };
        if press.dragging {
            self.pointer_velocity.push(self.clock, position);
            let velocity = self.pointer_velocity.velocity(self.clock);
            tracing::trace!("drag released; velocity {:?}", velocity);
            self.release(velocity);
            return;
        }

        let hit = self.tile_at(position).map(|t| t.item_index);
        if let Some(index) = hit {
            self.events.push(GridEvent::InteractionBegan);
            self.events.push(GridEvent::TileActivated(index));
        }
    }

    // ── wheel ────────────────────────────────────────────────────

    /// One wheel/trackpad step.  Content moves opposite to the delta.
    pub fn wheel(&mut self, delta: Vec2) {
        if self.state == InteractionState::Dragging {
            return;
        }
        self.begin(InteractionState::WheelScrolling);
        self.raw += -delta;
        self.spring.set_target(self.raw);
        self.last_wheel_delta = -delta;
        self.wheel_deadline = Some(self.clock + self.tuning.wheel_idle);
    }

    // ── keyboard ─────────────────────────────────────────────────

    /// Move focus by whole cells and glide there.
    pub fn nudge(&mut self, rows: i64, cols: i64) {
        if self.state.is_active() {
            return;
        }
        let Some(base) = self.focus.map(|f| f.cell).or_else(|| self.snap_cell()) else {
            return;
        };
        self.events.push(GridEvent::InteractionBegan);
        self.glide_to(VirtualCell::new(base.row + rows, base.col + cols));
    }

    /// Glide back to the session origin.
    pub fn recenter(&mut self) {
        if self.state.is_active() {
            return;
        }
        self.events.push(GridEvent::InteractionBegan);
        self.glide_to(VirtualCell::ORIGIN);
    }

    /// Report the focused tile as activated (keyboard "enter").
    pub fn activate_focused(&mut self) {
        if let Some(index) = self.focused_index() {
            self.events.push(GridEvent::InteractionBegan);
            self.events.push(GridEvent::TileActivated(index));
        }
    }

    // ── internals ────────────────────────────────────────────────

    /// Idle→active transition.  Cancels any in-flight snap or drift; the
    /// spring keeps its position and velocity.
    fn begin(&mut self, next: InteractionState) {
        if !self.state.is_active() {
            match self.state {
                InteractionState::IdleDemo => self.cancel_drift(),
                _ => self.raw = self.spring.position(),
            }
            self.spring.set_target(self.raw);
            self.events.push(GridEvent::InteractionBegan);
        }
        self.state = next;
    }

    /// Stop the idle drift and put the raw offset back where it started.
    fn cancel_drift(&mut self) {
        if let Some(drift) = self.drift.take() {
            self.raw = drift.center();
            self.spring.set_target(self.raw);
            tracing::debug!("idle demo cancelled");
        }
        if self.state == InteractionState::IdleDemo {
            self.state = InteractionState::Settling;
        }
    }

    /// Hand `velocity` to the snap solver and start settling.
    fn release(&mut self, velocity: Vec2) {
        self.state = InteractionState::Settling;
        let (Some(layout), Some(viewport)) = (self.layout.current(), self.layout.viewport()) else {
            return;
        };
        let snap = resolve_snap(
            self.raw,
            velocity,
            viewport,
            &layout,
            self.tuning.velocity_lookahead,
        );
        tracing::debug!("snap to {:?} (velocity {:?})", snap.cell, velocity);
        self.raw = snap.target;
        self.spring.set_target(snap.target);
        self.set_focus(snap.cell, &layout);
    }

    fn glide_to(&mut self, cell: VirtualCell) {
        self.cancel_drift();
        let (Some(layout), Some(viewport)) = (self.layout.current(), self.layout.viewport()) else {
            return;
        };
        self.state = InteractionState::Settling;
        self.raw = centering_offset(cell, viewport, &layout);
        self.spring.set_target(self.raw);
        self.set_focus(cell, &layout);
    }

    /// Record first-seen times for newly visible tiles and forget tiles
    /// that left the view.  New tiles only count inside the entrance
    /// window; older entries are dropped once their reveal is over.
    fn track_mounts(&mut self) {
        let Some(since) = self.since_ready() else {
            return;
        };
        let open = since < ENTRANCE_WINDOW;
        if !open && self.mounted.is_empty() {
            return;
        }
        let visible: HashSet<TileKey> = self.tiles().into_iter().map(|t| t.key).collect();
        let clock = self.clock;
        self.mounted.retain(|key, at| {
            visible.contains(key) && clock.saturating_sub(*at) < ENTRANCE_WINDOW
        });
        if open {
            for key in visible {
                self.mounted.entry(key).or_insert(clock);
            }
        }
    }

    fn snap_cell(&self) -> Option<VirtualCell> {
        let layout = self.layout.current()?;
        let viewport = self.layout.viewport()?;
        Some(resolve_snap(self.raw, Vec2::ZERO, viewport, &layout, 0.0).cell)
    }

    fn set_focus(&mut self, cell: VirtualCell, layout: &Layout) {
        let Some(index) = resolve_index(cell, layout.columns, self.items.len()) else {
            tracing::debug!("focus suspended: {}", GridError::EmptyItemList);
            return;
        };
        let changed = self.focus.map(|f| f.index) != Some(index);
        self.focus = Some(Focus { cell, index });
        if changed {
            tracing::debug!("focus -> {} ({})", index, self.items[index].name);
            self.events.push(GridEvent::FocusChanged(index));
        }
    }
}
