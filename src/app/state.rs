//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::core::grid::{GridEngine, GridEvent};
use crate::core::item::{Catalog, Item};

/// Top-level application state.
pub struct AppState {
    pub catalog: Catalog,
    /// Walk sub-directories when (re)loading the catalog.
    pub recursive: bool,
    /// One grid session; replaced wholesale when the catalog changes.
    pub engine: GridEngine,
    pub config: AppConfig,
    /// Decoded thumbnails by image path.
    pub image_cache: HashMap<PathBuf, Arc<image::RgbaImage>>,
    /// Bumped per catalog load; stale decode results are dropped.
    pub catalog_generation: u64,
    /// Set when the current catalog's images still need decoding.
    pub needs_image_load: bool,
    /// Area the grid was last drawn into, for mouse mapping.
    pub grid_area: Rect,
    /// Run the idle drift until the first interaction.
    pub idle_demo: bool,
    pub interacted: bool,
    /// Mirrors the engine's last `SettledChanged`.
    pub settled: bool,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(catalog: Catalog, recursive: bool, config: AppConfig, idle_demo: bool) -> Self {
        let engine = GridEngine::new(catalog.items().to_vec(), config.tuning);
        let mut state = Self {
            catalog,
            recursive,
            engine,
            config,
            image_cache: HashMap::new(),
            catalog_generation: 0,
            needs_image_load: false,
            grid_area: Rect::default(),
            idle_demo,
            interacted: false,
            settled: true,
            status_message: None,
            should_quit: false,
        };
        state.start_session();
        state
    }

    /// Fresh engine over the current catalog.
    fn start_session(&mut self) {
        self.engine = GridEngine::new(self.catalog.items().to_vec(), self.config.tuning);
        self.engine.set_idle(self.idle_demo && !self.interacted);
        self.catalog_generation = self.catalog_generation.wrapping_add(1);
        self.needs_image_load = true;
        self.settled = true;
        self.grid_area = Rect::default();
        if self.catalog.is_empty() {
            self.status_message = Some("catalog is empty".into());
        }
    }

    /// Re-read the catalog from its directory and start a new session.
    pub fn reload(&mut self) -> anyhow::Result<()> {
        let catalog = self
            .catalog
            .reload(self.recursive)
            .context("reloading catalog")?;
        tracing::debug!("catalog reloaded: {} items", catalog.len());
        self.catalog = catalog;
        self.image_cache.clear();
        self.status_message = Some(format!("reloaded {} items", self.catalog.len()));
        self.start_session();
        Ok(())
    }

    /// Image paths still missing from the cache.
    pub fn pending_images(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .catalog
            .items()
            .iter()
            .filter_map(|item| item.image.clone())
            .filter(|p| !self.image_cache.contains_key(p))
            .collect();
        paths.dedup();
        paths
    }

    pub fn focused_item(&self) -> Option<&Item> {
        self.engine.focused_item()
    }

    /// Apply everything the engine reported since the last call.
    pub fn pump_grid_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                GridEvent::FocusChanged(index) => {
                    tracing::debug!("focused item {index}");
                    self.status_message = None;
                }
                GridEvent::SettledChanged(settled) => self.settled = settled,
                GridEvent::TileActivated(index) => {
                    if let Some(item) = self.engine.items().get(index) {
                        tracing::info!("opened {} ({})", item.name, item.id);
                        self.status_message = Some(format!("opened {}", describe(item)));
                    }
                }
                GridEvent::InteractionBegan => {
                    if !self.interacted {
                        self.interacted = true;
                        self.engine.set_idle(false);
                    }
                }
            }
        }
    }
}

/// `Name · Price` for the status bar.
pub fn describe(item: &Item) -> String {
    match &item.price {
        Some(price) => format!("{} · {}", item.name, price),
        None => item.name.clone(),
    }
}
