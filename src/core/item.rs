//! Items and the catalog that supplies them.
//!
//! An [`Item`] is an opaque, immutable record.  The grid engine only reads
//! its name/id for focus reporting and its image path for rendering.
//! A [`Catalog`] is the ordered, finite list the lattice folds onto; it is
//! built either from a directory of images or from the built-in demo set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

/// File extensions recognised as catalog images (lower-case).
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "ico"];

/// Optional manifest next to the images: `file = Name | Price` per line.
pub const MANIFEST_NAME: &str = "catalog.txt";

/// A single product shown on the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub image: Option<PathBuf>,
    pub price: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
            price: None,
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }
}

/// Ordered item list.  Replacing it means starting a fresh grid session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    /// Directory this catalog was read from (`None` for the demo set).
    source: Option<PathBuf>,
}

impl Catalog {
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            items,
            source: None,
        }
    }

    /// Eight placeholder products used when no directory is given.
    pub fn demo() -> Self {
        let items = [
            ("canvas-tote", "Canvas Tote", "€45"),
            ("extra-bag-l27", "Extra Bag L27", "€129"),
            ("trail-daypack", "Trail Daypack", "€89"),
            ("weekender-duffel", "Weekender Duffel", "€159"),
            ("sling-pouch", "Sling Pouch", "€39"),
            ("roll-top-25", "Roll-Top 25", "€119"),
            ("city-backpack", "City Backpack", "€99"),
            ("travel-organizer", "Travel Organizer", "€29"),
        ]
        .into_iter()
        .map(|(id, name, price)| Item::new(id, name).with_price(price))
        .collect();
        Self::from_items(items)
    }

    /// Build a catalog from the image files in `dir`, sorted by file name.
    ///
    /// Only the top level is scanned unless `recursive` is set.  Names come
    /// from the file stem unless the manifest overrides them.
    pub fn from_dir(dir: &Path, recursive: bool) -> anyhow::Result<Self> {
        let dir = dir
            .canonicalize()
            .with_context(|| format!("catalog directory {}", dir.display()))?;
        let manifest = read_manifest(&dir.join(MANIFEST_NAME))?;

        let mut walker = WalkDir::new(&dir).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut items = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("skipping catalog entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_image(entry.path()) {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            let mut item = Item::new(rel.clone(), display_name(entry.path()))
                .with_image(entry.path());
            if let Some(over) = manifest.get(&rel) {
                if let Some(name) = &over.name {
                    item.name = name.clone();
                }
                item.price = over.price.clone();
            }
            items.push(item);
        }

        tracing::debug!("catalog: {} items from {}", items.len(), dir.display());
        Ok(Self {
            items,
            source: Some(dir),
        })
    }

    /// Re-read the catalog from its source directory (demo sets are kept).
    pub fn reload(&self, recursive: bool) -> anyhow::Result<Self> {
        match &self.source {
            Some(dir) => Self::from_dir(dir, recursive),
            None => Ok(self.clone()),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// `red_canvas-tote.png` → `red canvas tote`.
fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default()
}

#[derive(Debug, Default)]
struct ManifestEntry {
    name: Option<String>,
    price: Option<String>,
}

/// Parse `file = Name | Price` lines.  A missing manifest is not an error.
fn read_manifest(path: &Path) -> anyhow::Result<HashMap<String, ManifestEntry>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    Ok(parse_manifest(&contents))
}

fn parse_manifest(s: &str) -> HashMap<String, ManifestEntry> {
    let mut out = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((file, rest)) = line.split_once('=') else {
            continue;
        };
        let (name, price) = match rest.split_once('|') {
            Some((n, p)) => (n.trim(), p.trim()),
            None => (rest.trim(), ""),
        };
        let entry = ManifestEntry {
            name: (!name.is_empty()).then(|| name.to_string()),
            price: (!price.is_empty()).then(|| price.to_string()),
        };
        out.insert(file.trim().to_string(), entry);
    }
    out
}
