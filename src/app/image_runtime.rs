//! Background thumbnail decoding so the frame loop never blocks on I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

/// Largest thumbnail edge in pixels.  Tiles are drawn with half-blocks, so
/// this comfortably covers the biggest tile a terminal can show.
pub const THUMB_MAX: u32 = 160;

pub struct ImageUpdate {
    /// Catalog generation the request belonged to.
    pub generation: u64,
    pub path: PathBuf,
    pub result: anyhow::Result<Arc<image::RgbaImage>>,
}

/// Decode and shrink one image.
pub fn load_thumbnail(path: &Path) -> anyhow::Result<image::RgbaImage> {
    let img = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    Ok(img.thumbnail(THUMB_MAX, THUMB_MAX).to_rgba8())
}

/// Decode `paths` in order on a worker thread.  Each result is sent as soon
/// as it is ready; the thread stops early if the receiver goes away.
pub fn spawn_thumbnail_decode(
    tx: mpsc::UnboundedSender<ImageUpdate>,
    generation: u64,
    paths: Vec<PathBuf>,
) {
    if paths.is_empty() {
        return;
    }
    std::thread::spawn(move || {
        for path in paths {
            let result = load_thumbnail(&path).map(Arc::new);
            if tx
                .send(ImageUpdate {
                    generation,
                    path,
                    result,
                })
                .is_err()
            {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("red.png");
        image::RgbaImage::from_pixel(400, 200, image::Rgba([255, 0, 0, 255]))
            .save(&good)
            .unwrap();
        let bad = dir.path().join("broken.png");
        std::fs::write(&bad, b"not a png").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_thumbnail_decode(tx, 7, vec![good.clone(), bad.clone()]);

        let first = rx.blocking_recv().unwrap();
        assert_eq!(first.generation, 7);
        assert_eq!(first.path, good);
        let thumb = first.result.unwrap();
        assert_eq!(thumb.width(), THUMB_MAX);
        assert_eq!(thumb.height(), THUMB_MAX / 2);
        assert_eq!(thumb.get_pixel(0, 0)[0], 255);

        let second = rx.blocking_recv().unwrap();
        assert_eq!(second.path, bad);
        assert!(second.result.is_err());

        assert!(rx.blocking_recv().is_none());
    }
}
