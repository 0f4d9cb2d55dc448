// src/interface.rs
//
// Seams to the outside world: where frames come from and where composited
// results go. The pipeline treats a live camera, a frame directory and a
// single still image uniformly as a sequence.

use anyhow::{Context, Result};
use image::RgbImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use walkdir::WalkDir;

pub trait FrameSource {
    /// Next frame, or None at end of stream. A frame that failed to decode
    /// comes back zero-sized; the pipeline skips it.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

pub trait Presenter {
    /// Consume one labeled frame, blocking up to `delay_ms` to emulate
    /// display refresh.
    fn show(&mut self, label: &str, frame: &RgbImage, delay_ms: u64) -> Result<()>;
}

/// A single image file as a one-frame stream.
pub struct StillImageSource {
    frame: Option<RgbImage>,
}

impl StillImageSource {
    pub fn open(path: &Path) -> Result<Self> {
        let frame = image::open(path)
            .with_context(|| format!("opening still image {}", path.display()))?
            .to_rgb8();
        info!(
            "Still source: {} ({}x{})",
            path.display(),
            frame.width(),
            frame.height()
        );
        Ok(Self { frame: Some(frame) })
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frame.take())
    }
}

/// Numbered frame files in a directory, played back in name order.
pub struct FrameSequenceSource {
    files: Vec<PathBuf>,
    next: usize,
}

impl FrameSequenceSource {
    pub fn discover(dir: &Path) -> Result<Self> {
        let extensions = ["png", "jpg", "jpeg", "bmp"];
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            anyhow::bail!("no frame files in {}", dir.display());
        }
        info!("Frame sequence: {} files in {}", files.len(), dir.display());
        Ok(Self { files, next: 0 })
    }
}

impl FrameSource for FrameSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        match image::open(path) {
            Ok(img) => Ok(Some(img.to_rgb8())),
            Err(e) => {
                // Decode failures surface as empty frames, per the skip
                // policy, rather than ending the stream.
                warn!("frame {} failed to decode: {}", path.display(), e);
                Ok(Some(RgbImage::new(0, 0)))
            }
        }
    }
}

/// Writes labeled frames as numbered PNGs; stands in for a display window.
/// Each label counts independently, so `edges_NNNNN` and `duel_NNNNN` of the
/// same frame share a number.
pub struct DirectoryPresenter {
    dir: PathBuf,
    counters: HashMap<String, u64>,
}

impl DirectoryPresenter {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            counters: HashMap::new(),
        })
    }
}

impl Presenter for DirectoryPresenter {
    fn show(&mut self, label: &str, frame: &RgbImage, delay_ms: u64) -> Result<()> {
        let counter = self.counters.entry(label.to_string()).or_insert(0);
        let path = self.dir.join(format!("{label}_{:05}.png", *counter));
        frame.save(&path)?;
        *counter += 1;
        if delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(delay_ms));
        }
        Ok(())
    }
}

/// Headless presenter: drops frames, no refresh delay.
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn show(&mut self, _label: &str, _frame: &RgbImage, _delay_ms: u64) -> Result<()> {
        Ok(())
    }
}
