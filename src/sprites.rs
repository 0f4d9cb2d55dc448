// src/sprites.rs
//
// Pre-loaded sprite frames and the finale beam asset. A sprite index that
// fails to load becomes an empty placeholder: the fighter stays tracked,
// the compositor just has nothing to draw for that frame.

use crate::types::{FighterId, SpriteConfig};
use image::RgbImage;
use std::path::Path;
use tracing::{info, warn};

/// Ordered sprite frames for one fighter. Frame indices are 1-based; index
/// 0 is the tracker's "no sprite" state and never maps to an image.
pub struct SpriteSet {
    frames: Vec<RgbImage>,
}

impl SpriteSet {
    pub fn from_images(frames: Vec<RgbImage>) -> Self {
        Self { frames }
    }

    /// Look up a 1-based animation index. Missing and zero-size frames
    /// both come back as None.
    pub fn frame(&self, index: u32) -> Option<&RgbImage> {
        if index == 0 {
            return None;
        }
        self.frames
            .get(index as usize - 1)
            .filter(|img| img.width() > 0 && img.height() > 0)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Native width/height ratio of the first loadable frame; 1.0 when no
    /// frame loaded at all.
    pub fn native_aspect(&self) -> f64 {
        self.frames
            .iter()
            .find(|img| img.width() > 0 && img.height() > 0)
            .map(|img| img.width() as f64 / img.height() as f64)
            .unwrap_or(1.0)
    }
}

pub struct SpriteLibrary {
    sets: [SpriteSet; 2],
    beam: RgbImage,
}

impl SpriteLibrary {
    /// Load both fighters' sprite sets and the beam image. Individual
    /// misses are logged and replaced by empty placeholders; loading as a
    /// whole never fails.
    pub fn load(config: &SpriteConfig) -> Self {
        let dir = Path::new(&config.dir);
        let red = load_frames(dir, &config.red_prefix, config.frame_count);
        let blue = load_frames(dir, &config.blue_prefix, config.frame_count);
        let beam = load_image(&dir.join(&config.beam_file));

        info!(
            "Sprites loaded: {} red, {} blue frames, beam {}",
            red.frames.iter().filter(|f| f.width() > 0).count(),
            blue.frames.iter().filter(|f| f.width() > 0).count(),
            if beam.width() > 0 { "ok" } else { "missing" }
        );

        Self {
            sets: [red, blue],
            beam,
        }
    }

    pub fn from_parts(red: SpriteSet, blue: SpriteSet, beam: RgbImage) -> Self {
        Self {
            sets: [red, blue],
            beam,
        }
    }

    pub fn fighter(&self, id: FighterId) -> &SpriteSet {
        &self.sets[id.index()]
    }

    pub fn beam(&self) -> Option<&RgbImage> {
        if self.beam.width() > 0 && self.beam.height() > 0 {
            Some(&self.beam)
        } else {
            None
        }
    }
}

fn load_frames(dir: &Path, prefix: &str, count: u32) -> SpriteSet {
    let frames = (1..=count)
        .map(|i| load_image(&dir.join(format!("{prefix}{i}.png"))))
        .collect();
    SpriteSet::from_images(frames)
}

/// Silent-miss load: a failed read yields a zero-size placeholder.
fn load_image(path: &Path) -> RgbImage {
    match image::open(path) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            warn!("sprite {} not loaded: {}", path.display(), e);
            RgbImage::new(0, 0)
        }
    }
}
