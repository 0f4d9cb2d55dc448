// src/compositor.rs
//
// Paints each visible fighter's current sprite frame onto the live frame:
// resize to the marker-derived render size, mirror so the fighters face
// each other, drop chroma-key background pixels, paste centered. Sprite
// asset buffers are never touched; every paste works on a resized copy.

use crate::entity_tracker::EntityTracker;
use crate::sprites::SpriteLibrary;
use crate::types::{CompositeConfig, FighterId, RenderSize};
use image::imageops::{flip_horizontal, resize, FilterType};
use image::{Rgb, RgbImage};
use imageproc::point::Point;
use tracing::debug;

/// Render size for a freshly detected marker: the major dimension is a
/// conservative inscribed-size estimate (min pairwise vertex distance times
/// `scale`), the minor dimension follows the sprite's native aspect. Both
/// are floored to even so center-based placement stays exact.
pub fn render_size(polygon: &[Point<i32>], aspect: f64, scale: f64) -> RenderSize {
    let base = even_floor(min_pairwise_distance(polygon) * scale);
    if aspect >= 1.0 {
        RenderSize {
            w: base,
            h: even_floor(base as f64 / aspect),
        }
    } else {
        RenderSize {
            w: even_floor(base as f64 * aspect),
            h: base,
        }
    }
}

fn min_pairwise_distance(polygon: &[Point<i32>]) -> f64 {
    let mut min = f64::INFINITY;
    for (i, a) in polygon.iter().enumerate() {
        for b in &polygon[i + 1..] {
            let dx = (a.x - b.x) as f64;
            let dy = (a.y - b.y) as f64;
            min = min.min((dx * dx + dy * dy).sqrt());
        }
    }
    if min.is_finite() {
        min
    } else {
        0.0
    }
}

fn even_floor(v: f64) -> u32 {
    if v <= 0.0 {
        return 0;
    }
    let n = v as u32;
    n - n % 2
}

pub struct Compositor {
    config: CompositeConfig,
}

impl Compositor {
    pub fn new(config: CompositeConfig) -> Self {
        Self { config }
    }

    /// Sprites mirror when the red fighter stands left of the blue one, so
    /// the characters face each other.
    pub fn mirror_needed(tracker: &EntityTracker) -> bool {
        tracker.both_visible()
            && tracker.state(FighterId::Red).position.x < tracker.state(FighterId::Blue).position.x
    }

    /// Composite every drawable fighter onto the frame.
    pub fn compose(&self, frame: &mut RgbImage, tracker: &EntityTracker, sprites: &SpriteLibrary) {
        let mirror = Self::mirror_needed(tracker);

        for id in FighterId::ALL {
            let state = tracker.state(id);
            if !state.visible || state.anim_index == 0 {
                continue;
            }
            // Missing sprite: the fighter stays tracked, nothing is drawn.
            let Some(sprite) = sprites.fighter(id).frame(state.anim_index) else {
                debug!("no sprite for {} index {}", id.as_str(), state.anim_index);
                continue;
            };
            // A marker too small to produce a drawable size skips this frame.
            if state.render_size.is_degenerate() {
                debug!("{} render size collapsed, skipping", id.as_str());
                continue;
            }

            let mut resized = resize(
                sprite,
                state.render_size.w,
                state.render_size.h,
                FilterType::Triangle,
            );
            if mirror {
                resized = flip_horizontal(&resized);
            }
            self.paste_masked(frame, &resized, state.position);
        }
    }

    /// Paste centered at `center`, substituting the live frame wherever the
    /// sprite pixel falls in the chroma band, clipping at frame borders.
    fn paste_masked(&self, frame: &mut RgbImage, sprite: &RgbImage, center: Point<i32>) {
        let x0 = center.x - sprite.width() as i32 / 2;
        let y0 = center.y - sprite.height() as i32 / 2;
        let (fw, fh) = (frame.width() as i32, frame.height() as i32);

        for (sx, sy, pixel) in sprite.enumerate_pixels() {
            if self.is_chroma(pixel) {
                continue;
            }
            let fx = x0 + sx as i32;
            let fy = y0 + sy as i32;
            if fx < 0 || fy < 0 || fx >= fw || fy >= fh {
                continue;
            }
            frame.put_pixel(fx as u32, fy as u32, *pixel);
        }
    }

    fn is_chroma(&self, pixel: &Rgb<u8>) -> bool {
        let [r, g, b] = pixel.0;
        g >= self.config.chroma_green_min
            && r <= self.config.chroma_red_max
            && b <= self.config.chroma_blue_max
    }
}
