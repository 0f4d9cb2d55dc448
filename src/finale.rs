// src/finale.rs
//
// One-shot terminal render: a beam image resized, rotated and scaled so it
// visually connects the two fighters' last tracked centers. The rotation is
// anchored at the center of the beam's near (left-fighter) edge; a
// compensating horizontal scale counteracts the rotation's foreshortening.
// Rotation background is near-black and keeps the live frame instead.

use crate::entity_tracker::{EntityState, EntityTracker};
use crate::sprites::SpriteLibrary;
use crate::types::{FighterId, FinaleConfig};
use image::imageops::{flip_horizontal, resize, FilterType};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};
use tracing::{info, warn};

/// Geometry of the connecting beam, derived from the fighters' last
/// placements. None when the fighters are too close for a drawable beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BeamLayout {
    /// Horizontal span, rounded even.
    pub width: u32,
    /// Beam cross-section: the larger of the two vertical extents.
    pub height: u32,
    /// Vertical offset between the fighters.
    pub gap: u32,
    /// True when the beam slants downward left-to-right.
    pub downward: bool,
    /// True when the beam asset fires right-to-left.
    pub mirror: bool,
    /// Frame position of the working canvas's top-left corner.
    pub origin: (i32, i32),
}

pub(crate) fn beam_layout(red: &EntityState, blue: &EntityState) -> Option<BeamLayout> {
    let (left, right, mirror) = if red.position.x <= blue.position.x {
        (red, blue, false)
    } else {
        (blue, red, true)
    };

    let width = even_floor((right.position.x - left.position.x) as f64);
    let height = even_floor(red.render_size.h.max(blue.render_size.h) as f64);
    if width < 2 || height < 2 {
        return None;
    }

    let gap = left.position.y.abs_diff(right.position.y);
    let top = left.position.y.min(right.position.y);
    Some(BeamLayout {
        width,
        height,
        gap,
        downward: right.position.y >= left.position.y,
        mirror,
        origin: (left.position.x, top - height as i32 / 2),
    })
}

fn even_floor(v: f64) -> u32 {
    if v <= 0.0 {
        return 0;
    }
    let n = v as u32;
    n - n % 2
}

pub struct FinaleComposer {
    config: FinaleConfig,
}

impl FinaleComposer {
    pub fn new(config: FinaleConfig) -> Self {
        Self { config }
    }

    /// Render the beam onto the frame. Called exactly once, after which the
    /// pipeline stops pulling frames.
    pub fn compose(&self, frame: &mut RgbImage, tracker: &EntityTracker, sprites: &SpriteLibrary) {
        let Some(beam) = sprites.beam() else {
            warn!("finale skipped: beam asset missing");
            return;
        };
        let red = tracker.state(FighterId::Red);
        let blue = tracker.state(FighterId::Blue);
        let Some(layout) = beam_layout(red, blue) else {
            warn!("finale skipped: fighters too close for a beam");
            return;
        };

        info!(
            "Beam {}x{} gap {} ({})",
            layout.width,
            layout.height,
            layout.gap,
            if layout.downward { "downward" } else { "upward" }
        );

        let canvas = self.warped_canvas(beam, &layout);
        self.paste_over_background(frame, &canvas, layout.origin);
    }

    /// Build the oversized working canvas: resized beam pasted at the top
    /// or bottom, then rotated about the near edge with the compensating
    /// horizontal stretch.
    fn warped_canvas(&self, beam: &RgbImage, layout: &BeamLayout) -> RgbImage {
        let canvas_h = layout.height + layout.gap;
        let mut canvas = RgbImage::from_pixel(layout.width, canvas_h, Rgb([0, 0, 0]));

        let mut resized = resize(beam, layout.width, layout.height, FilterType::Triangle);
        if layout.mirror {
            resized = flip_horizontal(&resized);
        }

        let beam_top = if layout.downward {
            0
        } else {
            canvas_h - layout.height
        };
        image::imageops::overlay(&mut canvas, &resized, 0, beam_top as i64);

        if layout.gap == 0 {
            return canvas;
        }

        // Slant the beam so its far end meets the other fighter's center.
        let slope = layout.gap as f64 / layout.width as f64;
        let angle = slope.atan() * self.config.slant_correction;
        let signed = if layout.downward { angle } else { -angle };
        let stretch = (1.0 / angle.cos()) * self.config.slant_correction;

        let pivot_y = beam_top as f32 + layout.height as f32 / 2.0;
        let projection = Projection::translate(0.0, pivot_y)
            * Projection::rotate(signed as f32)
            * Projection::scale(stretch as f32, 1.0)
            * Projection::translate(0.0, -pivot_y);

        warp(&canvas, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]))
    }

    /// Paste the warped canvas, keeping the live frame wherever rotation
    /// left near-black background.
    fn paste_over_background(&self, frame: &mut RgbImage, canvas: &RgbImage, origin: (i32, i32)) {
        let (fw, fh) = (frame.width() as i32, frame.height() as i32);
        let threshold = self.config.black_threshold;

        for (cx, cy, pixel) in canvas.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            if r <= threshold && g <= threshold && b <= threshold {
                continue;
            }
            let fx = origin.0 + cx as i32;
            let fy = origin.1 + cy as i32;
            if fx < 0 || fy < 0 || fx >= fw || fy >= fh {
                continue;
            }
            frame.put_pixel(fx as u32, fy as u32, *pixel);
        }
    }
}
