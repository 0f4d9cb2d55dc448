// src/types.rs

use imageproc::point::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub detection: DetectionConfig,
    pub classify: ClassifyConfig,
    pub tracking: TrackingConfig,
    pub animation: AnimationConfig,
    pub composite: CompositeConfig,
    pub finale: FinaleConfig,
    pub sprites: SpriteConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// A single still image, treated as a one-frame stream.
    Still,
    /// Numbered frame files in a directory.
    Sequence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub mode: SourceMode,
    pub path: String,
    pub display_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionChannel {
    Gray,
    Red,
    Green,
    Blue,
}

impl DetectionChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionChannel::Gray => "gray",
            DetectionChannel::Red => "red",
            DetectionChannel::Green => "green",
            DetectionChannel::Blue => "blue",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Edge maps are built for each listed channel and classified
    /// independently; per-class results are unioned, last writer wins.
    pub channels: Vec<DetectionChannel>,
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub min_area: f64,
    /// Polygon approximation tolerance as a fraction of arc length.
    pub approx_epsilon_frac: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            channels: vec![
                DetectionChannel::Gray,
                DetectionChannel::Red,
                DetectionChannel::Green,
                DetectionChannel::Blue,
            ],
            blur_sigma: 1.4,
            canny_low: 50.0,
            canny_high: 150.0,
            min_area: 2000.0,
            approx_epsilon_frac: 0.02,
        }
    }
}

/// Hue bands and sampling geometry for color confirmation.
///
/// These were tuned for a specific marker/lighting setup; keep the defaults
/// unless re-tuning against real footage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Red band wraps around 0°: hue < red_hue_below or hue > red_hue_above.
    pub red_hue_below: f32,
    pub red_hue_above: f32,
    /// Blue band is exclusive on both ends.
    pub blue_hue_min: f32,
    pub blue_hue_max: f32,
    /// Sampling half-width = min vertex-to-centroid distance / divisor.
    pub sample_radius_divisor: f32,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            red_hue_below: 40.0,
            red_hue_above: 310.0,
            blue_hue_min: 170.0,
            blue_hue_max: 280.0,
            sample_radius_divisor: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Frames a fighter may go undetected before it is marked absent
    /// (exclusive threshold: absent once the miss count exceeds this).
    pub disappear_after: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self { disappear_after: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Advance sprite indices every `cadence` frames.
    pub cadence: u32,
    pub idle_start: u32,
    pub idle_end: u32,
    pub fight_start: u32,
    /// Frames both fighters must co-exist before the fight phase starts
    /// (exclusive threshold).
    pub fight_after: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            cadence: 1,
            idle_start: 1,
            idle_end: 3,
            fight_start: 4,
            fight_after: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Sprite major dimension relative to the marker's min vertex spacing.
    pub size_scale: f64,
    pub chroma_green_min: u8,
    pub chroma_red_max: u8,
    pub chroma_blue_max: u8,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            size_scale: 0.66,
            chroma_green_min: 200,
            chroma_red_max: 100,
            chroma_blue_max: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinaleConfig {
    /// Empirical factor applied to both the beam slant angle and the
    /// compensating horizontal scale.
    pub slant_correction: f64,
    /// Channel ceiling below which a rotated-in pixel counts as background.
    pub black_threshold: u8,
}

impl Default for FinaleConfig {
    fn default() -> Self {
        Self {
            slant_correction: 0.92,
            black_threshold: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteConfig {
    pub dir: String,
    pub red_prefix: String,
    pub blue_prefix: String,
    /// Total sprite frames per fighter; the fight range runs to this index.
    pub frame_count: u32,
    pub beam_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
    pub save_frames: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

// ============================================================================
// DOMAIN TYPES
// ============================================================================

/// The two persistently tracked fighters, keyed by marker class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FighterId {
    /// Red triangle marker.
    Red,
    /// Blue square marker.
    Blue,
}

impl FighterId {
    pub const ALL: [FighterId; 2] = [FighterId::Red, FighterId::Blue];

    pub fn index(&self) -> usize {
        match self {
            FighterId::Red => 0,
            FighterId::Blue => 1,
        }
    }

    pub fn shape(&self) -> ShapeClass {
        match self {
            FighterId::Red => ShapeClass::Triangle,
            FighterId::Blue => ShapeClass::Square,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FighterId::Red => "RED",
            FighterId::Blue => "BLUE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeClass {
    Triangle,
    Square,
}

impl ShapeClass {
    pub fn fighter(&self) -> FighterId {
        match self {
            ShapeClass::Triangle => FighterId::Red,
            ShapeClass::Square => FighterId::Blue,
        }
    }
}

/// A confirmed marker detection, consumed by the tracker within the frame.
#[derive(Debug, Clone)]
pub struct ClassifiedMarker {
    pub class: ShapeClass,
    pub centroid: Point<i32>,
    pub polygon: Vec<Point<i32>>,
}

/// Per-frame union of detections, at most one per fighter class.
#[derive(Debug, Clone, Default)]
pub struct DetectionSet {
    slots: [Option<ClassifiedMarker>; 2],
}

impl DetectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later insertions for the same class overwrite earlier ones.
    pub fn insert(&mut self, marker: ClassifiedMarker) {
        let id = marker.class.fighter();
        self.slots[id.index()] = Some(marker);
    }

    pub fn get(&self, id: FighterId) -> Option<&ClassifiedMarker> {
        self.slots[id.index()].as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Even-rounded on-screen sprite dimensions for a fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSize {
    pub w: u32,
    pub h: u32,
}

impl RenderSize {
    /// True when rounding collapsed the size below anything drawable.
    pub fn is_degenerate(&self) -> bool {
        self.w < 2 || self.h < 2
    }
}
