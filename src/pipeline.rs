// src/pipeline.rs
//
// Frame-sequential orchestration: classify, track, animate, composite, and
// once the fight sequence completes, render the finale and report Finished.
// Single writer, no locking; every error stays contained to its frame.

use crate::compositor::Compositor;
use crate::contour_classification::ContourClassifier;
use crate::edge_extraction::edge_maps;
use crate::entity_tracker::EntityTracker;
use crate::finale::FinaleComposer;
use crate::sprite_animator::{FightPhase, SpriteAnimator};
use crate::sprites::SpriteLibrary;
use crate::types::{Config, DetectionConfig, FighterId};
use image::{GrayImage, RgbImage};
use std::time::Duration;
use tracing::{info, warn};

/// Pause after an empty frame before the source is polled again.
const EMPTY_FRAME_PAUSE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Running,
    /// The finale has rendered; no further frames will be processed.
    Finished,
}

pub struct FrameOutcome {
    pub status: PipelineStatus,
    /// First detection channel's edge map, for display.
    pub edges: Option<GrayImage>,
}

#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub total_frames: u64,
    pub skipped_frames: u64,
    pub markers_classified: u64,
    pub frames_both_visible: u64,
    pub finale_rendered: bool,
}

pub struct Pipeline {
    detection: DetectionConfig,
    classifier: ContourClassifier,
    tracker: EntityTracker,
    animator: SpriteAnimator,
    compositor: Compositor,
    finale: FinaleComposer,
    sprites: SpriteLibrary,
    stats: ProcessingStats,
    finished: bool,
}

impl Pipeline {
    pub fn new(config: &Config, sprites: SpriteLibrary) -> Self {
        let aspects = [
            sprites.fighter(FighterId::Red).native_aspect(),
            sprites.fighter(FighterId::Blue).native_aspect(),
        ];
        Self {
            detection: config.detection.clone(),
            classifier: ContourClassifier::new(
                config.detection.clone(),
                config.classify.clone(),
            ),
            tracker: EntityTracker::new(
                config.tracking.clone(),
                config.composite.size_scale,
                aspects,
            ),
            animator: SpriteAnimator::new(config.animation.clone(), config.sprites.frame_count),
            compositor: Compositor::new(config.composite.clone()),
            finale: FinaleComposer::new(config.finale.clone()),
            sprites,
            stats: ProcessingStats::default(),
            finished: false,
        }
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn phase(&self) -> FightPhase {
        self.animator.fight_state().phase
    }

    pub fn tracker(&self) -> &EntityTracker {
        &self.tracker
    }

    /// Process one frame in place. Once Finished has been reported the
    /// pipeline stays idle and returns Finished without touching the frame.
    pub fn process_frame(&mut self, frame: &mut RgbImage) -> FrameOutcome {
        if self.finished {
            return FrameOutcome {
                status: PipelineStatus::Finished,
                edges: None,
            };
        }

        if frame.width() == 0 || frame.height() == 0 {
            warn!("empty frame from source, skipping");
            self.stats.skipped_frames += 1;
            std::thread::sleep(EMPTY_FRAME_PAUSE);
            return FrameOutcome {
                status: PipelineStatus::Running,
                edges: None,
            };
        }

        self.stats.total_frames += 1;

        let mut maps = edge_maps(frame, &self.detection);
        let detections = self.classifier.classify_channels(frame, &maps);
        self.stats.markers_classified += detections.len() as u64;

        self.tracker.update(&detections);
        if self.tracker.both_visible() {
            self.stats.frames_both_visible += 1;
        }

        let finale_now = self.animator.tick(&mut self.tracker);
        self.compositor.compose(frame, &self.tracker, &self.sprites);

        if finale_now {
            self.finale.compose(frame, &self.tracker, &self.sprites);
            self.stats.finale_rendered = true;
            self.finished = true;
            info!("🏁 Pipeline finished after {} frames", self.stats.total_frames);
        }

        FrameOutcome {
            status: if self.finished {
                PipelineStatus::Finished
            } else {
                PipelineStatus::Running
            },
            edges: if maps.is_empty() {
                None
            } else {
                Some(maps.swap_remove(0).1)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprites::SpriteSet;
    use image::Rgb;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    const BACKDROP: Rgb<u8> = Rgb([128, 128, 128]);
    const RED: Rgb<u8> = Rgb([230, 20, 20]);
    const BLUE: Rgb<u8> = Rgb([20, 40, 230]);
    const BODY: Rgb<u8> = Rgb([250, 250, 250]);

    fn test_config() -> Config {
        // The full channel list matters: the saturated markers below sit at
        // roughly the backdrop's luma, so grayscale alone never sees them.
        let mut config: Config = serde_yaml::from_str(include_str!("../config.yaml")).unwrap();
        config.sprites.frame_count = 7;
        config
    }

    fn test_sprites() -> SpriteLibrary {
        let frames: Vec<RgbImage> =
            (0..7).map(|_| RgbImage::from_pixel(24, 24, BODY)).collect();
        SpriteLibrary::from_parts(
            SpriteSet::from_images(frames.clone()),
            SpriteSet::from_images(frames),
            RgbImage::from_pixel(64, 16, Rgb([240, 220, 80])),
        )
    }

    /// Red triangle (5000 px²) and blue square (~5000 px²) on gray.
    fn synthetic_frame() -> RgbImage {
        let mut frame = RgbImage::from_pixel(480, 360, BACKDROP);
        draw_polygon_mut(&mut frame, &triangle_at(130), RED);
        draw_polygon_mut(
            &mut frame,
            &[
                Point::new(300, 130),
                Point::new(371, 130),
                Point::new(371, 201),
                Point::new(300, 201),
            ],
            BLUE,
        );
        frame
    }

    fn triangle_at(center_x: i32) -> [Point<i32>; 3] {
        [
            Point::new(center_x - 50, 220),
            Point::new(center_x + 50, 220),
            Point::new(center_x, 120),
        ]
    }

    #[test]
    fn round_trip_detects_and_composites_both_markers() {
        let mut pipeline = Pipeline::new(&test_config(), test_sprites());
        let mut frame = synthetic_frame();
        let outcome = pipeline.process_frame(&mut frame);

        assert_eq!(outcome.status, PipelineStatus::Running);
        assert!(outcome.edges.is_some());

        let red = pipeline.tracker().state(FighterId::Red);
        let blue = pipeline.tracker().state(FighterId::Blue);
        assert!(red.visible, "triangle tracked");
        assert!(blue.visible, "square tracked");
        assert!((red.position.x - 130).abs() < 20);
        assert!((blue.position.x - 335).abs() < 20);

        // The sprite was pasted over each marker's centroid.
        let rp = red.position;
        let bp = blue.position;
        assert_eq!(*frame.get_pixel(rp.x as u32, rp.y as u32), BODY);
        assert_eq!(*frame.get_pixel(bp.x as u32, bp.y as u32), BODY);
    }

    #[test]
    fn empty_frames_are_skipped_not_fatal() {
        let mut pipeline = Pipeline::new(&test_config(), test_sprites());
        let mut empty = RgbImage::new(0, 0);
        let outcome = pipeline.process_frame(&mut empty);

        assert_eq!(outcome.status, PipelineStatus::Running);
        assert!(outcome.edges.is_none());
        assert_eq!(pipeline.stats().skipped_frames, 1);
        assert_eq!(pipeline.stats().total_frames, 0);
    }

    #[test]
    fn sustained_co_occurrence_reaches_fighting_then_finale() {
        let mut pipeline = Pipeline::new(&test_config(), test_sprites());

        for _ in 0..51 {
            let mut frame = synthetic_frame();
            assert_eq!(
                pipeline.process_frame(&mut frame).status,
                PipelineStatus::Running
            );
        }
        assert_eq!(pipeline.phase(), FightPhase::Fighting);
        assert_eq!(pipeline.stats().frames_both_visible, 51);

        // Fight range is [4, 7]; both fighters reach the terminal frame a
        // few cadence ticks later and the finale fires.
        let mut finished_at = None;
        for i in 0..10 {
            let mut frame = synthetic_frame();
            if pipeline.process_frame(&mut frame).status == PipelineStatus::Finished {
                finished_at = Some(i);
                break;
            }
        }
        assert!(finished_at.is_some(), "finale never fired");
        assert_eq!(pipeline.phase(), FightPhase::Finale);
        assert!(pipeline.stats().finale_rendered);

        // Once finished, the pipeline stays idle.
        let mut frame = synthetic_frame();
        let outcome = pipeline.process_frame(&mut frame);
        assert_eq!(outcome.status, PipelineStatus::Finished);
        assert!(outcome.edges.is_none());
    }

    #[test]
    fn lone_marker_never_starts_a_fight() {
        let mut pipeline = Pipeline::new(&test_config(), test_sprites());
        let mut lone = RgbImage::from_pixel(480, 360, BACKDROP);
        draw_polygon_mut(&mut lone, &triangle_at(135), RED);

        for _ in 0..80 {
            let mut frame = lone.clone();
            pipeline.process_frame(&mut frame);
        }
        // The triangle is tracked throughout, but without a partner the
        // co-occurrence counter never moves.
        assert!(pipeline.tracker().state(FighterId::Red).visible);
        assert_eq!(pipeline.phase(), FightPhase::Idle);
        assert_eq!(pipeline.stats().frames_both_visible, 0);
    }
}
