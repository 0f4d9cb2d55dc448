// src/entity_tracker.rs
//
// Persistent per-fighter screen state. A single missed detection must not
// flicker the overlay, so a fighter that drops out of a frame keeps its last
// placement for a bounded grace window before being marked absent.

use crate::compositor::render_size;
use crate::types::{DetectionSet, FighterId, RenderSize, TrackingConfig};
use imageproc::point::Point;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct EntityState {
    pub visible: bool,
    pub position: Point<i32>,
    pub render_size: RenderSize,
    /// Consecutive frames without a detection.
    pub idle_frames: u32,
    /// Sprite frame index; 0 is the distinguished "no sprite" state.
    /// Advanced by the animator, reset here on disappearance.
    pub anim_index: u32,
}

impl EntityState {
    fn absent() -> Self {
        Self {
            visible: false,
            position: Point::new(0, 0),
            render_size: RenderSize::default(),
            idle_frames: 0,
            anim_index: 0,
        }
    }
}

pub struct EntityTracker {
    config: TrackingConfig,
    /// Major-dimension scale applied to the marker's vertex spacing.
    size_scale: f64,
    /// Native sprite aspect (w/h) per fighter, fixed at load time.
    aspects: [f64; 2],
    states: [EntityState; 2],
}

impl EntityTracker {
    pub fn new(config: TrackingConfig, size_scale: f64, aspects: [f64; 2]) -> Self {
        Self {
            config,
            size_scale,
            aspects,
            states: [EntityState::absent(), EntityState::absent()],
        }
    }

    /// Fold one frame's detections into the persistent state.
    pub fn update(&mut self, detections: &DetectionSet) {
        for id in FighterId::ALL {
            let i = id.index();
            match detections.get(id) {
                Some(marker) => {
                    let state = &mut self.states[i];
                    if !state.visible {
                        info!("👊 {} fighter entered the scene", id.as_str());
                    }
                    state.visible = true;
                    state.position = marker.centroid;
                    state.render_size =
                        render_size(&marker.polygon, self.aspects[i], self.size_scale);
                    state.idle_frames = 0;
                }
                None => {
                    let state = &mut self.states[i];
                    if state.visible {
                        // Keep the stale placement; the compositor re-renders
                        // it until the grace window runs out.
                        state.idle_frames += 1;
                        if state.idle_frames > self.config.disappear_after {
                            state.visible = false;
                            state.anim_index = 0;
                            debug!(
                                "{} fighter absent after {} idle frames",
                                id.as_str(),
                                state.idle_frames
                            );
                        }
                    }
                }
            }
        }
    }

    pub fn state(&self, id: FighterId) -> &EntityState {
        &self.states[id.index()]
    }

    pub(crate) fn state_mut(&mut self, id: FighterId) -> &mut EntityState {
        &mut self.states[id.index()]
    }

    pub fn both_visible(&self) -> bool {
        self.states.iter().all(|s| s.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassifiedMarker, ShapeClass};

    fn tracker() -> EntityTracker {
        EntityTracker::new(TrackingConfig::default(), 0.66, [1.0, 1.0])
    }

    fn triangle_at(x: i32, y: i32) -> ClassifiedMarker {
        ClassifiedMarker {
            class: ShapeClass::Triangle,
            centroid: Point::new(x, y),
            polygon: vec![
                Point::new(x - 50, y + 40),
                Point::new(x + 50, y + 40),
                Point::new(x, y - 50),
            ],
        }
    }

    fn square_at(x: i32, y: i32) -> ClassifiedMarker {
        ClassifiedMarker {
            class: ShapeClass::Square,
            centroid: Point::new(x, y),
            polygon: vec![
                Point::new(x - 40, y - 40),
                Point::new(x + 40, y - 40),
                Point::new(x + 40, y + 40),
                Point::new(x - 40, y + 40),
            ],
        }
    }

    fn detections(markers: &[ClassifiedMarker]) -> DetectionSet {
        let mut set = DetectionSet::new();
        for m in markers {
            set.insert(m.clone());
        }
        set
    }

    #[test]
    fn detection_makes_fighter_visible() {
        let mut t = tracker();
        t.update(&detections(&[triangle_at(100, 100)]));

        let state = t.state(FighterId::Red);
        assert!(state.visible);
        assert_eq!(state.position, Point::new(100, 100));
        assert_eq!(state.idle_frames, 0);
        assert!(!t.state(FighterId::Blue).visible);
    }

    #[test]
    fn grace_window_is_exclusive_at_twenty() {
        let mut t = tracker();
        t.update(&detections(&[triangle_at(100, 100)]));
        let empty = DetectionSet::new();

        // 20 misses: still visible, placement unchanged.
        for _ in 0..20 {
            t.update(&empty);
        }
        assert!(t.state(FighterId::Red).visible);
        assert_eq!(t.state(FighterId::Red).position, Point::new(100, 100));
        assert_eq!(t.state(FighterId::Red).idle_frames, 20);

        // 21st miss crosses the threshold.
        t.update(&empty);
        assert!(!t.state(FighterId::Red).visible);
        assert_eq!(t.state(FighterId::Red).anim_index, 0);
    }

    #[test]
    fn redetection_resets_the_miss_counter() {
        let mut t = tracker();
        t.update(&detections(&[triangle_at(100, 100)]));
        let empty = DetectionSet::new();
        for _ in 0..15 {
            t.update(&empty);
        }
        assert_eq!(t.state(FighterId::Red).idle_frames, 15);

        t.update(&detections(&[triangle_at(140, 90)]));
        let state = t.state(FighterId::Red);
        assert_eq!(state.idle_frames, 0);
        assert_eq!(state.position, Point::new(140, 90));
    }

    #[test]
    fn stale_position_survives_a_gap() {
        let mut t = tracker();
        t.update(&detections(&[square_at(200, 150)]));
        let size = t.state(FighterId::Blue).render_size;
        let empty = DetectionSet::new();
        for _ in 0..5 {
            t.update(&empty);
        }

        let state = t.state(FighterId::Blue);
        assert!(state.visible);
        assert_eq!(state.position, Point::new(200, 150));
        assert_eq!(state.render_size, size);
    }

    #[test]
    fn both_visible_needs_both() {
        let mut t = tracker();
        t.update(&detections(&[triangle_at(80, 80)]));
        assert!(!t.both_visible());
        t.update(&detections(&[triangle_at(80, 80), square_at(220, 90)]));
        assert!(t.both_visible());
    }
}
