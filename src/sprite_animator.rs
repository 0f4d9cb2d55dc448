// src/sprite_animator.rs
//
// Advances each fighter's sprite frame on a fixed cadence and runs the
// idle → fighting → finale phase machine. Indices cycle inside the idle
// range until both fighters have co-existed past the fight threshold, then
// inside the fight range; when both simultaneously land on the terminal
// fight frame the finale fires, once.

use crate::entity_tracker::EntityTracker;
use crate::types::{AnimationConfig, FighterId};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FightPhase {
    Idle,
    Fighting,
    Finale,
}

#[derive(Debug, Clone, Copy)]
pub struct FightState {
    /// Consecutive frames both fighters were visible. Resets the moment
    /// either one is not.
    pub co_frames: u32,
    pub phase: FightPhase,
}

pub struct SpriteAnimator {
    config: AnimationConfig,
    /// Terminal fight frame index (the sprite set's last frame).
    fight_end: u32,
    fight: FightState,
    frame_counter: u64,
}

impl SpriteAnimator {
    pub fn new(config: AnimationConfig, fight_end: u32) -> Self {
        Self {
            config,
            fight_end,
            fight: FightState {
                co_frames: 0,
                phase: FightPhase::Idle,
            },
            frame_counter: 0,
        }
    }

    pub fn fight_state(&self) -> &FightState {
        &self.fight
    }

    /// Run one frame of animation logic. Returns true exactly once, on the
    /// frame the finale is triggered.
    pub fn tick(&mut self, tracker: &mut EntityTracker) -> bool {
        self.frame_counter += 1;

        // Co-occurrence counting runs every frame regardless of cadence.
        if tracker.both_visible() {
            self.fight.co_frames += 1;
        } else {
            self.fight.co_frames = 0;
        }

        if self.fight.phase == FightPhase::Idle && self.fight.co_frames > self.config.fight_after {
            self.fight.phase = FightPhase::Fighting;
            info!(
                "⚔️  Fight phase after {} co-occurrence frames",
                self.fight.co_frames
            );
        }

        if self.frame_counter % self.config.cadence.max(1) as u64 == 0 {
            self.advance_indices(tracker);
        }

        if self.fight.phase == FightPhase::Fighting && self.both_at_terminal(tracker) {
            self.fight.phase = FightPhase::Finale;
            info!("💥 Finale triggered");
            return true;
        }
        false
    }

    fn advance_indices(&mut self, tracker: &mut EntityTracker) {
        let (start, end) = match self.fight.phase {
            FightPhase::Fighting => (self.config.fight_start, self.fight_end),
            _ => (self.config.idle_start, self.config.idle_end),
        };

        for id in FighterId::ALL {
            let state = tracker.state_mut(id);
            if !state.visible {
                continue;
            }
            // Index 0 (fresh appearance) and any index left over from the
            // other phase both snap to the current phase's start.
            state.anim_index = if state.anim_index < start || state.anim_index >= end {
                start
            } else {
                state.anim_index + 1
            };
        }
    }

    fn both_at_terminal(&self, tracker: &EntityTracker) -> bool {
        FighterId::ALL
            .iter()
            .all(|&id| tracker.state(id).anim_index == self.fight_end)
    }
}
