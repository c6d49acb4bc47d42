//! Level session: score, attempts, completion and the moving platform

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::schedule::SessionId;
use super::state::Playfield;
use crate::analytics::{AnalyticsSink, LevelEventKind};
use crate::consts::REFERENCE_FRAME_RATE;
use crate::levels::LevelConfiguration;
use crate::persistence::{KeyValueStore, Progress};

/// Result of a valid basket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// Counted, target not reached yet
    Counted { score: u32 },
    /// This basket cleared the level
    Completed { score: u32, next_level_index: usize },
    /// Level already cleared; nothing counted
    Ignored,
}

/// Counters for one run at one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSession {
    pub id: SessionId,
    pub level_index: usize,
    pub score: u32,
    pub attempts_this_level: u32,
    pub config: LevelConfiguration,
    /// Target reached; no more scoring or resets
    pub completed: bool,
}

impl LevelSession {
    pub fn new(id: SessionId, level_index: usize, config: LevelConfiguration) -> Self {
        Self {
            id,
            level_index,
            score: 0,
            attempts_this_level: 1,
            config,
            completed: false,
        }
    }

    /// Count a basket. The basket that reaches the target reports completion,
    /// records the unlock and is the only one that does.
    pub fn on_score<S: KeyValueStore, A: AnalyticsSink>(
        &mut self,
        progress: &mut Progress<S>,
        analytics: &mut A,
    ) -> ScoreOutcome {
        if self.completed {
            return ScoreOutcome::Ignored;
        }
        self.score += 1;
        if self.score < self.config.target_score {
            return ScoreOutcome::Counted { score: self.score };
        }

        self.completed = true;
        analytics.record_level_event(
            self.level_index,
            LevelEventKind::Completed,
            self.attempts_this_level,
        );
        progress.unlock_next_level(self.level_index);
        log::info!(
            "Level {} complete after {} attempt(s)",
            self.config.level_number,
            self.attempts_this_level
        );
        ScoreOutcome::Completed {
            score: self.score,
            next_level_index: self.level_index + 1,
        }
    }

    /// Count a failed attempt. Reports the attempt number that just failed,
    /// then moves on to the next one.
    pub fn on_miss<A: AnalyticsSink>(&mut self, analytics: &mut A) -> u32 {
        let failed = self.attempts_this_level;
        analytics.record_level_event(self.level_index, LevelEventKind::Failed, failed);
        self.attempts_this_level += 1;
        failed
    }
}

/// Horizontally oscillating platform, positioned directly (not simulated)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub position: Vec2,
    pub half_width: f32,
    /// +1 right, -1 left
    pub direction: f32,
    /// Per-frame speed at the reference width
    pub speed: f32,
    pub moving: bool,
}

impl Platform {
    pub fn new(position: Vec2, half_width: f32, config: &LevelConfiguration) -> Self {
        Self {
            position,
            half_width,
            direction: 1.0,
            speed: config.platform_move_speed,
            moving: config.is_platform_moving,
        }
    }

    /// Advance by `dt` seconds, bouncing off the side margins.
    /// Returns true if the platform moved.
    pub fn advance(&mut self, dt: f32, field: &Playfield, wall_thickness: f32) -> bool {
        if !self.moving {
            return false;
        }
        let frames = dt * REFERENCE_FRAME_RATE;
        let step = self.speed * field.screen_scale_factor() * self.direction * frames;
        let margin = self.half_width + wall_thickness;

        let mut x = self.position.x + step;
        if x > field.width - margin {
            x = field.width - margin;
            self.direction = -1.0;
        } else if x < margin {
            x = margin;
            self.direction = 1.0;
        }
        self.position.x = x;
        true
    }
}
