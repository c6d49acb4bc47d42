//! Attempt state and playfield geometry

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::BodyId;
use crate::consts::*;
use crate::{game_scale, point_along, screen_scale_factor};

/// Phase of a single launch-to-reset attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Ball pinned to the muzzle, following the aim
    Aiming,
    /// Ball in flight under physics
    Launched,
    /// Attempt over, respawn pending
    Resetting,
}

/// One attempt. Replaced by a fresh `Aiming` instance after each reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptState {
    pub phase: Phase,
    /// Radians, 0 = right, counter-clockwise
    pub aim_angle: f32,
    /// Ball body in the physics world
    pub ball: Option<BodyId>,
    /// Mirrors the physics world once launched
    pub ball_position: Vec2,
    pub ball_velocity: Vec2,
    /// Latch: a reset has been scheduled for this attempt
    pub reset_pending: bool,
}

impl AttemptState {
    pub fn new(aim_angle: f32, ball: Option<BodyId>, muzzle: Vec2) -> Self {
        Self {
            phase: Phase::Aiming,
            aim_angle,
            ball,
            ball_position: muzzle,
            ball_velocity: Vec2::ZERO,
            reset_pending: false,
        }
    }

    pub fn is_aiming(&self) -> bool {
        self.phase == Phase::Aiming
    }

    /// Aiming → Launched. Returns false (and changes nothing) in any other phase.
    pub fn launch(&mut self) -> bool {
        if self.phase != Phase::Aiming {
            return false;
        }
        self.phase = Phase::Launched;
        true
    }

    /// Launched → Resetting.
    ///
    /// Returns true only for the first call per attempt; the caller schedules the
    /// respawn exactly when this returns true.
    pub fn begin_reset(&mut self) -> bool {
        if self.phase != Phase::Launched || self.reset_pending {
            return false;
        }
        self.phase = Phase::Resetting;
        self.reset_pending = true;
        true
    }

    /// Copy the authoritative body state from physics
    pub fn sync(&mut self, position: Vec2, velocity: Vec2) {
        self.ball_position = position;
        self.ball_velocity = velocity;
    }

    /// Settled, or fell off the bottom of the screen
    pub fn is_idle(&self, settle_speed: f32, off_screen_y: f32) -> bool {
        self.ball_velocity.length() < settle_speed || self.ball_position.y < off_screen_y
    }
}

/// Screen-space playfield (points, y up, origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        // iPhone 12-14 logical size
        Self {
            width: REFERENCE_WIDTH,
            height: 844.0,
        }
    }
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Capped layout scale for sizes and launch power
    pub fn scale(&self) -> f32 {
        game_scale(self.width)
    }

    /// Uncapped width ratio for platform speed
    pub fn screen_scale_factor(&self) -> f32 {
        screen_scale_factor(self.width)
    }

    /// Normalized [0,1]² position to points
    pub fn anchor(&self, normalized: Vec2) -> Vec2 {
        Vec2::new(self.width * normalized.x, self.height * normalized.y)
    }

    pub fn launcher_pivot(&self) -> Vec2 {
        self.anchor(Vec2::new(LAUNCHER_ANCHOR_X, LAUNCHER_ANCHOR_Y))
    }

    /// Where the ball sits for a given aim
    pub fn muzzle(&self, aim_angle: f32, muzzle_offset: f32) -> Vec2 {
        point_along(self.launcher_pivot(), aim_angle, muzzle_offset * self.scale())
    }

    /// Wall contacts below this height are misses
    pub fn miss_line(&self, band: f32) -> f32 {
        self.height * band
    }
}
