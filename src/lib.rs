//! Bounce Basket - cannon-and-basket arcade game core
//!
//! Core modules:
//! - `sim`: Attempt state machine, level sessions and deferred tasks
//! - `levels`: Static level catalog and unlock gating
//! - `persistence`: Key/value store and player progress
//! - `analytics`: Fire-and-forget session and level event beacon
//! - `platform`: Browser bindings (LocalStorage, fetch, JS host)
//! - `tuning`: Data-driven game balance

pub mod analytics;
pub mod levels;
pub mod persistence;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use analytics::{Analytics, AnalyticsSink, LevelEventKind};
pub use levels::{LevelConfiguration, LevelError, LEVELS};
pub use persistence::{KeyValueStore, MemoryStore, Progress};
pub use sim::{Game, GameEvent, TickInput, tick};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frame rate the per-frame platform speeds were authored against
    pub const REFERENCE_FRAME_RATE: f32 = 60.0;

    /// Layout scaling: widths are measured against a 390pt phone
    pub const REFERENCE_WIDTH: f32 = 390.0;
    /// Cap so tablets don't get giant sprites
    pub const MAX_GAME_SCALE: f32 = 1.5;

    /// Launcher pivot as a fraction of the playfield
    pub const LAUNCHER_ANCHOR_X: f32 = 0.15;
    pub const LAUNCHER_ANCHOR_Y: f32 = 0.2;
    /// Muzzle distance from the pivot (scaled)
    pub const MUZZLE_OFFSET: f32 = 50.0;
    /// Cannon angle on a fresh install (radians)
    pub const INITIAL_AIM_ANGLE: f32 = std::f32::consts::PI / 8.0;

    /// Ball defaults (scaled)
    pub const BALL_RADIUS: f32 = 20.0;
    /// Launch impulse before the scale^2.5 correction
    pub const BASE_POWER: f32 = 80.0;

    /// Below this speed a launched ball counts as settled
    pub const SETTLE_SPEED: f32 = 5.0;
    /// Ball below this height has left the screen
    pub const OFF_SCREEN_Y: f32 = -100.0;
    /// Wall contacts below this fraction of the height are misses
    pub const MISS_BAND: f32 = 0.05;

    /// Seconds between a settled ball and the respawn
    pub const RESET_DELAY: f32 = 0.5;
    /// Seconds between the winning basket and the level-complete screen
    pub const COMPLETION_DELAY: f32 = 0.5;

    /// Boundary walls
    pub const WALL_THICKNESS: f32 = 10.0;
    /// Platform size (scaled)
    pub const PLATFORM_WIDTH: f32 = 100.0;
    pub const PLATFORM_HEIGHT: f32 = 40.0;
    /// Basket sprite size (scaled)
    pub const BASKET_SIZE: f32 = 100.0;
}

/// Layout scale for a playfield width, capped at `MAX_GAME_SCALE`
#[inline]
pub fn game_scale(frame_width: f32) -> f32 {
    (frame_width / consts::REFERENCE_WIDTH).min(consts::MAX_GAME_SCALE)
}

/// Uncapped width ratio, used for platform speed
#[inline]
pub fn screen_scale_factor(frame_width: f32) -> f32 {
    frame_width / consts::REFERENCE_WIDTH
}

/// Launch impulse magnitude.
///
/// Mass grows with scale² and launch velocity must grow with √scale to keep the
/// trajectory shape under constant gravity, so the impulse grows with scale^2.5.
#[inline]
pub fn launch_power(base_power: f32, scale: f32) -> f32 {
    base_power * scale.powf(2.5)
}

/// Point at `distance` along `angle` from `origin`
#[inline]
pub fn point_along(origin: Vec2, angle: f32, distance: f32) -> Vec2 {
    origin + Vec2::from_angle(angle) * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_scale_caps_on_tablets() {
        assert!((game_scale(390.0) - 1.0).abs() < 1e-6);
        assert!((game_scale(1024.0) - 1.5).abs() < 1e-6);
        assert!(screen_scale_factor(1024.0) > 2.0);
    }

    #[test]
    fn test_launch_power_exponent() {
        assert!((launch_power(80.0, 1.0) - 80.0).abs() < 1e-4);
        let doubled = launch_power(80.0, 2.0);
        assert!((doubled - 80.0 * 2f32.powf(2.5)).abs() < 1e-3);
    }

    #[test]
    fn test_point_along() {
        let p = point_along(Vec2::new(10.0, 10.0), std::f32::consts::FRAC_PI_2, 5.0);
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.y - 15.0).abs() < 1e-5);
    }
}
