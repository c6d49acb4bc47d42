//! Data-driven game balance
//!
//! Every field defaults to the matching constant in [`crate::consts`], so a
//! tuning file only needs the values it overrides.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Balance and layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Launch impulse before scale correction
    pub base_power: f32,
    /// Muzzle distance from the launcher pivot (unscaled)
    pub muzzle_offset: f32,
    /// Ball radius (unscaled)
    pub ball_radius: f32,
    /// Settle threshold (units/s)
    pub settle_speed: f32,
    /// Off-screen bound (negative y)
    pub off_screen_y: f32,
    /// Fraction of playfield height treated as the floor for misses
    pub miss_band: f32,
    /// Seconds before a finished attempt respawns the ball
    pub reset_delay: f32,
    /// Seconds before the level-complete screen is shown
    pub completion_delay: f32,
    pub wall_thickness: f32,
    /// Platform size (unscaled)
    pub platform_width: f32,
    pub platform_height: f32,
    /// Basket size (unscaled)
    pub basket_size: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_power: BASE_POWER,
            muzzle_offset: MUZZLE_OFFSET,
            ball_radius: BALL_RADIUS,
            settle_speed: SETTLE_SPEED,
            off_screen_y: OFF_SCREEN_Y,
            miss_band: MISS_BAND,
            reset_delay: RESET_DELAY,
            completion_delay: COMPLETION_DELAY,
            wall_thickness: WALL_THICKNESS,
            platform_width: PLATFORM_WIDTH,
            platform_height: PLATFORM_HEIGHT,
            basket_size: BASKET_SIZE,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load tuning from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Bad tuning file {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Can't read {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "base_power": 100.0, "reset_delay": 1.0 }"#).unwrap();
        assert_eq!(tuning.base_power, 100.0);
        assert_eq!(tuning.reset_delay, 1.0);
        assert_eq!(tuning.settle_speed, SETTLE_SPEED);
        assert_eq!(tuning.wall_thickness, WALL_THICKNESS);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Tuning::from_json("{ base_power: ").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tuning = Tuning::load(std::path::Path::new("/nonexistent/tuning.json"));
        assert_eq!(tuning, Tuning::default());
    }
}
