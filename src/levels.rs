//! Level catalog
//!
//! Positions are normalized screen fractions: x 0 is left, y 0 is the bottom.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One handcrafted level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelConfiguration {
    /// 1-based, display only
    pub level_number: u32,
    /// Basket center
    pub basket_position: Vec2,
    /// Platform center
    pub platform_position: Vec2,
    pub is_platform_moving: bool,
    /// Per-frame speed at the reference width, ignored unless moving
    pub platform_move_speed: f32,
    /// Baskets required to clear the level
    pub target_score: u32,
}

const fn level(
    level_number: u32,
    basket: (f32, f32),
    platform: (f32, f32),
    is_platform_moving: bool,
    platform_move_speed: f32,
) -> LevelConfiguration {
    LevelConfiguration {
        level_number,
        basket_position: Vec2::new(basket.0, basket.1),
        platform_position: Vec2::new(platform.0, platform.1),
        is_platform_moving,
        platform_move_speed,
        target_score: 1,
    }
}

/// All levels in play order
pub const LEVELS: [LevelConfiguration; 10] = [
    // Intro: basket top right, platform in the middle
    level(1, (0.85, 0.8), (0.5, 0.5), false, 0.0),
    level(2, (0.75, 0.5), (0.5, 0.75), false, 0.0),
    // Height challenge
    level(3, (0.5, 0.5), (0.5, 0.75), false, 0.0),
    // First moving platform
    level(4, (0.8, 0.8), (0.5, 0.5), true, 2.0),
    level(5, (0.5, 0.5), (0.6, 0.75), true, 3.5),
    level(6, (0.85, 0.7), (0.5, 0.4), true, 5.0),
    // Basket tucked in the corner
    level(7, (0.9, 0.6), (0.5, 0.6), false, 0.0),
    level(8, (0.2, 0.5), (0.6, 0.6), true, 3.0),
    // Long shot; speed is set but the platform is static
    level(9, (0.8, 0.3), (0.5, 0.5), false, 6.0),
    level(10, (0.5, 0.5), (0.5, 0.7), true, 6.0),
];

/// Number of levels in the catalog
#[inline]
pub fn count() -> usize {
    LEVELS.len()
}

/// Look up a level by 0-based index
pub fn get(index: usize) -> Result<&'static LevelConfiguration, LevelError> {
    LEVELS.get(index).ok_or(LevelError::NoSuchLevel {
        index,
        count: LEVELS.len(),
    })
}

/// Level-select gate
#[inline]
pub fn is_unlocked(index: usize, highest_unlocked: usize) -> bool {
    index <= highest_unlocked
}

/// Whether `index` is the final level
#[inline]
pub fn is_last(index: usize) -> bool {
    index + 1 >= LEVELS.len()
}

/// A level-select grid entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelTile {
    pub index: usize,
    pub level_number: u32,
    pub unlocked: bool,
}

/// Build the level-select grid for the given progress
pub fn tiles(highest_unlocked: usize) -> Vec<LevelTile> {
    LEVELS
        .iter()
        .enumerate()
        .map(|(index, config)| LevelTile {
            index,
            level_number: config.level_number,
            unlocked: is_unlocked(index, highest_unlocked),
        })
        .collect()
}

/// Level lookup and gating failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelError {
    /// Index past the end of the catalog; the player has finished the game
    NoSuchLevel { index: usize, count: usize },
    /// Level exists but the player has not reached it
    Locked { index: usize, highest_unlocked: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NoSuchLevel { index, count } => {
                write!(f, "no level at index {} (catalog has {})", index, count)
            }
            LevelError::Locked {
                index,
                highest_unlocked,
            } => write!(
                f,
                "level {} is locked (highest unlocked is {})",
                index, highest_unlocked
            ),
        }
    }
}

impl std::error::Error for LevelError {}
