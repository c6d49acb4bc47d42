//! Boundary to the host physics engine
//!
//! The game core never integrates bodies itself. It asks the world to create,
//! move and push bodies, reads velocities back, and is told about new contacts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque body handle issued by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Collision categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Ball,
    /// Boundary walls and basket rims
    Wall,
    /// Scoring sensor beneath the rim
    Basket,
    Platform,
    Launcher,
}

impl Category {
    pub const fn bits(self) -> u32 {
        match self {
            Category::Ball => 1 << 0,
            Category::Wall => 1 << 1,
            Category::Basket => 1 << 2,
            Category::Platform => 1 << 3,
            Category::Launcher => 1 << 4,
        }
    }
}

/// A contact that just began
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub a: Category,
    pub b: Category,
    /// World-space contact point
    pub point: Vec2,
    /// Velocity of `a` relative to `b`. Against static bodies this is the
    /// moving body's own velocity.
    pub relative_velocity: Vec2,
}

impl ContactEvent {
    pub fn new(a: Category, b: Category, point: Vec2, relative_velocity: Vec2) -> Self {
        Self {
            a,
            b,
            point,
            relative_velocity,
        }
    }

    /// Category mask of the pair
    pub fn pair(&self) -> u32 {
        self.a.bits() | self.b.bits()
    }

    pub fn is_between(&self, x: Category, y: Category) -> bool {
        self.pair() == x.bits() | y.bits()
    }

    /// The ball's velocity, whichever side of the pair it is on
    pub fn ball_velocity(&self) -> Option<Vec2> {
        if self.a == Category::Ball {
            Some(self.relative_velocity)
        } else if self.b == Category::Ball {
            Some(-self.relative_velocity)
        } else {
            None
        }
    }
}

/// Operations the game core needs from a rigid-body world
pub trait PhysicsWorld {
    /// Create a ball body at `position`. New balls are not dynamic.
    fn spawn_ball(&mut self, position: Vec2, radius: f32) -> BodyId;
    fn remove_body(&mut self, body: BodyId);
    fn set_dynamic(&mut self, body: BodyId, dynamic: bool);
    /// One-off impulse; ignored for non-dynamic bodies
    fn apply_impulse(&mut self, body: BodyId, impulse: Vec2);
    /// Teleport a body (kinematic placement)
    fn set_position(&mut self, body: BodyId, position: Vec2);
    fn position(&self, body: BodyId) -> Option<Vec2>;
    fn velocity(&self, body: BodyId) -> Option<Vec2>;
}

/// A world that the game can advance itself (headless runs, tests)
pub trait StepWorld: PhysicsWorld {
    /// Advance by `dt`, returning contacts that began during the step
    fn step(&mut self, dt: f32) -> Vec<ContactEvent>;
}

/// Bodies the level layout repositions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneBodies {
    pub basket: BodyId,
    pub platform: BodyId,
}
