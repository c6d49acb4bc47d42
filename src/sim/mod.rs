//! Deterministic game core
//!
//! All gameplay logic lives here. The physics engine sits behind
//! [`PhysicsWorld`]; everything else is pure and single-threaded:
//! - Simulation clock only (no wall time)
//! - Deferred work goes through the [`Scheduler`]
//! - No rendering or platform dependencies

pub mod arena;
pub mod collision;
pub mod game;
pub mod physics;
pub mod schedule;
pub mod session;
pub mod state;
pub mod tick;

pub use arena::ArenaWorld;
pub use collision::{CollisionResult, ball_box_collision, reflect_velocity};
pub use game::{Game, GameEvent, SoundCue};
pub use physics::{BodyId, Category, ContactEvent, PhysicsWorld, SceneBodies, StepWorld};
pub use schedule::{Scheduler, SessionId, Task};
pub use session::{LevelSession, Platform, ScoreOutcome};
pub use state::{AttemptState, Phase, Playfield};
pub use tick::{FrameClock, TickInput, tick};
