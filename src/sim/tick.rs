//! Fixed-step driver for hosts that use the bundled world
//!
//! Engine hosts call the `Game` callbacks directly. Headless runs and the web
//! shell go through [`tick`], which steps a [`StepWorld`] and forwards its
//! contacts.

use glam::Vec2;

use super::game::Game;
use super::physics::StepWorld;
use crate::analytics::AnalyticsSink;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::persistence::KeyValueStore;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim at a point (touch/mouse position in playfield coordinates)
    pub aim_at: Option<Vec2>,
    /// Set the cannon angle directly (radians); wins over `aim_at`
    pub aim_angle: Option<f32>,
    /// Launch the ball (tap/space)
    pub fire: bool,
}

/// Advance the game by one fixed timestep
pub fn tick<W, S, A>(game: &mut Game<W, S, A>, input: &TickInput, dt: f32)
where
    W: StepWorld,
    S: KeyValueStore,
    A: AnalyticsSink,
{
    if let Some(angle) = input.aim_angle {
        game.on_aim_input(angle);
    } else if let Some(point) = input.aim_at {
        game.aim_at(point);
    }
    if input.fire {
        game.on_fire_input();
    }

    let contacts = game.world_mut().step(dt);
    for contact in &contacts {
        game.on_contact(contact);
    }

    game.on_tick(dt);
}

/// Variable frame time to fixed steps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many fixed steps as `frame_dt` covers, capped at `MAX_SUBSTEPS`.
    /// One-shot inputs are cleared once consumed. Returns the steps taken.
    pub fn advance<W, S, A>(
        &mut self,
        game: &mut Game<W, S, A>,
        input: &mut TickInput,
        frame_dt: f32,
    ) -> u32
    where
        W: StepWorld,
        S: KeyValueStore,
        A: AnalyticsSink,
    {
        self.accumulator += frame_dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(game, input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            input.fire = false;
            input.aim_angle = None;
        }
        substeps
    }

    /// Drop leftover time (after a pause or tab switch)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
