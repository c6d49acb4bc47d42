//! Bounce Basket entry point
//!
//! Native: headless autoplay through the level catalog, persisting progress to a
//! JSON file. Web: the JS host drives `platform::web::WebGame`.
//!
//! Usage: `bounce-basket [progress.json] [tuning.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use std::f32::consts::FRAC_PI_2;
    use std::path::Path;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use bounce_basket::analytics::{Analytics, DeviceInfo, LogBeacon, fallback_player_id};
    use bounce_basket::consts::SIM_DT;
    use bounce_basket::persistence::JsonFileStore;
    use bounce_basket::platform::now_seconds;
    use bounce_basket::sim::{ArenaWorld, Game, GameEvent, Playfield, TickInput, tick};
    use bounce_basket::tuning::Tuning;

    /// Give up on a level after this many shots
    const MAX_ATTEMPTS_PER_LEVEL: u32 = 250;
    /// A shot that neither scores nor resets within this time is abandoned
    const MAX_SHOT_SECONDS: f32 = 20.0;

    type HeadlessGame = Game<ArenaWorld, JsonFileStore, Analytics<LogBeacon>>;

    /// How a single shot ended
    enum Shot {
        Missed,
        Cleared { is_last_level: bool },
        Stuck,
    }

    pub fn run(progress_path: &Path, tuning_path: Option<&Path>, seed: u64) {
        let tuning = tuning_path.map(Tuning::load).unwrap_or_default();
        let field = Playfield::default();
        let world = ArenaWorld::new(field, &tuning);
        let bodies = world.bodies();
        let store = JsonFileStore::open(progress_path);

        let mut analytics = Analytics::new(LogBeacon, fallback_player_id(), DeviceInfo::default());
        analytics.start_session(now_seconds());
        let mut game = Game::new(world, bodies, store, analytics, tuning, field);
        let mut rng = Pcg32::seed_from_u64(seed);

        log::info!(
            "Autoplay from level index {} (seed {})",
            game.progress().highest_unlocked_level_index(),
            seed
        );

        loop {
            if game.continue_game().is_err() {
                log::info!("Every level is cleared");
                break;
            }
            if !play_level(&mut game, &mut rng) {
                break;
            }
        }

        game.analytics_mut().end_session(now_seconds());
        for tile in game.level_select() {
            log::info!(
                "Level {:>2}: {}",
                tile.level_number,
                if tile.unlocked { "unlocked" } else { "locked" }
            );
        }
    }

    /// Shoot until the level clears. Returns false to stop the run.
    fn play_level(game: &mut HeadlessGame, rng: &mut Pcg32) -> bool {
        for _ in 0..MAX_ATTEMPTS_PER_LEVEL {
            let input = TickInput {
                aim_angle: Some(rng.random_range(0.05..FRAC_PI_2 - 0.05)),
                fire: true,
                ..Default::default()
            };
            tick(game, &input, SIM_DT);

            match play_out_shot(game) {
                Shot::Missed => continue,
                Shot::Cleared { is_last_level } => return !is_last_level,
                Shot::Stuck => {
                    log::warn!("Shot never resolved, restarting level");
                    game.leave_level();
                    return true;
                }
            }
        }
        let attempts = game.session().map_or(0, |s| s.attempts_this_level);
        log::warn!("Giving up after {} attempts", attempts);
        game.leave_level();
        false
    }

    fn play_out_shot(game: &mut HeadlessGame) -> Shot {
        let idle = TickInput::default();
        let steps = (MAX_SHOT_SECONDS / SIM_DT) as usize;
        for _ in 0..steps {
            tick(game, &idle, SIM_DT);
            for event in game.drain_events() {
                log::debug!("{:?}", event);
                match event {
                    GameEvent::BallReset => return Shot::Missed,
                    GameEvent::LevelComplete { is_last_level, .. } => {
                        return Shot::Cleared { is_last_level };
                    }
                    _ => {}
                }
            }
        }
        Shot::Stuck
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bounce Basket (native) starting...");

    let args: Vec<String> = std::env::args().collect();
    let progress = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("bounce_basket_progress.json");
    let tuning = args.get(2).map(std::path::Path::new);
    let seed = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(42);

    autoplay::run(std::path::Path::new(progress), tuning, seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
