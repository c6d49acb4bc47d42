//! The game core: one level session at a time, driven by host callbacks
//!
//! The host engine translates its own callbacks into `on_aim_input`,
//! `on_fire_input`, `on_contact` and `on_tick`, and drains [`GameEvent`]s to
//! drive presentation (layout, sounds, labels, scene changes).

use glam::Vec2;
use serde::Serialize;

use super::physics::{Category, ContactEvent, PhysicsWorld, SceneBodies};
use super::schedule::{Scheduler, SessionId, Task};
use super::session::{LevelSession, Platform, ScoreOutcome};
use super::state::{AttemptState, Phase, Playfield};
use crate::analytics::{AnalyticsSink, LevelEventKind};
use crate::consts::INITIAL_AIM_ANGLE;
use crate::launch_power;
use crate::levels::{self, LevelError, LevelTile};
use crate::persistence::{KeyValueStore, Progress};
use crate::tuning::Tuning;

/// Sound effect cues for the host's audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Fire,
    Bounce,
    Score,
}

/// Things the host should present
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Move basket and platform to their new anchors (animated by the host)
    LevelLoaded {
        level_index: usize,
        level_number: u32,
        target_score: u32,
        basket: Vec2,
        platform: Vec2,
    },
    /// First level ever loaded on this install
    TutorialRequested,
    Sound { cue: SoundCue },
    ScoreChanged { score: u32, target: u32 },
    /// Ball hit the floor; `attempts` is the attempt now in progress
    AttemptFailed { attempts: u32 },
    /// Fresh ball at the muzzle
    BallReset,
    /// Show the level-complete screen. The session has ended.
    LevelComplete {
        level_index: usize,
        next_level_index: usize,
        is_last_level: bool,
    },
}

/// Game core with injected physics world, preference store and analytics sink
#[derive(Debug)]
pub struct Game<W, S, A> {
    world: W,
    bodies: SceneBodies,
    progress: Progress<S>,
    analytics: A,
    tuning: Tuning,
    field: Playfield,
    scheduler: Scheduler,
    session: Option<LevelSession>,
    attempt: Option<AttemptState>,
    platform: Option<Platform>,
    /// Cannon angle; survives resets
    aim_angle: f32,
    next_session: u64,
    events: Vec<GameEvent>,
}

impl<W: PhysicsWorld, S: KeyValueStore, A: AnalyticsSink> Game<W, S, A> {
    pub fn new(
        world: W,
        bodies: SceneBodies,
        store: S,
        analytics: A,
        tuning: Tuning,
        field: Playfield,
    ) -> Self {
        Self {
            world,
            bodies,
            progress: Progress::new(store),
            analytics,
            tuning,
            field,
            scheduler: Scheduler::new(),
            session: None,
            attempt: None,
            platform: None,
            aim_angle: INITIAL_AIM_ANGLE,
            next_session: 1,
            events: Vec::new(),
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn progress(&self) -> &Progress<S> {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut Progress<S> {
        &mut self.progress
    }

    pub fn analytics(&self) -> &A {
        &self.analytics
    }

    pub fn analytics_mut(&mut self) -> &mut A {
        &mut self.analytics
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn playfield(&self) -> &Playfield {
        &self.field
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn session(&self) -> Option<&LevelSession> {
        self.session.as_ref()
    }

    pub fn attempt(&self) -> Option<&AttemptState> {
        self.attempt.as_ref()
    }

    pub fn platform(&self) -> Option<&Platform> {
        self.platform.as_ref()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.attempt.as_ref().map(|a| a.phase)
    }

    pub fn aim_angle(&self) -> f32 {
        self.aim_angle
    }

    /// Take everything emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Level-select grid for the current progress
    pub fn level_select(&self) -> Vec<LevelTile> {
        levels::tiles(self.progress.highest_unlocked_level_index())
    }

    /// Start (or restart) a level.
    ///
    /// `NoSuchLevel` means the player is past the last level: show the
    /// game-completed screen and make no further gameplay calls.
    pub fn load_level(&mut self, index: usize) -> Result<(), LevelError> {
        let config = match levels::get(index) {
            Ok(config) => *config,
            Err(e) => {
                log::info!("No level at index {}: game complete", index);
                return Err(e);
            }
        };
        self.teardown();

        let id = SessionId(self.next_session);
        self.next_session += 1;
        self.session = Some(LevelSession::new(id, index, config));

        let basket = self.field.anchor(config.basket_position);
        let platform = self.field.anchor(config.platform_position);
        self.world.set_position(self.bodies.basket, basket);
        self.world.set_position(self.bodies.platform, platform);
        let half_width = self.tuning.platform_width * self.field.scale() / 2.0;
        self.platform = Some(Platform::new(platform, half_width, &config));

        self.analytics
            .record_level_event(index, LevelEventKind::Started, 1);
        self.events.push(GameEvent::LevelLoaded {
            level_index: index,
            level_number: config.level_number,
            target_score: config.target_score,
            basket,
            platform,
        });
        if !self.progress.has_shown_tutorial() {
            self.progress.mark_tutorial_shown();
            self.events.push(GameEvent::TutorialRequested);
        }

        self.spawn_attempt();
        log::info!("Loaded level {} (index {})", config.level_number, index);
        Ok(())
    }

    /// Level-select entry point; re-checks the lock at selection time
    pub fn select_level(&mut self, index: usize) -> Result<(), LevelError> {
        levels::get(index)?;
        if !self.progress.is_unlocked(index) {
            log::debug!("Level index {} is locked", index);
            return Err(LevelError::Locked {
                index,
                highest_unlocked: self.progress.highest_unlocked_level_index(),
            });
        }
        self.load_level(index)
    }

    /// Resume at the furthest unlocked level
    pub fn continue_game(&mut self) -> Result<(), LevelError> {
        self.load_level(self.progress.highest_unlocked_level_index())
    }

    /// Back to the menu or level select. Pending resets and transitions die here.
    pub fn leave_level(&mut self) {
        if let Some(session) = &self.session {
            log::info!("Leaving level index {}", session.level_index);
        }
        self.teardown();
    }

    /// Set the cannon angle. While aiming, the ball follows the muzzle.
    pub fn on_aim_input(&mut self, angle: f32) {
        self.aim_angle = angle;
        let muzzle = self.muzzle();
        if let Some(attempt) = self.attempt.as_mut().filter(|a| a.is_aiming()) {
            attempt.aim_angle = angle;
            attempt.ball_position = muzzle;
            if let Some(ball) = attempt.ball {
                self.world.set_position(ball, muzzle);
            }
        }
    }

    /// Aim at a touch point
    pub fn aim_at(&mut self, point: Vec2) {
        let d = point - self.field.launcher_pivot();
        self.on_aim_input(d.y.atan2(d.x));
    }

    /// Launch the ball. Returns false when there is nothing to launch.
    pub fn on_fire_input(&mut self) -> bool {
        if self.session.as_ref().is_none_or(|s| s.completed) {
            log::debug!("Fire ignored: no level in play");
            return false;
        }
        let muzzle = self.muzzle();
        let power = launch_power(self.tuning.base_power, self.field.scale());
        let angle = self.aim_angle;

        let Some(attempt) = self.attempt.as_mut().filter(|a| a.is_aiming()) else {
            log::debug!("Fire ignored: ball already launched");
            return false;
        };
        let Some(ball) = attempt.ball.filter(|b| self.world.position(*b).is_some()) else {
            log::debug!("Fire ignored: no ball in the world");
            return false;
        };

        self.world.set_position(ball, muzzle);
        self.world.set_dynamic(ball, true);
        self.world.apply_impulse(ball, Vec2::from_angle(angle) * power);
        attempt.aim_angle = angle;
        attempt.ball_position = muzzle;
        attempt.launch();
        self.events.push(GameEvent::Sound {
            cue: SoundCue::Fire,
        });
        true
    }

    /// A contact began in the physics world
    pub fn on_contact(&mut self, event: &ContactEvent) {
        let Some(ball_velocity) = event.ball_velocity() else {
            return;
        };
        let phase = match (&self.session, &self.attempt) {
            (Some(session), Some(attempt)) if !session.completed => attempt.phase,
            _ => return,
        };
        if phase == Phase::Aiming {
            return;
        }

        if event.is_between(Category::Ball, Category::Basket) {
            if ball_velocity.y < 0.0 {
                self.score();
            } else {
                log::debug!("Ignored rising basket contact (vy = {})", ball_velocity.y);
            }
        } else if event.is_between(Category::Ball, Category::Platform) {
            self.events.push(GameEvent::Sound {
                cue: SoundCue::Bounce,
            });
        } else if event.is_between(Category::Ball, Category::Wall) {
            let floor = self.field.miss_line(self.tuning.miss_band);
            if phase == Phase::Launched && event.point.y < floor {
                self.miss();
            }
        }
    }

    /// Per-frame update: deferred tasks, platform motion, idle detection
    pub fn on_tick(&mut self, dt: f32) {
        for (session, task) in self.scheduler.advance(dt) {
            self.run_task(session, task);
        }
        self.move_platform(dt);
        self.check_idle();
    }

    fn muzzle(&self) -> Vec2 {
        self.field.muzzle(self.aim_angle, self.tuning.muzzle_offset)
    }

    fn spawn_attempt(&mut self) {
        if let Some(ball) = self.attempt.take().and_then(|a| a.ball) {
            self.world.remove_body(ball);
        }
        let muzzle = self.muzzle();
        let radius = self.tuning.ball_radius * self.field.scale();
        let ball = self.world.spawn_ball(muzzle, radius);
        self.attempt = Some(AttemptState::new(self.aim_angle, Some(ball), muzzle));
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            let cancelled = self.scheduler.cancel_session(session.id);
            if cancelled > 0 {
                log::debug!("Cancelled {} pending task(s)", cancelled);
            }
        }
        if let Some(ball) = self.attempt.take().and_then(|a| a.ball) {
            self.world.remove_body(ball);
        }
        self.platform = None;
    }

    fn score(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let target = session.config.target_score;
        let score = match session.on_score(&mut self.progress, &mut self.analytics) {
            ScoreOutcome::Ignored => return,
            ScoreOutcome::Counted { score } => score,
            ScoreOutcome::Completed {
                score,
                next_level_index,
            } => {
                // Completion supersedes any reset already queued
                self.scheduler.cancel_session(session.id);
                self.scheduler.schedule(
                    session.id,
                    self.tuning.completion_delay,
                    Task::ShowLevelComplete { next_level_index },
                );
                score
            }
        };
        self.events.push(GameEvent::Sound {
            cue: SoundCue::Score,
        });
        self.events.push(GameEvent::ScoreChanged { score, target });
    }

    fn miss(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.on_miss(&mut self.analytics);
        let attempts = session.attempts_this_level;
        self.events.push(GameEvent::AttemptFailed { attempts });
        self.begin_reset();
    }

    /// Move the attempt to Resetting and queue the respawn, at most once
    fn begin_reset(&mut self) -> bool {
        let (Some(session), Some(attempt)) = (self.session.as_ref(), self.attempt.as_mut()) else {
            return false;
        };
        if !attempt.begin_reset() {
            return false;
        }
        self.scheduler
            .schedule(session.id, self.tuning.reset_delay, Task::ResetBall);
        true
    }

    fn run_task(&mut self, session: SessionId, task: Task) {
        if self.session.as_ref().map(|s| s.id) != Some(session) {
            log::debug!("Dropped {:?} for ended session {:?}", task, session);
            return;
        }
        match task {
            Task::ResetBall => {
                self.spawn_attempt();
                self.events.push(GameEvent::BallReset);
            }
            Task::ShowLevelComplete { next_level_index } => {
                let level_index = next_level_index.saturating_sub(1);
                self.events.push(GameEvent::LevelComplete {
                    level_index,
                    next_level_index,
                    is_last_level: levels::is_last(level_index),
                });
                self.teardown();
            }
        }
    }

    fn move_platform(&mut self, dt: f32) {
        let Some(platform) = self.platform.as_mut() else {
            return;
        };
        if platform.advance(dt, &self.field, self.tuning.wall_thickness) {
            self.world.set_position(self.bodies.platform, platform.position);
        }
    }

    fn check_idle(&mut self) {
        if self.session.as_ref().is_none_or(|s| s.completed) {
            return;
        }
        let Some(attempt) = self.attempt.as_mut().filter(|a| a.phase == Phase::Launched) else {
            return;
        };
        let idle = match attempt
            .ball
            .and_then(|b| Some((self.world.position(b)?, self.world.velocity(b)?)))
        {
            Some((position, velocity)) => {
                attempt.sync(position, velocity);
                attempt.is_idle(self.tuning.settle_speed, self.tuning.off_screen_y)
            }
            None => {
                log::warn!("Launched ball missing from the world, resetting");
                true
            }
        };
        if idle {
            self.begin_reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::EventRecorder;
    use crate::consts::SIM_DT;
    use crate::persistence::{KEY_HIGHEST_UNLOCKED, MemoryStore};
    use crate::sim::arena::ArenaWorld;
    use proptest::prelude::*;

    type TestGame = Game<ArenaWorld, MemoryStore, EventRecorder>;

    fn game_with(store: MemoryStore) -> TestGame {
        let field = Playfield::default();
        let tuning = Tuning::default();
        let world = ArenaWorld::new(field, &tuning);
        let bodies = world.bodies();
        Game::new(world, bodies, store, EventRecorder::new(), tuning, field)
    }

    fn game() -> TestGame {
        game_with(MemoryStore::new())
    }

    fn basket_contact(vy: f32) -> ContactEvent {
        ContactEvent::new(
            Category::Ball,
            Category::Basket,
            Vec2::new(330.0, 655.0),
            Vec2::new(40.0, vy),
        )
    }

    fn wall_contact(y: f32) -> ContactEvent {
        ContactEvent::new(
            Category::Ball,
            Category::Wall,
            Vec2::new(200.0, y),
            Vec2::new(0.0, -400.0),
        )
    }

    fn run_ticks(game: &mut TestGame, seconds: f32) {
        let steps = (seconds / SIM_DT).round() as usize;
        for _ in 0..steps {
            game.on_tick(SIM_DT);
        }
    }

    fn kinds(game: &TestGame, kind: LevelEventKind) -> Vec<(usize, u32)> {
        game.analytics()
            .of_kind(kind)
            .iter()
            .map(|e| (e.level_index, e.attempts))
            .collect()
    }

    #[test]
    fn test_load_level_starts_fresh_attempt() {
        let mut g = game();
        g.load_level(0).unwrap();
        let session = g.session().unwrap();
        assert_eq!((session.level_index, session.score, session.attempts_this_level), (0, 0, 1));
        assert_eq!(g.phase(), Some(Phase::Aiming));
        assert_eq!(kinds(&g, LevelEventKind::Started), vec![(0, 1)]);

        let events = g.drain_events();
        assert!(matches!(
            events[0],
            GameEvent::LevelLoaded {
                level_index: 0,
                level_number: 1,
                ..
            }
        ));
        assert!(events.contains(&GameEvent::TutorialRequested));
    }

    #[test]
    fn test_load_level_positions_layout() {
        let mut g = game();
        g.load_level(1).unwrap();
        let field = *g.playfield();
        let basket = g.world().position(g.world().bodies().basket).unwrap();
        let platform = g.world().position(g.world().bodies().platform).unwrap();
        assert_eq!(basket, field.anchor(levels::LEVELS[1].basket_position));
        assert_eq!(platform, field.anchor(levels::LEVELS[1].platform_position));
    }

    #[test]
    fn test_past_last_level_is_no_such_level() {
        let mut g = game();
        let count = levels::count();
        assert_eq!(
            g.load_level(count),
            Err(LevelError::NoSuchLevel { index: count, count })
        );
        assert!(g.attempt().is_none());
        assert!(g.session().is_none());
        assert!(g.analytics().events.is_empty());
    }

    #[test]
    fn test_descending_basket_completes_level_zero() {
        let mut g = game();
        g.load_level(0).unwrap();
        assert!(g.on_fire_input());
        g.on_contact(&basket_contact(-250.0));

        assert_eq!(g.session().unwrap().score, 1);
        assert_eq!(kinds(&g, LevelEventKind::Completed), vec![(0, 1)]);
        assert_eq!(g.progress().highest_unlocked_level_index(), 1);

        g.drain_events();
        run_ticks(&mut g, 0.4);
        assert!(g.drain_events().is_empty());
        run_ticks(&mut g, 0.1);
        assert_eq!(
            g.drain_events(),
            vec![GameEvent::LevelComplete {
                level_index: 0,
                next_level_index: 1,
                is_last_level: false
            }]
        );
        assert!(g.session().is_none());
        assert_eq!(g.world().ball_count(), 0);
    }

    #[test]
    fn test_completion_behind_progress_keeps_unlock_index() {
        let mut store = MemoryStore::new();
        store.set_int(KEY_HIGHEST_UNLOCKED, 4);
        let mut g = game_with(store);
        g.load_level(2).unwrap();
        g.on_fire_input();
        g.on_contact(&basket_contact(-100.0));
        assert_eq!(kinds(&g, LevelEventKind::Completed), vec![(2, 1)]);
        assert_eq!(g.progress().highest_unlocked_level_index(), 4);
    }

    #[test]
    fn test_rising_basket_contact_is_ignored() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        g.drain_events();
        g.on_contact(&basket_contact(300.0));
        g.on_contact(&basket_contact(0.0));
        assert_eq!(g.session().unwrap().score, 0);
        assert!(g.drain_events().is_empty());
        assert!(kinds(&g, LevelEventKind::Completed).is_empty());
    }

    #[test]
    fn test_low_wall_contact_is_a_miss() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        let h = g.playfield().height;
        g.on_contact(&wall_contact(0.02 * h));

        assert_eq!(kinds(&g, LevelEventKind::Failed), vec![(0, 1)]);
        assert_eq!(g.session().unwrap().attempts_this_level, 2);
        assert_eq!(g.phase(), Some(Phase::Resetting));
        assert_eq!(g.scheduler().len(), 1);
        assert!(g.drain_events().contains(&GameEvent::AttemptFailed { attempts: 2 }));

        run_ticks(&mut g, 0.5);
        assert_eq!(g.phase(), Some(Phase::Aiming));
        assert_eq!(g.drain_events(), vec![GameEvent::BallReset]);
        assert_eq!(g.world().ball_count(), 1);
    }

    #[test]
    fn test_high_wall_contact_is_not_a_miss() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        g.on_contact(&wall_contact(400.0));
        assert!(kinds(&g, LevelEventKind::Failed).is_empty());
        assert_eq!(g.phase(), Some(Phase::Launched));
    }

    #[test]
    fn test_contacts_while_aiming_are_ignored() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_contact(&wall_contact(5.0));
        g.on_contact(&basket_contact(-100.0));
        assert_eq!(g.session().unwrap().score, 0);
        assert_eq!(g.session().unwrap().attempts_this_level, 1);
    }

    #[test]
    fn test_double_fire_launches_once() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.drain_events();
        assert!(g.on_fire_input());
        let ball = g.attempt().unwrap().ball.unwrap();
        let v1 = g.world().velocity(ball).unwrap();
        assert!(!g.on_fire_input());
        assert_eq!(g.world().velocity(ball).unwrap(), v1);
        assert_eq!(
            g.drain_events(),
            vec![GameEvent::Sound {
                cue: SoundCue::Fire
            }]
        );
    }

    #[test]
    fn test_launch_impulse_follows_aim() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_aim_input(std::f32::consts::FRAC_PI_4);
        g.on_fire_input();
        let ball = g.attempt().unwrap().ball.unwrap();
        let v = g.world().velocity(ball).unwrap();
        assert!(v.x > 0.0 && (v.x - v.y).abs() < 1e-2);
    }

    #[test]
    fn test_fire_without_ball_is_ignored() {
        let mut g = game();
        g.load_level(0).unwrap();
        let ball = g.attempt().unwrap().ball.unwrap();
        g.world_mut().remove_body(ball);
        assert!(!g.on_fire_input());
        assert_eq!(g.phase(), Some(Phase::Aiming));
    }

    #[test]
    fn test_fire_without_level_is_ignored() {
        let mut g = game();
        assert!(!g.on_fire_input());
        assert!(g.drain_events().is_empty());
    }

    #[test]
    fn test_settle_and_off_screen_same_tick_schedule_one_reset() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        let ball = g.attempt().unwrap().ball.unwrap();
        // Stopped and below the screen at once
        g.world_mut().set_dynamic(ball, false);
        g.world_mut().set_position(ball, Vec2::new(100.0, -500.0));

        g.on_tick(SIM_DT);
        assert_eq!(g.phase(), Some(Phase::Resetting));
        assert_eq!(g.scheduler().len(), 1);

        // A floor hit while the reset is pending changes nothing
        g.on_contact(&wall_contact(5.0));
        g.on_tick(SIM_DT);
        assert_eq!(g.scheduler().len(), 1);
        assert_eq!(g.session().unwrap().attempts_this_level, 1);
    }

    #[test]
    fn test_aim_moves_pinned_ball_only() {
        let mut g = game();
        g.load_level(0).unwrap();
        let ball = g.attempt().unwrap().ball.unwrap();
        let pivot = g.playfield().launcher_pivot();

        g.aim_at(pivot + Vec2::new(0.0, 100.0));
        assert!((g.aim_angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        let p = g.world().position(ball).unwrap();
        assert!((p.x - pivot.x).abs() < 1e-3 && (p.y - (pivot.y + 50.0)).abs() < 1e-3);

        g.on_fire_input();
        g.on_aim_input(0.0);
        assert_eq!(g.world().position(ball).unwrap(), p);
        assert!((g.attempt().unwrap().aim_angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_aim_survives_reset() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_aim_input(1.0);
        g.on_fire_input();
        g.on_contact(&wall_contact(5.0));
        run_ticks(&mut g, 0.5);
        assert_eq!(g.attempt().unwrap().aim_angle, 1.0);
    }

    #[test]
    fn test_leave_level_cancels_pending_reset() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        g.on_contact(&wall_contact(5.0));
        assert_eq!(g.scheduler().len(), 1);

        g.leave_level();
        assert!(g.scheduler().is_empty());
        g.drain_events();
        run_ticks(&mut g, 1.0);
        assert!(g.drain_events().is_empty());
        assert!(g.attempt().is_none());
        assert_eq!(g.world().ball_count(), 0);
    }

    #[test]
    fn test_leave_level_cancels_completion_transition() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        g.on_contact(&basket_contact(-50.0));
        g.leave_level();
        g.drain_events();
        run_ticks(&mut g, 1.0);
        assert!(g.drain_events().is_empty());
    }

    #[test]
    fn test_reload_cancels_previous_session_tasks() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        g.on_contact(&wall_contact(5.0));
        g.load_level(0).unwrap();
        assert!(g.scheduler().is_empty());
        assert_eq!(g.session().unwrap().attempts_this_level, 1);
        assert_eq!(g.world().ball_count(), 1);
    }

    #[test]
    fn test_no_scoring_or_resets_after_completion() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        g.on_contact(&basket_contact(-50.0));
        g.on_contact(&basket_contact(-50.0));
        g.on_contact(&wall_contact(5.0));
        assert_eq!(g.session().unwrap().score, 1);
        assert!(kinds(&g, LevelEventKind::Failed).is_empty());
        assert_eq!(g.scheduler().len(), 1);
    }

    #[test]
    fn test_completion_cancels_queued_reset() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        let ball = g.attempt().unwrap().ball.unwrap();
        g.world_mut().set_dynamic(ball, false);
        g.on_tick(SIM_DT);
        assert_eq!(g.phase(), Some(Phase::Resetting));

        // Ball still drops through the net before the respawn
        g.on_contact(&basket_contact(-30.0));
        g.drain_events();
        run_ticks(&mut g, 0.5);
        let events = g.drain_events();
        assert!(!events.contains(&GameEvent::BallReset));
        assert!(matches!(events[..], [GameEvent::LevelComplete { .. }]));
    }

    #[test]
    fn test_last_level_completion_flags_game_end() {
        let last = levels::count() - 1;
        let mut store = MemoryStore::new();
        store.set_int(KEY_HIGHEST_UNLOCKED, last as i64);
        let mut g = game_with(store);
        g.select_level(last).unwrap();
        g.on_fire_input();
        g.on_contact(&basket_contact(-10.0));
        g.drain_events();
        run_ticks(&mut g, 0.5);
        assert_eq!(
            g.drain_events(),
            vec![GameEvent::LevelComplete {
                level_index: last,
                next_level_index: last + 1,
                is_last_level: true
            }]
        );
        assert_eq!(g.progress().highest_unlocked_level_index(), levels::count());
        assert!(matches!(g.continue_game(), Err(LevelError::NoSuchLevel { .. })));
    }

    #[test]
    fn test_select_level_rechecks_lock() {
        let mut g = game();
        assert_eq!(
            g.select_level(3),
            Err(LevelError::Locked {
                index: 3,
                highest_unlocked: 0
            })
        );
        assert!(g.session().is_none());
        g.progress_mut().unlock_next_level(2);
        assert!(g.select_level(3).is_ok());
        assert!(matches!(g.select_level(99), Err(LevelError::NoSuchLevel { .. })));
        assert_eq!(g.session().unwrap().level_index, 3);
    }

    #[test]
    fn test_level_select_tiles() {
        let mut g = game();
        g.progress_mut().unlock_next_level(0);
        let tiles = g.level_select();
        assert!(tiles[1].unlocked);
        assert!(!tiles[2].unlocked);
    }

    #[test]
    fn test_tutorial_requested_once() {
        let mut g = game();
        g.load_level(0).unwrap();
        assert!(g.drain_events().contains(&GameEvent::TutorialRequested));
        g.load_level(0).unwrap();
        assert!(!g.drain_events().contains(&GameEvent::TutorialRequested));
        assert!(g.progress().has_shown_tutorial());
    }

    #[test]
    fn test_moving_platform_updates_world() {
        let mut g = game();
        g.progress_mut().unlock_next_level(2);
        g.select_level(3).unwrap();
        let start = g.platform().unwrap().position;
        run_ticks(&mut g, 0.5);
        let moved = g.platform().unwrap().position;
        assert!(moved.x > start.x);
        assert_eq!(moved.y, start.y);
        let body = g.world().bodies().platform;
        assert_eq!(g.world().position(body), Some(moved));
    }

    #[test]
    fn test_platform_contact_only_plays_sound() {
        let mut g = game();
        g.load_level(0).unwrap();
        g.on_fire_input();
        g.drain_events();
        g.on_contact(&ContactEvent::new(
            Category::Platform,
            Category::Ball,
            Vec2::new(195.0, 440.0),
            Vec2::new(0.0, 300.0),
        ));
        assert_eq!(
            g.drain_events(),
            vec![GameEvent::Sound {
                cue: SoundCue::Bounce
            }]
        );
        assert_eq!(g.phase(), Some(Phase::Launched));
    }

    #[test]
    fn test_events_serialize_for_hosts() {
        let json = serde_json::to_value(GameEvent::ScoreChanged { score: 1, target: 2 }).unwrap();
        assert_eq!(json["type"], "score_changed");
        let json = serde_json::to_value(GameEvent::Sound {
            cue: SoundCue::Bounce,
        })
        .unwrap();
        assert_eq!(json["cue"], "bounce");
    }

    proptest! {
        #[test]
        fn prop_only_descending_contacts_score(vy in -2000.0f32..2000.0) {
            let mut g = game();
            g.load_level(0).unwrap();
            g.on_fire_input();
            g.on_contact(&basket_contact(vy));
            let expected = if vy < 0.0 { 1 } else { 0 };
            prop_assert_eq!(g.session().unwrap().score, expected);
        }

        #[test]
        fn prop_each_miss_counts_one_attempt(misses in 0u32..12) {
            let mut g = game();
            g.load_level(1).unwrap();
            for _ in 0..misses {
                prop_assert!(g.on_fire_input());
                g.on_contact(&wall_contact(1.0));
                run_ticks(&mut g, 0.5);
            }
            prop_assert_eq!(g.session().unwrap().attempts_this_level, misses + 1);
            let reported: Vec<u32> = kinds(&g, LevelEventKind::Failed)
                .iter()
                .map(|e| e.1)
                .collect();
            prop_assert_eq!(reported, (1..=misses).collect::<Vec<_>>());
        }
    }
}
