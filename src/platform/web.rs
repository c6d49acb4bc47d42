//! Browser bindings: LocalStorage, fetch beacon and the JS game handle

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::analytics::{
    Analytics, AnalyticsConfig, Beacon, BeaconError, BeaconRequest, DeviceInfo,
    fallback_player_id,
};
use crate::levels::LevelError;
use crate::persistence::KeyValueStore;
use crate::sim::{ArenaWorld, FrameClock, Game, PhysicsWorld, Playfield, TickInput};
use crate::tuning::Tuning;

use super::now_seconds;

/// Key under which the fallback player id is kept
const KEY_PLAYER_ID: &str = "playerId";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}

/// Preferences in browser LocalStorage, stored as strings
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&self, key: &str, value: &str) {
        match local_storage() {
            Some(storage) => {
                if storage.set_item(key, value).is_err() {
                    log::warn!("LocalStorage rejected write of {}", key);
                }
            }
            None => log::warn!("LocalStorage unavailable, {} not saved", key),
        }
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, &value.to_string());
    }

    fn get_bool(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v == "true")
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }
}

/// Fire-and-forget `fetch` transport
#[derive(Debug, Clone)]
pub struct FetchBeacon {
    config: AnalyticsConfig,
}

impl FetchBeacon {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    fn build(&self, request: &BeaconRequest) -> Result<Request, JsValue> {
        let opts = RequestInit::new();
        opts.set_method(request.method.as_str());
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&JsValue::from_str(&request.body.to_string()));

        let req = Request::new_with_str_and_init(&self.config.url(&request.endpoint), &opts)?;
        for (name, value) in self.config.headers() {
            req.headers().set(name, &value)?;
        }
        Ok(req)
    }
}

impl Beacon for FetchBeacon {
    fn send(&mut self, request: BeaconRequest) -> Result<(), BeaconError> {
        if self.config.base_url.is_empty() {
            return Err(BeaconError::Unavailable);
        }
        let window = web_sys::window().ok_or(BeaconError::Unavailable)?;
        let req = self
            .build(&request)
            .map_err(|e| BeaconError::Transport(format!("{:?}", e)))?;

        let promise = window.fetch_with_request(&req);
        wasm_bindgen_futures::spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(value) => {
                    if let Ok(response) = value.dyn_into::<Response>() {
                        if !response.ok() {
                            log::warn!("Analytics request failed: HTTP {}", response.status());
                        }
                    }
                }
                Err(e) => log::warn!("Analytics request failed: {:?}", e),
            }
        });
        Ok(())
    }
}

fn player_id(store: &LocalStorageStore) -> String {
    if let Some(id) = store.get(KEY_PLAYER_ID) {
        return id;
    }
    let id = fallback_player_id();
    store.set(KEY_PLAYER_ID, &id);
    id
}

fn level_error(e: LevelError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Game handle driven by the JS host's frame loop and input events
#[wasm_bindgen]
pub struct WebGame {
    game: Game<ArenaWorld, LocalStorageStore, Analytics<FetchBeacon>>,
    clock: FrameClock,
    input: TickInput,
}

#[wasm_bindgen]
impl WebGame {
    /// `config_json` holds `AnalyticsConfig`, `tuning_json` a partial `Tuning`
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: f32,
        height: f32,
        config_json: Option<String>,
        tuning_json: Option<String>,
    ) -> WebGame {
        let tuning = tuning_json
            .and_then(|json| match Tuning::from_json(&json) {
                Ok(t) => Some(t),
                Err(e) => {
                    log::warn!("Invalid tuning, using defaults: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        let config = config_json
            .and_then(|json| match serde_json::from_str::<AnalyticsConfig>(&json) {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("Invalid analytics config, analytics disabled: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        let field = Playfield::new(width, height);
        let world = ArenaWorld::new(field, &tuning);
        let bodies = world.bodies();
        let store = LocalStorageStore;
        let analytics = Analytics::new(
            FetchBeacon::new(config),
            player_id(&store),
            DeviceInfo::default(),
        );
        log::info!("Bounce Basket ready ({}x{})", width, height);

        WebGame {
            game: Game::new(world, bodies, store, analytics, tuning, field),
            clock: FrameClock::new(),
            input: TickInput::default(),
        }
    }

    pub fn start_session(&mut self) -> String {
        self.game.analytics_mut().start_session(now_seconds())
    }

    pub fn end_session(&mut self) {
        self.game.analytics_mut().end_session(now_seconds());
    }

    pub fn set_player_id(&mut self, id: String) {
        self.game.analytics_mut().update_player_id(id);
    }

    /// False once past the last level (show the game-completed screen)
    pub fn load_level(&mut self, index: usize) -> bool {
        self.clock.reset();
        self.game.load_level(index).is_ok()
    }

    pub fn select_level(&mut self, index: usize) -> Result<(), JsValue> {
        self.clock.reset();
        self.game.select_level(index).map_err(level_error)
    }

    pub fn continue_game(&mut self) -> bool {
        self.clock.reset();
        self.game.continue_game().is_ok()
    }

    pub fn leave_level(&mut self) {
        self.game.leave_level();
    }

    pub fn aim_at(&mut self, x: f32, y: f32) {
        self.input.aim_at = Some(glam::Vec2::new(x, y));
    }

    pub fn fire(&mut self) {
        self.input.fire = true;
    }

    /// Advance by a frame's worth of time; returns fixed steps taken
    pub fn frame(&mut self, dt: f32) -> u32 {
        self.clock.advance(&mut self.game, &mut self.input, dt)
    }

    /// `[x, y]`, or empty when no ball is in play
    pub fn ball_position(&self) -> Vec<f32> {
        self.game
            .attempt()
            .and_then(|a| a.ball)
            .and_then(|b| self.game.world().position(b))
            .map(|p| vec![p.x, p.y])
            .unwrap_or_default()
    }

    pub fn aim_angle(&self) -> f32 {
        self.game.aim_angle()
    }

    pub fn platform_x(&self) -> f32 {
        self.game.platform().map(|p| p.position.x).unwrap_or(0.0)
    }

    /// Events since the last call, as a JSON array
    pub fn events_json(&mut self) -> String {
        let events = self.game.drain_events();
        serde_json::to_string(&events).unwrap_or_else(|e| {
            log::warn!("Failed to encode events: {}", e);
            "[]".to_string()
        })
    }

    pub fn level_select_json(&self) -> String {
        serde_json::to_string(&self.game.level_select()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn highest_unlocked(&self) -> usize {
        self.game.progress().highest_unlocked_level_index()
    }

    pub fn reset_progress(&mut self) {
        self.game.progress_mut().reset_progress();
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Bounce Basket starting...");
}
