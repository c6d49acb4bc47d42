//! Session and level event tracking
//!
//! Fire-and-forget: requests go out through a [`Beacon`], failures are logged and
//! dropped, nothing is retried and nothing flows back into game state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::platform::iso_timestamp;

/// Level lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelEventKind {
    Started,
    Completed,
    Failed,
}

impl LevelEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelEventKind::Started => "started",
            LevelEventKind::Completed => "completed",
            LevelEventKind::Failed => "failed",
        }
    }
}

/// A level event as seen by the game core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEvent {
    pub level_index: usize,
    pub kind: LevelEventKind,
    pub attempts: u32,
}

/// Where the game core reports level events
pub trait AnalyticsSink {
    fn record_level_event(&mut self, level_index: usize, kind: LevelEventKind, attempts: u32);
}

/// Keeps every event in memory (tests, replays, offline builds)
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    pub events: Vec<LevelEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events of one kind, oldest first
    pub fn of_kind(&self, kind: LevelEventKind) -> Vec<LevelEvent> {
        self.events.iter().filter(|e| e.kind == kind).copied().collect()
    }
}

impl AnalyticsSink for EventRecorder {
    fn record_level_event(&mut self, level_index: usize, kind: LevelEventKind, attempts: u32) {
        self.events.push(LevelEvent {
            level_index,
            kind,
            attempts,
        });
    }
}

/// Remote resource a request targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Sessions,
    /// One session row, for updates
    Session(String),
    LevelEvents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

/// One outgoing analytics request
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconRequest {
    pub method: Method,
    pub endpoint: Endpoint,
    pub body: serde_json::Value,
}

/// REST backend location and credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub base_url: String,
    pub api_key: String,
}

impl AnalyticsConfig {
    pub fn url(&self, endpoint: &Endpoint) -> String {
        let base = self.base_url.trim_end_matches('/');
        match endpoint {
            Endpoint::Sessions => format!("{}/rest/v1/sessions", base),
            Endpoint::Session(id) => format!("{}/rest/v1/sessions?id=eq.{}", base, id),
            Endpoint::LevelEvents => format!("{}/rest/v1/level_events", base),
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", self.api_key.clone()),
            ("Authorization", format!("Bearer {}", self.api_key)),
            ("Content-Type", "application/json".to_string()),
            ("Prefer", "return=representation".to_string()),
        ]
    }
}

/// Transport failure. Logged, never surfaced to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeaconError {
    /// No transport available (no window, no network)
    Unavailable,
    /// Request could not be built or sent
    Transport(String),
}

impl fmt::Display for BeaconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeaconError::Unavailable => write!(f, "analytics transport unavailable"),
            BeaconError::Transport(msg) => write!(f, "analytics transport failed: {}", msg),
        }
    }
}

impl std::error::Error for BeaconError {}

/// Sends requests without waiting for a response
pub trait Beacon {
    fn send(&mut self, request: BeaconRequest) -> Result<(), BeaconError>;
}

/// Writes requests to the log instead of the network
#[derive(Debug, Clone, Default)]
pub struct LogBeacon;

impl Beacon for LogBeacon {
    fn send(&mut self, request: BeaconRequest) -> Result<(), BeaconError> {
        log::info!(
            "analytics {} {:?}: {}",
            request.method.as_str(),
            request.endpoint,
            request.body
        );
        Ok(())
    }
}

/// Device details sent with each session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_model: String,
    pub os_version: String,
    pub app_version: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device_model: std::env::consts::ARCH.to_string(),
            os_version: std::env::consts::OS.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: String,
    started_at: f64,
}

/// Analytics service: tracks the session and tags every event with the player
#[derive(Debug)]
pub struct Analytics<B> {
    beacon: B,
    player_id: String,
    device: DeviceInfo,
    session: Option<ActiveSession>,
}

impl<B: Beacon> Analytics<B> {
    pub fn new(beacon: B, player_id: impl Into<String>, device: DeviceInfo) -> Self {
        Self {
            beacon,
            player_id: player_id.into(),
            device,
            session: None,
        }
    }

    pub fn beacon(&self) -> &B {
        &self.beacon
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Swap in the real identity once the platform login finishes
    pub fn update_player_id(&mut self, player_id: impl Into<String>) {
        self.player_id = player_id.into();
        log::info!("Analytics player id updated to {}", self.player_id);
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    /// Open a session at `now` (seconds) and return its id
    pub fn start_session(&mut self, now: f64) -> String {
        if let Some(old) = &self.session {
            log::warn!("Starting a new session while {} is still open", old.id);
        }
        let id = new_session_id();
        let body = json!({
            "id": id,
            "player_id": self.player_id,
            "device_model": self.device.device_model,
            "os_version": self.device.os_version,
            "app_version": self.device.app_version,
        });
        self.dispatch(BeaconRequest {
            method: Method::Post,
            endpoint: Endpoint::Sessions,
            body,
        });
        log::info!("Analytics session started: {}", id);
        self.session = Some(ActiveSession {
            id: id.clone(),
            started_at: now,
        });
        id
    }

    /// Close the open session at `now` (seconds). Returns the duration sent.
    pub fn end_session(&mut self, now: f64) -> Option<u64> {
        let Some(session) = self.session.take() else {
            log::info!("No active analytics session to end");
            return None;
        };
        let duration = (now - session.started_at).max(0.0) as u64;
        let body = json!({
            "ended_at": iso_timestamp(now),
            "duration_seconds": duration,
        });
        self.dispatch(BeaconRequest {
            method: Method::Patch,
            endpoint: Endpoint::Session(session.id),
            body,
        });
        log::info!("Analytics session ended ({}s)", duration);
        Some(duration)
    }

    fn dispatch(&mut self, request: BeaconRequest) {
        if let Err(e) = self.beacon.send(request) {
            log::warn!("Dropped analytics request: {}", e);
        }
    }
}

impl<B: Beacon> AnalyticsSink for Analytics<B> {
    fn record_level_event(&mut self, level_index: usize, kind: LevelEventKind, attempts: u32) {
        let mut body = json!({
            "player_id": self.player_id,
            "level_index": level_index,
            "event_type": kind,
            "attempts": attempts,
        });
        if let (Some(session), Some(map)) = (&self.session, body.as_object_mut()) {
            map.insert("session_id".to_string(), json!(session.id));
        }
        self.dispatch(BeaconRequest {
            method: Method::Post,
            endpoint: Endpoint::LevelEvents,
            body,
        });
        log::debug!("Tracked {} for level {}", kind.as_str(), level_index);
    }
}

/// Device-scoped id for players without a platform login
pub fn fallback_player_id() -> String {
    format!("device_{}", Uuid::new_v4())
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryBeacon {
        sent: Vec<BeaconRequest>,
    }

    impl Beacon for MemoryBeacon {
        fn send(&mut self, request: BeaconRequest) -> Result<(), BeaconError> {
            self.sent.push(request);
            Ok(())
        }
    }

    struct FailingBeacon {
        attempts: u32,
    }

    impl Beacon for FailingBeacon {
        fn send(&mut self, _request: BeaconRequest) -> Result<(), BeaconError> {
            self.attempts += 1;
            Err(BeaconError::Transport("offline".into()))
        }
    }

    fn analytics() -> Analytics<MemoryBeacon> {
        Analytics::new(MemoryBeacon::default(), "player-1", DeviceInfo::default())
    }

    #[test]
    fn test_level_event_payload() {
        let mut a = analytics();
        a.record_level_event(3, LevelEventKind::Failed, 2);
        let req = &a.beacon().sent[0];
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.endpoint, Endpoint::LevelEvents);
        assert_eq!(req.body["player_id"], "player-1");
        assert_eq!(req.body["level_index"], 3);
        assert_eq!(req.body["event_type"], "failed");
        assert_eq!(req.body["attempts"], 2);
        assert!(req.body.get("session_id").is_none());
    }

    #[test]
    fn test_session_id_attached_while_open() {
        let mut a = analytics();
        let id = a.start_session(100.0);
        a.record_level_event(0, LevelEventKind::Started, 1);
        assert_eq!(a.beacon().sent[1].body["session_id"], id.as_str());

        assert_eq!(a.end_session(142.5), Some(42));
        let end = &a.beacon().sent[2];
        assert_eq!(end.method, Method::Patch);
        assert_eq!(end.endpoint, Endpoint::Session(id));
        assert_eq!(end.body["duration_seconds"], 42);

        a.record_level_event(0, LevelEventKind::Completed, 1);
        assert!(a.beacon().sent[3].body.get("session_id").is_none());
    }

    #[test]
    fn test_end_without_session_sends_nothing() {
        let mut a = analytics();
        assert_eq!(a.end_session(10.0), None);
        assert!(a.beacon().sent.is_empty());
    }

    #[test]
    fn test_transport_failure_is_swallowed_and_not_retried() {
        let mut a = Analytics::new(FailingBeacon { attempts: 0 }, "p", DeviceInfo::default());
        a.start_session(0.0);
        a.record_level_event(1, LevelEventKind::Completed, 4);
        assert_eq!(a.beacon().attempts, 2);
        assert!(a.session_id().is_some());
    }

    #[test]
    fn test_player_id_update_applies_to_later_events() {
        let mut a = analytics();
        a.update_player_id("gc-123");
        a.record_level_event(0, LevelEventKind::Started, 1);
        assert_eq!(a.beacon().sent[0].body["player_id"], "gc-123");
    }

    #[test]
    fn test_urls() {
        let config = AnalyticsConfig {
            base_url: "https://example.test/".into(),
            api_key: "k".into(),
        };
        assert_eq!(config.url(&Endpoint::LevelEvents), "https://example.test/rest/v1/level_events");
        assert_eq!(
            config.url(&Endpoint::Session("abc".into())),
            "https://example.test/rest/v1/sessions?id=eq.abc"
        );
        assert!(config.headers().iter().any(|(k, v)| *k == "Authorization" && v == "Bearer k"));
    }

    #[test]
    fn test_generated_ids_are_uuid_v4() {
        assert!(fallback_player_id().starts_with("device_"));
        for _ in 0..64 {
            let id = new_session_id();
            let parsed = Uuid::parse_str(&id).unwrap();
            assert_eq!(parsed.get_version_num(), 4, "{}", id);
            assert_eq!(id.as_bytes()[14], b'4');
        }
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn test_session_end_timestamp_is_rfc3339() {
        let mut a = analytics();
        a.start_session(1_700_000_000.0);
        assert_eq!(a.end_session(1_700_000_042.0), Some(42));
        let ended_at = &a.beacon().sent[1].body["ended_at"];
        assert_eq!(ended_at.as_str(), Some("2023-11-14T22:14:02.000Z"));
    }
}
