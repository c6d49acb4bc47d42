//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (analytics session timestamps)
//! - Storage (LocalStorage on web, JSON file on native)
//! - Analytics transport (fetch on web, log on native)
//! - The JS-facing game handle

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Seconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_seconds() -> f64 {
    js_sys::Date::now() / 1000.0
}

/// Seconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// RFC 3339 UTC timestamp for `seconds` since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn iso_timestamp(seconds: f64) -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(seconds * 1000.0));
    date.to_iso_string().into()
}

/// RFC 3339 UTC timestamp for `seconds` since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn iso_timestamp(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round() as i64;
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
