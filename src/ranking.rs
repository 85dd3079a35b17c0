//! Ranking service client
//!
//! Talks to the external service that stores best completion times per
//! difficulty. JSON over HTTP; wire fields are `username`, `time` and
//! `difficulty`. The service owns ordering and rank assignment, this side
//! only submits and displays.

use serde::{Deserialize, Serialize};

use crate::sim::Difficulty;

/// One row of a difficulty's leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based position
    pub rank: u32,
    pub username: String,
    /// Completion time in seconds
    pub time: f32,
}

/// Completion record posted once per finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub username: String,
    pub time: f32,
    pub difficulty: String,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct RankingsResponse {
    rankings: Vec<RankingEntry>,
}

/// Decode a rankings response body. Malformed input degrades to
/// "no records" rather than an error. (Exercised by fetch only in wasm32.)
#[allow(dead_code)]
fn parse_rankings(body: &str) -> Vec<RankingEntry> {
    match serde_json::from_str::<RankingsResponse>(body) {
        Ok(resp) => resp.rankings,
        Err(e) => {
            log::warn!("Malformed rankings response: {}", e);
            Vec::new()
        }
    }
}

/// Post a completion record (WASM only). Failure is the caller's to log;
/// the session stays complete either way and nothing retries.
#[cfg(target_arch = "wasm32")]
pub async fn submit_time(record: &SubmitRequest) -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Headers, Request, RequestInit, Response};

    use crate::consts::API_BASE_URL;

    let body = serde_json::to_string(record).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_headers(&headers);
    opts.set_body(&JsValue::from_str(&body));

    let url = format!("{}/save-time", API_BASE_URL);
    let request = Request::new_with_str_and_init(&url, &opts)?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!(
            "save-time returned HTTP {}",
            resp.status()
        )));
    }

    log::info!(
        "Recorded {:.1}s for {} ({})",
        record.time,
        record.username,
        record.difficulty
    );
    Ok(())
}

/// Fetch the leaderboard for a difficulty (WASM only). Any failure
/// degrades to an empty list, never a player-visible error.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_rankings(difficulty: Difficulty) -> Vec<RankingEntry> {
    match try_fetch_rankings(difficulty).await {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Rankings query failed: {:?}", e);
            Vec::new()
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn try_fetch_rankings(
    difficulty: Difficulty,
) -> Result<Vec<RankingEntry>, wasm_bindgen::JsValue> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::Response;

    use crate::consts::API_BASE_URL;

    let url = format!(
        "{}/rankings?difficulty={}",
        API_BASE_URL,
        difficulty.as_str()
    );
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let resp: Response = JsFuture::from(window.fetch_with_str(&url))
        .await?
        .dyn_into()?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!(
            "rankings returned HTTP {}",
            resp.status()
        )));
    }

    let text = JsFuture::from(resp.text()?).await?;
    Ok(parse_rankings(&text.as_string().unwrap_or_default()))
}

/// Native stubs: the ranking service is only reachable from the browser
/// build; headless runs log and degrade.
#[cfg(not(target_arch = "wasm32"))]
pub fn submit_time(record: &SubmitRequest) -> Result<(), String> {
    log::info!(
        "(native) would record {:.1}s for {} ({})",
        record.time,
        record.username,
        record.difficulty
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_rankings(_difficulty: Difficulty) -> Vec<RankingEntry> {
    Vec::new()
}
