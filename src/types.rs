//! Core types for the Wellplay pipeline
//!
//! This module defines the records that flow through each stage of the
//! pipeline: raw survey responses, telemetry session fragments and events,
//! reconciled sessions, windowed summaries, and the final per-player row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Game platform identifier for provenance tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Nintendo,
    Ea,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Nintendo => "nintendo",
            Platform::Ea => "ea",
        }
    }
}

/// One consented survey respondent, after column harmonization.
///
/// Item blocks hold per-item responses in instrument order; a `None` item is
/// a skipped question. Scale scoring and straightliner detection both work
/// from these blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponse {
    /// Platform-scoped player identifier
    pub player_id: String,
    /// Source platform of this survey wave
    pub platform: Platform,
    /// Survey submission time (UTC); anchors the telemetry window
    pub submitted_at: DateTime<Utc>,
    /// SPANE positive affect items (1-5)
    pub spane_positive: Vec<Option<f64>>,
    /// SPANE negative affect items (1-5)
    pub spane_negative: Vec<Option<f64>>,
    /// Intrinsic motivation items (1-7)
    pub motivation_intrinsic: Vec<Option<f64>>,
    /// Extrinsic motivation items (1-7, some reverse-coded at scoring time)
    pub motivation_extrinsic: Vec<Option<f64>>,
    /// Self-reported play time over the recall window (hours)
    pub self_reported_hours: Option<f64>,
}

impl SurveyResponse {
    /// All affect items as one block, for straightliner detection
    pub fn affect_block(&self) -> Vec<Option<f64>> {
        self.spane_positive
            .iter()
            .chain(self.spane_negative.iter())
            .copied()
            .collect()
    }

    /// All motivation items as one block, for straightliner detection
    pub fn motivation_block(&self) -> Vec<Option<f64>> {
        self.motivation_intrinsic
            .iter()
            .chain(self.motivation_extrinsic.iter())
            .copied()
            .collect()
    }
}

/// Derived psychometric composite scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleScores {
    /// Mean of SPANE positive items (missing items ignored)
    pub spane_positive: Option<f64>,
    /// Mean of SPANE negative items (missing items ignored)
    pub spane_negative: Option<f64>,
    /// SPANE balance: positive mean - negative mean
    pub spane_balance: Option<f64>,
    /// Mean of intrinsic motivation items
    pub intrinsic: Option<f64>,
    /// Mean of extrinsic motivation items (after reverse-coding)
    pub extrinsic: Option<f64>,
}

/// One raw telemetry session row as emitted by the game platform.
///
/// The platform logs one row per heartbeat/checkpoint within a session, so
/// several fragments may describe the same logical session. `session_id` is
/// only meaningful within a single player; it can collide across players in
/// multiplayer sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFragment {
    pub player_id: String,
    pub session_id: String,
    /// Session start; possibly missing or noisy
    pub start: Option<DateTime<Utc>>,
    /// Session end; always present in the exports
    pub end: DateTime<Utc>,
    /// Descriptive attributes (game mode, level, platform build, ...)
    pub attrs: HashMap<String, String>,
}

/// One reconciled logical play session: exactly one row per
/// (player_id, session_id) after the Session Reconciler has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySession {
    pub player_id: String,
    pub session_id: String,
    /// Minimum observed start across fragments. May equal `end` when the
    /// only fragment had no start and its end was substituted.
    pub start: DateTime<Utc>,
    /// Maximum observed end across fragments
    pub end: DateTime<Utc>,
    /// Attributes of a representative fragment; not authoritative when the
    /// group had more than one fragment with differing values
    pub attrs: HashMap<String, String>,
}

impl PlaySession {
    /// Session duration in hours, or `None` for a zero-length span.
    ///
    /// A zero-length span is the signature of a substituted start timestamp
    /// and must read as missing data, not a zero-length session.
    pub fn duration_hours(&self) -> Option<f64> {
        let secs = (self.end - self.start).num_seconds();
        if secs <= 0 {
            return None;
        }
        Some(secs as f64 / 3600.0)
    }
}

/// A timestamped event attributed to one player (authentication, level-up,
/// prestige change, gesture)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEvent {
    pub player_id: String,
    pub at: DateTime<Utc>,
}

/// A directed friend connection: `player_id` added `friend_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendEvent {
    pub player_id: String,
    pub friend_id: String,
    pub at: DateTime<Utc>,
}

/// An experience-point grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpEvent {
    pub player_id: String,
    pub at: DateTime<Utc>,
    /// Granted amount; malformed values propagate as missing
    pub amount: Option<f64>,
}

/// All telemetry exports for one platform/wave.
///
/// A platform that does not export a category simply leaves its table empty;
/// every player then receives a missing aggregate for that source.
#[derive(Debug, Clone, Default)]
pub struct TelemetryBundle {
    pub sessions: Vec<SessionFragment>,
    pub authentications: Vec<PlayerEvent>,
    pub friends: Vec<FriendEvent>,
    pub level_ups: Vec<PlayerEvent>,
    pub prestige_changes: Vec<PlayerEvent>,
    pub gestures: Vec<PlayerEvent>,
    pub experience: Vec<XpEvent>,
}

/// Per-player telemetry summary over the 14-day pre-survey window.
///
/// Every field distinguishes "no telemetry available" (`None`) from
/// "measured zero activity" (`Some(0)`); downstream reporting relies on that
/// distinction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowedSummary {
    /// Total hours played across sessions fully inside the window
    pub total_hours: Option<f64>,
    /// Count of sessions fully inside the window
    pub session_count: Option<u32>,
    /// Count of authentications in the window
    pub logins: Option<u32>,
    /// Distinct friends added + distinct others who added the player
    pub friend_count: Option<u32>,
    /// Count of level-up events in the window
    pub level_ups: Option<u32>,
    /// Count of prestige changes in the window
    pub prestige_events: Option<u32>,
    /// Count of gesture events in the window
    pub gestures: Option<u32>,
    /// Sum of experience points granted in the window
    pub xp_total: Option<f64>,
}

impl WindowedSummary {
    /// True when no source produced a qualifying event
    pub fn is_empty(&self) -> bool {
        self.total_hours.is_none()
            && self.session_count.is_none()
            && self.logins.is_none()
            && self.friend_count.is_none()
            && self.level_ups.is_none()
            && self.prestige_events.is_none()
            && self.gestures.is_none()
            && self.xp_total.is_none()
    }
}

/// Final per-player analysis row: survey, derived scores, quality flags, and
/// windowed telemetry. This is the snapshot schema contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRow {
    pub player_id: String,
    pub platform: Platform,
    pub submitted_at: DateTime<Utc>,
    pub self_reported_hours: Option<f64>,
    pub scores: ScaleScores,
    /// Straightliner flag for the affect block; `None` = too few items
    pub straightliner_affect: Option<bool>,
    /// Straightliner flag for the motivation block; `None` = too few items
    pub straightliner_motivation: Option<bool>,
    /// Windowed telemetry; all-missing when the player had no qualifying
    /// events for any source
    pub summary: WindowedSummary,
}
