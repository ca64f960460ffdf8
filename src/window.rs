//! Windowed telemetry aggregation
//!
//! Restricts each telemetry event table to a per-player trailing window
//! ending at that player's survey timestamp, then folds to one summary value
//! per player and source. The survey defines the population of interest:
//! telemetry for players with no survey row is discarded.

use crate::stats::sum_ignoring_missing;
use crate::types::{PlaySession, SurveyResponse, TelemetryBundle, WindowedSummary};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Default trailing window: the survey's 14-day recall period
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// Per-player trailing-window aggregator
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    window: Duration,
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl WindowAggregator {
    pub fn new(window_days: i64) -> Self {
        Self {
            window: Duration::days(window_days),
        }
    }

    /// Window predicate: `T - window <= t < T`.
    ///
    /// The upper bound is strictly exclusive; an event at or after the survey
    /// moment could not have been recalled by the respondent.
    pub fn in_window(&self, survey_at: DateTime<Utc>, t: DateTime<Utc>) -> bool {
        t >= survey_at - self.window && t < survey_at
    }

    /// Aggregate telemetry into one [`WindowedSummary`] per survey respondent.
    ///
    /// `sessions` are the reconciled play sessions; the fragment table inside
    /// `bundle` is not consulted here. The result covers every respondent in
    /// `survey` (left join), with an all-missing summary for respondents who
    /// had no qualifying event for any source.
    pub fn aggregate(
        &self,
        survey: &[SurveyResponse],
        sessions: &[PlaySession],
        bundle: &TelemetryBundle,
    ) -> BTreeMap<String, WindowedSummary> {
        let mut summaries: BTreeMap<String, WindowedSummary> = BTreeMap::new();

        for respondent in survey {
            let t = respondent.submitted_at;
            let player = respondent.player_id.as_str();

            let mut summary = WindowedSummary::default();

            // Session durations: both endpoints must fall inside the window,
            // otherwise the session is excluded wholesale (never truncated).
            let qualifying: Vec<&PlaySession> = sessions
                .iter()
                .filter(|s| {
                    s.player_id == player
                        && self.in_window(t, s.start)
                        && self.in_window(t, s.end)
                })
                .collect();
            if !qualifying.is_empty() {
                summary.session_count = Some(qualifying.len() as u32);
                let durations: Vec<Option<f64>> =
                    qualifying.iter().map(|s| s.duration_hours()).collect();
                summary.total_hours = sum_ignoring_missing(&durations);
            }

            summary.logins = self.count_events(player, t, &bundle.authentications);
            summary.level_ups = self.count_events(player, t, &bundle.level_ups);
            summary.prestige_events = self.count_events(player, t, &bundle.prestige_changes);
            summary.gestures = self.count_events(player, t, &bundle.gestures);
            summary.friend_count = self.count_friends(player, t, bundle);

            let grants: Vec<Option<f64>> = bundle
                .experience
                .iter()
                .filter(|e| e.player_id == player && self.in_window(t, e.at))
                .map(|e| e.amount)
                .collect();
            if !grants.is_empty() {
                summary.xp_total = sum_ignoring_missing(&grants);
            }

            summaries.insert(respondent.player_id.clone(), summary);
        }

        debug!(
            respondents = survey.len(),
            with_telemetry = summaries.values().filter(|s| !s.is_empty()).count(),
            "aggregated windowed telemetry"
        );

        summaries
    }

    /// Count a player's events inside the window; zero events reads as
    /// missing, never as a measured zero.
    fn count_events(
        &self,
        player: &str,
        survey_at: DateTime<Utc>,
        events: &[crate::types::PlayerEvent],
    ) -> Option<u32> {
        let count = events
            .iter()
            .filter(|e| e.player_id == player && self.in_window(survey_at, e.at))
            .count();
        if count == 0 {
            None
        } else {
            Some(count as u32)
        }
    }

    /// Friend count: distinct friends the player added plus distinct others
    /// who added the player. A direction with no events contributes 0 before
    /// the sum; only a player with no friend event in either direction gets a
    /// missing count.
    fn count_friends(
        &self,
        player: &str,
        survey_at: DateTime<Utc>,
        bundle: &TelemetryBundle,
    ) -> Option<u32> {
        let sent: BTreeSet<&str> = bundle
            .friends
            .iter()
            .filter(|e| e.player_id == player && self.in_window(survey_at, e.at))
            .map(|e| e.friend_id.as_str())
            .collect();
        let received: BTreeSet<&str> = bundle
            .friends
            .iter()
            .filter(|e| e.friend_id == player && self.in_window(survey_at, e.at))
            .map(|e| e.player_id.as_str())
            .collect();

        if sent.is_empty() && received.is_empty() {
            return None;
        }
        Some((sent.len() + received.len()) as u32)
    }
}
