//! Pipeline orchestration
//!
//! Runs one platform/wave end to end: dedup survey → score scales →
//! reconcile sessions → windowed aggregation → merge → quality flags →
//! exclusions, and optionally persists the three snapshot stages.

use crate::persist::{write_snapshot, Stage};
use crate::quality::{apply_exclusions, straightline_flag};
use crate::reconcile::reconcile_sessions;
use crate::scales::score_survey;
use crate::types::{PlayerRow, SurveyResponse, TelemetryBundle};
use crate::window::WindowAggregator;
use crate::PipelineError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Output of one pipeline run: the same per-player table at three stages.
///
/// `raw_merged` is the post-merge table before any quality policy is
/// considered; `no_exclusions` is the analysis view that keeps every row and
/// value; `exclusions_applied` drops double-straightliners and nulls
/// outliers. Persisting both analysis views lets downstream work choose its
/// sensitivity to the exclusion policy.
#[derive(Debug, Clone)]
pub struct StudyOutput {
    pub raw_merged: Vec<PlayerRow>,
    pub no_exclusions: Vec<PlayerRow>,
    pub exclusions_applied: Vec<PlayerRow>,
}

/// One-platform batch pipeline with a configurable telemetry window
#[derive(Debug, Clone, Default)]
pub struct StudyPipeline {
    aggregator: WindowAggregator,
}

impl StudyPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_days(window_days: i64) -> Self {
        Self {
            aggregator: WindowAggregator::new(window_days),
        }
    }

    /// Run the full transformation for one platform/wave
    pub fn run(&self, survey: Vec<SurveyResponse>, telemetry: &TelemetryBundle) -> StudyOutput {
        let survey = dedup_survey(survey);
        info!(respondents = survey.len(), "survey deduplicated");

        let sessions = reconcile_sessions(&telemetry.sessions);
        info!(
            fragments = telemetry.sessions.len(),
            sessions = sessions.len(),
            "sessions reconciled"
        );

        let mut summaries = self.aggregator.aggregate(&survey, &sessions, telemetry);

        let rows: Vec<PlayerRow> = survey
            .into_iter()
            .map(|response| {
                let scores = score_survey(&response);
                let straightliner_affect = straightline_flag(&response.affect_block());
                let straightliner_motivation = straightline_flag(&response.motivation_block());
                let summary = summaries.remove(&response.player_id).unwrap_or_default();

                PlayerRow {
                    player_id: response.player_id,
                    platform: response.platform,
                    submitted_at: response.submitted_at,
                    self_reported_hours: response.self_reported_hours,
                    scores,
                    straightliner_affect,
                    straightliner_motivation,
                    summary,
                }
            })
            .collect();

        let exclusions_applied = apply_exclusions(&rows);
        info!(
            merged = rows.len(),
            retained = exclusions_applied.len(),
            "pipeline run complete"
        );

        StudyOutput {
            raw_merged: rows.clone(),
            no_exclusions: rows,
            exclusions_applied,
        }
    }

    /// Run the pipeline and write all three snapshots to `dir`
    pub fn run_and_persist(
        &self,
        survey: Vec<SurveyResponse>,
        telemetry: &TelemetryBundle,
        dir: &Path,
    ) -> Result<(StudyOutput, Vec<PathBuf>), PipelineError> {
        let output = self.run(survey, telemetry);

        let paths = vec![
            write_snapshot(dir, Stage::RawMerged, &output.raw_merged)?,
            write_snapshot(dir, Stage::NoExclusions, &output.no_exclusions)?,
            write_snapshot(dir, Stage::ExclusionsApplied, &output.exclusions_applied)?,
        ];

        Ok((output, paths))
    }
}

/// Drop survey rows that telemetry cannot be attributed to: every row whose
/// player identifier occurs more than once is removed (both copies), and the
/// adapters have already dropped rows with missing identifiers. Input order
/// is preserved.
pub fn dedup_survey(responses: Vec<SurveyResponse>) -> Vec<SurveyResponse> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for response in &responses {
        *counts.entry(response.player_id.clone()).or_insert(0) += 1;
    }

    responses
        .into_iter()
        .filter(|r| counts[&r.player_id] == 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Platform, PlayerEvent, SessionFragment};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn ts(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, day, h, m, 0).unwrap()
    }

    fn respondent(player: &str, items: f64) -> SurveyResponse {
        SurveyResponse {
            player_id: player.to_string(),
            platform: Platform::Ea,
            submitted_at: ts(15, 12, 0),
            spane_positive: vec![Some(items), Some(items + 1.0), Some(items)],
            spane_negative: vec![Some(2.0), Some(1.0), Some(2.0)],
            motivation_intrinsic: vec![Some(6.0), Some(5.0)],
            motivation_extrinsic: vec![Some(3.0), Some(4.0)],
            self_reported_hours: Some(10.0),
        }
    }

    fn fragment(
        player: &str,
        session: &str,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> SessionFragment {
        SessionFragment {
            player_id: player.to_string(),
            session_id: session.to_string(),
            start,
            end,
            attrs: HashMap::new(),
        }
    }

    #[test]
    fn test_dedup_drops_all_copies_of_duplicate_ids() {
        let responses = vec![
            respondent("a", 4.0),
            respondent("dup", 4.0),
            respondent("b", 4.0),
            respondent("dup", 3.0),
        ];
        let deduped = dedup_survey(responses);
        let ids: Vec<&str> = deduped.iter().map(|r| r.player_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_end_to_end_fragment_scenario() {
        // Starts [09:00, missing, 09:10], ends [09:30, 09:40, 09:45] for
        // one (player, session) pair.
        let telemetry = TelemetryBundle {
            sessions: vec![
                fragment("p1", "s1", Some(ts(10, 9, 0)), ts(10, 9, 30)),
                fragment("p1", "s1", None, ts(10, 9, 40)),
                fragment("p1", "s1", Some(ts(10, 9, 10)), ts(10, 9, 45)),
            ],
            ..Default::default()
        };
        let output = StudyPipeline::new().run(vec![respondent("p1", 4.0)], &telemetry);

        assert_eq!(output.no_exclusions.len(), 1);
        let row = &output.no_exclusions[0];
        // One reconciled session of 09:00-09:45 = 0.75 hours
        assert_eq!(row.summary.session_count, Some(1));
        assert!((row.summary.total_hours.unwrap() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_respondent_without_telemetry_is_preserved() {
        let telemetry = TelemetryBundle {
            authentications: vec![PlayerEvent {
                player_id: "someone_else".to_string(),
                at: ts(10, 9, 0),
            }],
            ..Default::default()
        };
        let output = StudyPipeline::new().run(vec![respondent("p1", 4.0)], &telemetry);

        assert_eq!(output.no_exclusions.len(), 1);
        assert!(output.no_exclusions[0].summary.is_empty());
        // Scores still computed from the survey alone
        assert!(output.no_exclusions[0].scores.spane_balance.is_some());
    }

    #[test]
    fn test_double_straightliner_dropped_only_from_final_view() {
        let mut liner = respondent("liner", 4.0);
        liner.spane_positive = vec![Some(3.0), Some(3.0), Some(3.0)];
        liner.spane_negative = vec![Some(3.0), Some(3.0), Some(3.0)];
        liner.motivation_intrinsic = vec![Some(5.0), Some(5.0)];
        liner.motivation_extrinsic = vec![Some(5.0), Some(5.0)];

        let output = StudyPipeline::new().run(
            vec![liner, respondent("ok", 4.0)],
            &TelemetryBundle::default(),
        );

        assert_eq!(output.raw_merged.len(), 2);
        assert_eq!(output.no_exclusions.len(), 2);
        let ids: Vec<&str> = output
            .exclusions_applied
            .iter()
            .map(|r| r.player_id.as_str())
            .collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[test]
    fn test_run_and_persist_writes_three_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let (_, paths) = StudyPipeline::new()
            .run_and_persist(
                vec![respondent("p1", 4.0)],
                &TelemetryBundle::default(),
                dir.path(),
            )
            .unwrap();

        assert_eq!(paths.len(), 3);
        for path in paths {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_custom_window_days() {
        let telemetry = TelemetryBundle {
            sessions: vec![fragment(
                "p1",
                "s1",
                // 20 days before the survey: outside a 14-day window but
                // inside a 28-day one
                Some(Utc.with_ymd_and_hms(2021, 2, 23, 9, 0, 0).unwrap()),
                Utc.with_ymd_and_hms(2021, 2, 23, 10, 0, 0).unwrap(),
            )],
            ..Default::default()
        };
        let survey = vec![respondent("p1", 4.0)];

        let narrow = StudyPipeline::new().run(survey.clone(), &telemetry);
        assert_eq!(narrow.no_exclusions[0].summary.session_count, None);

        let wide = StudyPipeline::with_window_days(28).run(survey, &telemetry);
        assert_eq!(wide.no_exclusions[0].summary.session_count, Some(1));
    }
}
