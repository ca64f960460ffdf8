//! Nintendo export adapter
//!
//! The Nintendo wave ships a survey export and a single telemetry export of
//! session heartbeats. No event-level categories (authentications, friends,
//! leveling, prestige, gestures, experience) exist for this platform, so
//! their tables come out empty and every aggregate for those sources reads
//! as missing.

use super::{parse_item_block, parse_sessions, PlatformAdapter, SessionColumns, TelemetryTables};
use crate::error::PipelineError;
use crate::loader::RawTable;
use crate::types::{Platform, SurveyResponse, TelemetryBundle};

const SPANE_POSITIVE: &[&str] = &[
    "spane_pos_1",
    "spane_pos_2",
    "spane_pos_3",
    "spane_pos_4",
    "spane_pos_5",
    "spane_pos_6",
];
const SPANE_NEGATIVE: &[&str] = &[
    "spane_neg_1",
    "spane_neg_2",
    "spane_neg_3",
    "spane_neg_4",
    "spane_neg_5",
    "spane_neg_6",
];
const MOTIVATION_INTRINSIC: &[&str] = &["motiv_int_1", "motiv_int_2", "motiv_int_3", "motiv_int_4"];
const MOTIVATION_EXTRINSIC: &[&str] = &["motiv_ext_1", "motiv_ext_2", "motiv_ext_3", "motiv_ext_4"];

pub struct NintendoAdapter;

impl PlatformAdapter for NintendoAdapter {
    fn platform(&self) -> Platform {
        Platform::Nintendo
    }

    fn parse_survey(&self, table: &RawTable) -> Result<Vec<SurveyResponse>, PipelineError> {
        let player_col = table.column("hashed_id")?;
        let submitted_col = table.column("date_completed")?;
        let hours_col = table.column("hours_est")?;
        let pos_cols = table.columns(SPANE_POSITIVE)?;
        let neg_cols = table.columns(SPANE_NEGATIVE)?;
        let int_cols = table.columns(MOTIVATION_INTRINSIC)?;
        let ext_cols = table.columns(MOTIVATION_EXTRINSIC)?;

        let mut responses = Vec::with_capacity(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            // Missing IDs are dropped here; duplicate IDs are dropped later
            // by the survey dedup filter, which needs the whole table.
            let Some(player_id) = table.cell(row, player_col) else {
                continue;
            };
            let submitted_at = table
                .cell_timestamp(row, i, submitted_col)?
                .ok_or_else(|| PipelineError::MissingField {
                    table: table.name.clone(),
                    row: i,
                    field: "date_completed".to_string(),
                })?;

            responses.push(SurveyResponse {
                player_id: player_id.to_string(),
                platform: Platform::Nintendo,
                submitted_at,
                spane_positive: parse_item_block(table, row, &pos_cols),
                spane_negative: parse_item_block(table, row, &neg_cols),
                motivation_intrinsic: parse_item_block(table, row, &int_cols),
                motivation_extrinsic: parse_item_block(table, row, &ext_cols),
                self_reported_hours: table.cell_f64(row, hours_col),
            });
        }

        Ok(responses)
    }

    fn parse_telemetry(
        &self,
        tables: &TelemetryTables,
    ) -> Result<TelemetryBundle, PipelineError> {
        let mut bundle = TelemetryBundle::default();

        if let Some(sessions) = &tables.sessions {
            bundle.sessions = parse_sessions(
                sessions,
                &SessionColumns {
                    player: "hashed_id",
                    session: "session_id",
                    start: "session_start",
                    end: "session_end",
                    attrs: &["device", "product_version"],
                },
            )?;
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn survey_csv() -> &'static str {
        "hashed_id,date_completed,hours_est,\
spane_pos_1,spane_pos_2,spane_pos_3,spane_pos_4,spane_pos_5,spane_pos_6,\
spane_neg_1,spane_neg_2,spane_neg_3,spane_neg_4,spane_neg_5,spane_neg_6,\
motiv_int_1,motiv_int_2,motiv_int_3,motiv_int_4,\
motiv_ext_1,motiv_ext_2,motiv_ext_3,motiv_ext_4\n\
abc123,2021-03-15 10:00:00,12.5,4,5,4,,3,4,2,1,2,1,1,2,6,7,6,5,2,3,1,4\n\
,2021-03-15 11:00:00,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1\n"
    }

    #[test]
    fn test_parse_survey() {
        let table = RawTable::from_reader(survey_csv().as_bytes(), "survey").unwrap();
        let responses = NintendoAdapter.parse_survey(&table).unwrap();

        // Row with a missing ID is dropped
        assert_eq!(responses.len(), 1);
        let r = &responses[0];
        assert_eq!(r.player_id, "abc123");
        assert_eq!(r.platform, Platform::Nintendo);
        assert_eq!(r.self_reported_hours, Some(12.5));
        assert_eq!(r.spane_positive[3], None);
        assert_eq!(r.spane_positive[0], Some(4.0));
        assert_eq!(r.motivation_extrinsic, vec![Some(2.0), Some(3.0), Some(1.0), Some(4.0)]);
    }

    #[test]
    fn test_parse_survey_missing_column_fails() {
        let table = RawTable::from_reader(b"hashed_id,hours_est\nabc,1\n" as &[u8], "survey")
            .unwrap();
        let err = NintendoAdapter.parse_survey(&table).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_parse_sessions_only_telemetry() {
        let csv = "hashed_id,session_id,session_start,session_end,device,product_version\n\
abc123,s1,2021-03-01 09:00:00,2021-03-01 09:30:00,switch,1.9.0\n\
abc123,s1,,2021-03-01 09:40:00,switch,1.9.0\n";
        let tables = TelemetryTables {
            sessions: Some(RawTable::from_reader(csv.as_bytes(), "sessions").unwrap()),
            ..Default::default()
        };
        let bundle = NintendoAdapter.parse_telemetry(&tables).unwrap();

        assert_eq!(bundle.sessions.len(), 2);
        assert_eq!(bundle.sessions[1].start, None);
        assert_eq!(bundle.sessions[0].attrs["device"], "switch");
        // No event categories on this platform
        assert!(bundle.authentications.is_empty());
        assert!(bundle.friends.is_empty());
    }
}
