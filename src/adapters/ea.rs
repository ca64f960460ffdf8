//! EA export adapter
//!
//! The EA wave is the richer of the two: besides session heartbeats it
//! exports per-event tables for authentications, friend connections,
//! level-ups, prestige changes, gestures, and experience-point grants, one
//! table per category.

use super::{
    parse_events, parse_friends, parse_item_block, parse_sessions, parse_xp, PlatformAdapter,
    SessionColumns, TelemetryTables,
};
use crate::error::PipelineError;
use crate::loader::RawTable;
use crate::types::{Platform, SurveyResponse, TelemetryBundle};

const AFFECT_POSITIVE: &[&str] = &[
    "affect_p1", "affect_p2", "affect_p3", "affect_p4", "affect_p5", "affect_p6",
];
const AFFECT_NEGATIVE: &[&str] = &[
    "affect_n1", "affect_n2", "affect_n3", "affect_n4", "affect_n5", "affect_n6",
];
const MOTIVATION_INTRINSIC: &[&str] = &[
    "motivation_i1",
    "motivation_i2",
    "motivation_i3",
    "motivation_i4",
];
const MOTIVATION_EXTRINSIC: &[&str] = &[
    "motivation_e1",
    "motivation_e2",
    "motivation_e3",
    "motivation_e4",
];

pub struct EaAdapter;

impl PlatformAdapter for EaAdapter {
    fn platform(&self) -> Platform {
        Platform::Ea
    }

    fn parse_survey(&self, table: &RawTable) -> Result<Vec<SurveyResponse>, PipelineError> {
        let player_col = table.column("uid")?;
        let submitted_col = table.column("timestamp")?;
        let hours_col = table.column("weekly_hours")?;
        let pos_cols = table.columns(AFFECT_POSITIVE)?;
        let neg_cols = table.columns(AFFECT_NEGATIVE)?;
        let int_cols = table.columns(MOTIVATION_INTRINSIC)?;
        let ext_cols = table.columns(MOTIVATION_EXTRINSIC)?;

        let mut responses = Vec::with_capacity(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            let Some(player_id) = table.cell(row, player_col) else {
                continue;
            };
            let submitted_at = table
                .cell_timestamp(row, i, submitted_col)?
                .ok_or_else(|| PipelineError::MissingField {
                    table: table.name.clone(),
                    row: i,
                    field: "timestamp".to_string(),
                })?;

            responses.push(SurveyResponse {
                player_id: player_id.to_string(),
                platform: Platform::Ea,
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
                    player: "player_id",
                    session: "session_id",
                    start: "start_time",
                    end: "end_time",
                    attrs: &["platform", "game_mode", "character_level"],
                },
            )?;
        }
        if let Some(auths) = &tables.authentications {
            bundle.authentications = parse_events(auths, "player_id", "auth_date")?;
        }
        if let Some(friends) = &tables.friends {
            bundle.friends =
                parse_friends(friends, "player_id", "friend_player_id", "event_date")?;
        }
        if let Some(leveling) = &tables.leveling {
            bundle.level_ups = parse_events(leveling, "player_id", "event_date")?;
        }
        if let Some(prestige) = &tables.prestige {
            bundle.prestige_changes = parse_events(prestige, "player_id", "event_date")?;
        }
        if let Some(gestures) = &tables.gestures {
            bundle.gestures = parse_events(gestures, "player_id", "event_date")?;
        }
        if let Some(experience) = &tables.experience {
            bundle.experience = parse_xp(experience, "player_id", "event_date", "xp_amount")?;
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_survey() {
        let csv = "uid,timestamp,weekly_hours,\
affect_p1,affect_p2,affect_p3,affect_p4,affect_p5,affect_p6,\
affect_n1,affect_n2,affect_n3,affect_n4,affect_n5,affect_n6,\
motivation_i1,motivation_i2,motivation_i3,motivation_i4,\
motivation_e1,motivation_e2,motivation_e3,motivation_e4\n\
u1,2021-03-15T10:00:00Z,20,5,5,4,4,3,5,1,1,2,1,1,1,7,6,7,6,3,2,4,1\n";
        let table = RawTable::from_reader(csv.as_bytes(), "survey").unwrap();
        let responses = EaAdapter.parse_survey(&table).unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].player_id, "u1");
        assert_eq!(responses[0].platform, Platform::Ea);
        assert_eq!(responses[0].self_reported_hours, Some(20.0));
        assert_eq!(responses[0].spane_negative[2], Some(2.0));
    }

    #[test]
    fn test_parse_full_telemetry() {
        let sessions = "player_id,session_id,start_time,end_time,platform,game_mode,character_level\n\
u1,s1,2021-03-01 09:00:00,2021-03-01 10:00:00,ps4,pvp,12\n";
        let auths = "player_id,auth_date\nu1,2021-03-01 08:55:00\n";
        let friends = "player_id,friend_player_id,event_date\nu1,u2,2021-03-01 09:30:00\n";
        let leveling = "player_id,event_date\nu1,2021-03-01 09:40:00\n";
        let prestige = "player_id,event_date\nu1,2021-03-01 09:50:00\n";
        let gestures = "player_id,event_date\nu1,2021-03-01 09:20:00\nu1,2021-03-01 09:21:00\n";
        let xp = "player_id,event_date,xp_amount\nu1,2021-03-01 09:45:00,250\nu1,2021-03-01 09:55:00,\n";

        let tables = TelemetryTables {
            sessions: Some(RawTable::from_reader(sessions.as_bytes(), "sessions").unwrap()),
            authentications: Some(RawTable::from_reader(auths.as_bytes(), "auths").unwrap()),
            friends: Some(RawTable::from_reader(friends.as_bytes(), "friends").unwrap()),
            leveling: Some(RawTable::from_reader(leveling.as_bytes(), "leveling").unwrap()),
            prestige: Some(RawTable::from_reader(prestige.as_bytes(), "prestige").unwrap()),
            gestures: Some(RawTable::from_reader(gestures.as_bytes(), "gestures").unwrap()),
            experience: Some(RawTable::from_reader(xp.as_bytes(), "experience").unwrap()),
        };

        let bundle = EaAdapter.parse_telemetry(&tables).unwrap();
        assert_eq!(bundle.sessions.len(), 1);
        assert_eq!(bundle.sessions[0].attrs["game_mode"], "pvp");
        assert_eq!(bundle.authentications.len(), 1);
        assert_eq!(bundle.friends[0].friend_id, "u2");
        assert_eq!(bundle.level_ups.len(), 1);
        assert_eq!(bundle.prestige_changes.len(), 1);
        assert_eq!(bundle.gestures.len(), 2);
        assert_eq!(bundle.experience[0].amount, Some(250.0));
        // Malformed amount propagates as missing, not an error
        assert_eq!(bundle.experience[1].amount, None);
    }

    #[test]
    fn test_event_table_missing_timestamp_column_fails() {
        let auths = "player_id,wrong_name\nu1,2021-03-01 08:55:00\n";
        let tables = TelemetryTables {
            authentications: Some(RawTable::from_reader(auths.as_bytes(), "auths").unwrap()),
            ..Default::default()
        };
        let err = EaAdapter.parse_telemetry(&tables).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref column, .. } if column == "auth_date"
        ));
    }
}
