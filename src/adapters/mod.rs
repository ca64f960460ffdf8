//! Platform adapters
//!
//! Each game platform exports its own column names; the adapters are the one
//! place that knows them and maps each export onto the common record types.
//! Downstream stages never see a platform-specific column name.

mod ea;
mod nintendo;

pub use ea::EaAdapter;
pub use nintendo::NintendoAdapter;

use crate::error::PipelineError;
use crate::loader::RawTable;
use crate::types::{
    FriendEvent, Platform, PlayerEvent, SessionFragment, SurveyResponse, TelemetryBundle, XpEvent,
};

/// Raw telemetry exports for one platform/wave. Categories the platform does
/// not export stay `None` and come out as empty tables in the bundle.
#[derive(Debug, Default)]
pub struct TelemetryTables {
    pub sessions: Option<RawTable>,
    pub authentications: Option<RawTable>,
    pub friends: Option<RawTable>,
    pub leveling: Option<RawTable>,
    pub prestige: Option<RawTable>,
    pub gestures: Option<RawTable>,
    pub experience: Option<RawTable>,
}

/// Adapter from one platform's export schema to the common internal scheme
pub trait PlatformAdapter {
    fn platform(&self) -> Platform;

    /// Parse a survey export into harmonized responses
    fn parse_survey(&self, table: &RawTable) -> Result<Vec<SurveyResponse>, PipelineError>;

    /// Parse the available telemetry exports into one bundle
    fn parse_telemetry(&self, tables: &TelemetryTables)
        -> Result<TelemetryBundle, PipelineError>;
}

/// Column names for a session export
pub(crate) struct SessionColumns<'a> {
    pub player: &'a str,
    pub session: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    /// Descriptive columns carried along as string attributes
    pub attrs: &'a [&'a str],
}

/// Parse a session export into fragments. Player, session id, and end
/// timestamp are required per row; a missing start stays missing for the
/// reconciler to substitute.
pub(crate) fn parse_sessions(
    table: &RawTable,
    cols: &SessionColumns<'_>,
) -> Result<Vec<SessionFragment>, PipelineError> {
    let player_col = table.column(cols.player)?;
    let session_col = table.column(cols.session)?;
    let start_col = table.column(cols.start)?;
    let end_col = table.column(cols.end)?;
    let attr_cols = table.columns(cols.attrs)?;

    let mut fragments = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let player_id = table.cell_required(row, i, player_col, cols.player)?.to_string();
        let session_id = table.cell_required(row, i, session_col, cols.session)?.to_string();
        let start = table.cell_timestamp(row, i, start_col)?;
        let end = table
            .cell_timestamp(row, i, end_col)?
            .ok_or_else(|| PipelineError::MissingField {
                table: table.name.clone(),
                row: i,
                field: cols.end.to_string(),
            })?;

        let mut attrs = std::collections::HashMap::new();
        for (name, &col) in cols.attrs.iter().zip(attr_cols.iter()) {
            if let Some(value) = table.cell(row, col) {
                attrs.insert(name.to_string(), value.to_string());
            }
        }

        fragments.push(SessionFragment {
            player_id,
            session_id,
            start,
            end,
            attrs,
        });
    }

    Ok(fragments)
}

/// Parse a single-timestamp event export (authentications, level-ups,
/// prestige changes, gestures)
pub(crate) fn parse_events(
    table: &RawTable,
    player: &str,
    timestamp: &str,
) -> Result<Vec<PlayerEvent>, PipelineError> {
    let player_col = table.column(player)?;
    let ts_col = table.column(timestamp)?;

    let mut events = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let player_id = table.cell_required(row, i, player_col, player)?.to_string();
        let at = table
            .cell_timestamp(row, i, ts_col)?
            .ok_or_else(|| PipelineError::MissingField {
                table: table.name.clone(),
                row: i,
                field: timestamp.to_string(),
            })?;
        events.push(PlayerEvent { player_id, at });
    }

    Ok(events)
}

/// Parse a friend-connection export (directed: player added friend)
pub(crate) fn parse_friends(
    table: &RawTable,
    player: &str,
    friend: &str,
    timestamp: &str,
) -> Result<Vec<FriendEvent>, PipelineError> {
    let player_col = table.column(player)?;
    let friend_col = table.column(friend)?;
    let ts_col = table.column(timestamp)?;

    let mut events = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let player_id = table.cell_required(row, i, player_col, player)?.to_string();
        let friend_id = table.cell_required(row, i, friend_col, friend)?.to_string();
        let at = table
            .cell_timestamp(row, i, ts_col)?
            .ok_or_else(|| PipelineError::MissingField {
                table: table.name.clone(),
                row: i,
                field: timestamp.to_string(),
            })?;
        events.push(FriendEvent {
            player_id,
            friend_id,
            at,
        });
    }

    Ok(events)
}

/// Parse an experience-point export; the amount is a non-key field and
/// propagates as missing when malformed
pub(crate) fn parse_xp(
    table: &RawTable,
    player: &str,
    timestamp: &str,
    amount: &str,
) -> Result<Vec<XpEvent>, PipelineError> {
    let player_col = table.column(player)?;
    let ts_col = table.column(timestamp)?;
    let amount_col = table.column(amount)?;

    let mut events = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let player_id = table.cell_required(row, i, player_col, player)?.to_string();
        let at = table
            .cell_timestamp(row, i, ts_col)?
            .ok_or_else(|| PipelineError::MissingField {
                table: table.name.clone(),
                row: i,
                field: timestamp.to_string(),
            })?;
        events.push(XpEvent {
            player_id,
            at,
            amount: table.cell_f64(row, amount_col),
        });
    }

    Ok(events)
}

/// Read a block of item columns as optional floats
pub(crate) fn parse_item_block(
    table: &RawTable,
    row: &[String],
    cols: &[usize],
) -> Vec<Option<f64>> {
    cols.iter().map(|&c| table.cell_f64(row, c)).collect()
}
