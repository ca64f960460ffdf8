//! Snapshot persistence
//!
//! Writes the per-player table to CSV at well-defined stages. The column set
//! and ordering here is the de facto schema contract for downstream analysis
//! and must stay stable. Missing values are written as empty cells and
//! timestamps as RFC 3339.

use crate::error::PipelineError;
use crate::types::PlayerRow;
use csv::Writer;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Persisted pipeline stages, one snapshot file per stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Survey, scores, flags, and telemetry merged; nothing excluded yet
    RawMerged,
    /// Final column set without quality exclusions
    NoExclusions,
    /// Straightliners dropped, outliers nulled
    ExclusionsApplied,
}

impl Stage {
    pub fn file_name(&self, platform: &str) -> String {
        match self {
            Stage::RawMerged => format!("{platform}_raw_merged.csv"),
            Stage::NoExclusions => format!("{platform}_no_exclusions.csv"),
            Stage::ExclusionsApplied => format!("{platform}_exclusions_applied.csv"),
        }
    }
}

/// Snapshot column order; the schema contract
pub const SNAPSHOT_COLUMNS: &[&str] = &[
    "player_id",
    "platform",
    "submitted_at",
    "self_reported_hours",
    "spane_positive",
    "spane_negative",
    "spane_balance",
    "intrinsic",
    "extrinsic",
    "straightliner_affect",
    "straightliner_motivation",
    "total_hours",
    "session_count",
    "logins",
    "friend_count",
    "level_ups",
    "prestige_events",
    "gestures",
    "xp_total",
];

/// Write one stage's snapshot to `dir`
pub fn write_snapshot(
    dir: &Path,
    stage: Stage,
    rows: &[PlayerRow],
) -> Result<std::path::PathBuf, PipelineError> {
    let platform = rows
        .first()
        .map(|r| r.platform.as_str())
        .unwrap_or("empty");
    let path = dir.join(stage.file_name(platform));
    let file = File::create(&path)?;
    write_rows(file, rows)?;

    info!(stage = ?stage, rows = rows.len(), path = %path.display(), "wrote snapshot");
    Ok(path)
}

/// Write rows to any writer in the snapshot column order
pub fn write_rows<W: std::io::Write>(writer: W, rows: &[PlayerRow]) -> Result<(), PipelineError> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(SNAPSHOT_COLUMNS)?;

    for row in rows {
        wtr.write_record(&[
            row.player_id.clone(),
            row.platform.as_str().to_string(),
            row.submitted_at.to_rfc3339(),
            fmt_f64(row.self_reported_hours),
            fmt_f64(row.scores.spane_positive),
            fmt_f64(row.scores.spane_negative),
            fmt_f64(row.scores.spane_balance),
            fmt_f64(row.scores.intrinsic),
            fmt_f64(row.scores.extrinsic),
            fmt_bool(row.straightliner_affect),
            fmt_bool(row.straightliner_motivation),
            fmt_f64(row.summary.total_hours),
            fmt_u32(row.summary.session_count),
            fmt_u32(row.summary.logins),
            fmt_u32(row.summary.friend_count),
            fmt_u32(row.summary.level_ups),
            fmt_u32(row.summary.prestige_events),
            fmt_u32(row.summary.gestures),
            fmt_f64(row.summary.xp_total),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn fmt_f64(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_u32(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_bool(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Platform, ScaleScores, WindowedSummary};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn make_row() -> PlayerRow {
        PlayerRow {
            player_id: "p1".to_string(),
            platform: Platform::Nintendo,
            submitted_at: Utc.with_ymd_and_hms(2021, 3, 15, 10, 0, 0).unwrap(),
            self_reported_hours: Some(12.5),
            scores: ScaleScores {
                spane_positive: Some(4.0),
                spane_negative: Some(1.5),
                spane_balance: Some(2.5),
                intrinsic: None,
                extrinsic: Some(2.0),
            },
            straightliner_affect: Some(false),
            straightliner_motivation: None,
            summary: WindowedSummary {
                total_hours: Some(8.25),
                session_count: Some(6),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_write_rows_schema() {
        let mut buf = Vec::new();
        write_rows(&mut buf, &[make_row()]).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();

        assert_eq!(lines.next().unwrap(), SNAPSHOT_COLUMNS.join(","));
        let data = lines.next().unwrap();
        assert!(data.starts_with("p1,nintendo,2021-03-15T10:00:00+00:00,12.5,4,1.5,2.5,"));
        // Missing intrinsic score and missing flag come out as empty cells
        assert!(data.contains(",,2,false,,8.25,6,"));
    }

    #[test]
    fn test_stage_file_names() {
        assert_eq!(Stage::RawMerged.file_name("ea"), "ea_raw_merged.csv");
        assert_eq!(
            Stage::ExclusionsApplied.file_name("nintendo"),
            "nintendo_exclusions_applied.csv"
        );
    }

    #[test]
    fn test_write_snapshot_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), Stage::NoExclusions, &[make_row()]).unwrap();
        assert!(path.ends_with("nintendo_no_exclusions.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("player_id,platform,"));
    }
}
