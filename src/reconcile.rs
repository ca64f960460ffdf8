//! Session reconciliation
//!
//! Telemetry logs one row per heartbeat/checkpoint within a session rather
//! than one row per session, so the same (player, session) pair shows up as
//! several fragments with monotonically-refined end times. This module
//! collapses those fragments into one canonical row per logical session.
//!
//! The grouping heuristic is best-effort, carried over from the original
//! analyses: all fragments sharing (player_id, session_id) are taken to be
//! one logical session. No real session-boundary detection is attempted.

use crate::types::{PlaySession, SessionFragment};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Collapse session fragments into one row per (player_id, session_id).
///
/// A fragment without a start timestamp gets its own end substituted as a
/// placeholder first; the resulting zero-length span reads as missing
/// duration downstream. For each group the output takes start = min observed
/// start and end = max observed end; descriptive attributes come from the
/// first fragment in input order and are not authoritative for multi-fragment
/// groups.
///
/// Total over any input with end timestamps present, and idempotent: an
/// already-reconciled table passes through unchanged.
pub fn reconcile_sessions(fragments: &[SessionFragment]) -> Vec<PlaySession> {
    let mut groups: BTreeMap<(String, String), PlaySession> = BTreeMap::new();

    for fragment in fragments {
        let start = fragment.start.unwrap_or(fragment.end);
        let key = (fragment.player_id.clone(), fragment.session_id.clone());

        match groups.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(PlaySession {
                    player_id: fragment.player_id.clone(),
                    session_id: fragment.session_id.clone(),
                    start,
                    end: fragment.end,
                    attrs: fragment.attrs.clone(),
                });
            }
            Entry::Occupied(mut entry) => {
                let session = entry.get_mut();
                session.start = session.start.min(start);
                session.end = session.end.max(fragment.end);
                // attrs stay those of the first fragment seen
            }
        }
    }

    debug!(
        fragments = fragments.len(),
        sessions = groups.len(),
        "reconciled session fragments"
    );

    groups.into_values().collect()
}
