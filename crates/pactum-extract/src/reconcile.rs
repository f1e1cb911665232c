//! Candidate reconciliation.
//!
//! All passes feed one pool of raw candidates; reconciliation normalizes
//! each candidate's text for its entity type, then keeps the single most
//! confident candidate per (normalized text, type) pair. Two passes that
//! saw the same date in different formats therefore collapse into one
//! entity instead of two.

use std::collections::HashSet;

use pactum_core::{
    parse_amount, parse_date_flex, EntityType, RawEntityCandidate, ReconciledEntity,
};
use tracing::debug;

/// Normalizes candidate text into the dedup key for its entity type.
///
/// Dates collapse to ISO `YYYY-MM-DD` when any known format parses,
/// amounts collapse to their numeric value, and everything else is
/// trimmed and lowercased. Unparseable dates fall back to the lowercased
/// raw text; unparseable amounts keep the raw text as is.
pub fn normalize_entity_text(text: &str, entity_type: EntityType) -> String {
    if entity_type.is_date() {
        return match parse_date_flex(text) {
            Some(date) => date.to_string(),
            None => text.to_lowercase(),
        };
    }
    match entity_type {
        EntityType::Amount => match parse_amount(text) {
            Some(value) => value.to_string(),
            None => text.to_string(),
        },
        _ => text.trim().to_lowercase(),
    }
}

/// Collapses raw candidates into reconciled entities, highest confidence
/// first. The sort is stable, so equally confident duplicates keep their
/// pass order and the earliest one wins.
pub fn reconcile(mut candidates: Vec<RawEntityCandidate>) -> Vec<ReconciledEntity> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut seen: HashSet<(String, EntityType)> = HashSet::new();
    let mut reconciled = Vec::new();
    for candidate in candidates {
        let normalized = normalize_entity_text(&candidate.text, candidate.entity_type);
        if seen.insert((normalized.clone(), candidate.entity_type)) {
            reconciled.push(ReconciledEntity::from_candidate(candidate, normalized));
        }
    }
    debug!(count = reconciled.len(), "reconciled entity candidates");
    reconciled
}

// ── Tests ──────────────────────────────────────────────────────────────────
