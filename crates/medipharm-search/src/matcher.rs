//! Free-text medication matching.
//!
//! Resolves a normalized query into a ranked, bounded set of candidate
//! medications. Matching combines substring containment on the stored
//! lowercase name/generic-code with trigram similarity above a
//! threshold; ranking is a strict bucket order with the historical
//! search-count as the final tie-break.

use std::cmp::Ordering;

use tracing::debug;

use medipharm_core::text::{normalize_text, trigram_similarity};
use medipharm_core::{CoreError, Medication};
use medipharm_storage::{DynMedicationStore, StorageError};

use crate::config::SearchConfig;
use crate::notifier::SideEffectNotifier;

/// Match rank buckets, strict priority order. Lower ranks first.
const RANK_EXACT_NAME: u8 = 1;
const RANK_EXACT_CODE: u8 = 2;
const RANK_NAME_SUBSTRING: u8 = 3;
const RANK_SIMILARITY: u8 = 4;

struct RankedCandidate {
    rank: u8,
    similarity: f64,
    medication: Medication,
}

/// Resolves free-text queries into ranked candidate medications.
pub struct TextMatcher {
    medications: DynMedicationStore,
    notifier: SideEffectNotifier,
    config: SearchConfig,
}

impl TextMatcher {
    pub fn new(
        medications: DynMedicationStore,
        notifier: SideEffectNotifier,
        config: SearchConfig,
    ) -> Self {
        Self {
            medications,
            notifier,
            config,
        }
    }

    /// Validates and normalizes a raw query before any pipeline work.
    pub fn normalize_query(raw: &str, config: &SearchConfig) -> Result<String, CoreError> {
        if raw.contains('\0') {
            return Err(CoreError::invalid_query("contains NUL byte"));
        }
        let normalized = normalize_text(raw);
        if normalized.is_empty() {
            return Err(CoreError::invalid_query("empty after trimming"));
        }
        if normalized.chars().count() > config.max_query_len {
            return Err(CoreError::invalid_query(format!(
                "longer than {} characters",
                config.max_query_len
            )));
        }
        Ok(normalized)
    }

    /// Returns ranked matches for a normalized query, capped at the
    /// configured maximum.
    ///
    /// For every medication returned, a search-count increment is
    /// scheduled through the notifier; the increments are never awaited
    /// here. No match is an empty vec, not an error.
    pub async fn matches(&self, query_lower: &str) -> Result<Vec<Medication>, StorageError> {
        let pattern = format!("%{query_lower}%");
        let candidates = self
            .medications
            .find_active_by_text_similarity(&pattern, query_lower)
            .await?;

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter(|m| m.is_active)
            .filter_map(|m| self.rank(m, query_lower))
            .collect();

        ranked.sort_by(compare_candidates);
        ranked.truncate(self.config.max_results);

        let matches: Vec<Medication> = ranked.into_iter().map(|c| c.medication).collect();
        debug!(query = %query_lower, count = matches.len(), "text match resolved");

        for m in &matches {
            self.notifier.increment_search_count(m.id);
        }
        Ok(matches)
    }

    /// Scores one candidate, or drops it when it matches neither by
    /// substring nor by similarity. The ranking never trusts backend
    /// ordering.
    fn rank(&self, medication: Medication, query_lower: &str) -> Option<RankedCandidate> {
        let name = &medication.name_lowercase;
        let code = &medication.dci_lowercase;

        let similarity = trigram_similarity(name, query_lower)
            .max(trigram_similarity(code, query_lower));
        let substring = name.contains(query_lower) || code.contains(query_lower);
        if !substring && similarity <= self.config.similarity_threshold {
            return None;
        }

        let rank = if name == query_lower {
            RANK_EXACT_NAME
        } else if code == query_lower {
            RANK_EXACT_CODE
        } else if name.contains(query_lower) {
            RANK_NAME_SUBSTRING
        } else {
            RANK_SIMILARITY
        };

        Some(RankedCandidate {
            rank,
            similarity,
            medication,
        })
    }
}

/// Rank bucket ascending, then similarity descending within the
/// similarity-only bucket, then search-count descending, then id
/// ascending so repeated calls return identical lists.
fn compare_candidates(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| {
            if a.rank == RANK_SIMILARITY {
                b.similarity.total_cmp(&a.similarity)
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| b.medication.search_count.cmp(&a.medication.search_count))
        .then_with(|| a.medication.id.cmp(&b.medication.id))
}
