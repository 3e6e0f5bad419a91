//! The scoring engine (component C4): two-pass global/local weight
//! aggregation, normalization, filtering, and ranking. This is the core of
//! the Archetype Similarity Index — everything upstream exists to feed it
//! rows, and everything downstream exists to serialize its output.

use crate::hypergeometric::{joint_probability, p_max};
use crate::model::{Archetype, Bigram, BigramRecord};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Candidate set C admits any archetype within this many global-weight
/// points of the leader.
pub const CANDIDATE_WINDOW: f64 = 2.0;
/// Archetypes scoring at or below this threshold are suppressed from the
/// response entirely.
pub const SCORE_THRESHOLD: f64 = 0.05;

/// Per-archetype tallies from both passes, kept around after scoring so
/// instrumented callers (tests, diagnostics) can inspect intermediate
/// state rather than only the final ranked output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArchetypeWeights {
    pub w_global: f64,
    pub w_local: f64,
}

/// The full result of a scoring run: the intermediate weights, the chosen
/// candidate set, the global normalizer, and the final ranked, filtered
/// scores ready for serialization.
#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    pub weights: BTreeMap<Archetype, ArchetypeWeights>,
    pub candidate_set: BTreeSet<Archetype>,
    pub p_max_global: f64,
    pub ranked: Vec<(Archetype, f64)>,
}

/// Runs both passes over `rows` (already restricted to the requested
/// format and candidate bigram set by C2) and produces a ranked,
/// normalized, filtered outcome. An empty `rows` is not an error: it
/// yields an empty outcome, per the engine-degenerate case in the error
/// model.
pub fn score(rows: &[BigramRecord]) -> ScoringOutcome {
    if rows.is_empty() {
        return ScoringOutcome::default();
    }

    let probs: Vec<f64> = rows
        .iter()
        .map(|r| joint_probability(r.k1 as u32, r.k2 as u32))
        .collect();

    let p_max_global = rows
        .iter()
        .map(|r| p_max(r.k1 as u32, r.k2 as u32))
        .fold(0.0_f64, f64::max);

    // Cohort F(b): every archetype (among matched rows) that holds bigram b.
    let mut cohort: HashMap<&Bigram, BTreeSet<&Archetype>> = HashMap::new();
    for row in rows {
        cohort.entry(&row.bigram).or_default().insert(&row.archetype);
    }

    let mut weights: BTreeMap<Archetype, ArchetypeWeights> = BTreeMap::new();

    // --- Pass 1: global weights ---
    for (row, &p) in rows.iter().zip(probs.iter()) {
        let f_b = &cohort[&row.bigram];
        let w1 = if f_b.len() == 1 { 2.0 } else { 1.0 };
        weights.entry(row.archetype.clone()).or_default().w_global += w1 * p;
    }

    let m = weights
        .values()
        .map(|w| w.w_global)
        .fold(f64::NEG_INFINITY, f64::max);

    let candidate_set: BTreeSet<Archetype> = weights
        .iter()
        .filter(|(_, w)| w.w_global >= m - CANDIDATE_WINDOW)
        .map(|(a, _)| a.clone())
        .collect();

    // --- Pass 2: local weights ---
    let c_len = candidate_set.len();
    for (row, &p) in rows.iter().zip(probs.iter()) {
        let in_candidate = candidate_set.contains(&row.archetype);
        let f_b = &cohort[&row.bigram];
        let f_c_b_len = f_b.iter().filter(|a| candidate_set.contains(**a)).count();

        let relevant = in_candidate || f_c_b_len > 0;
        if !relevant {
            continue;
        }

        let w2 = if in_candidate && f_c_b_len == 1 {
            2.0
        } else if in_candidate && f_c_b_len > 1 && (f_c_b_len as f64) < (c_len as f64) / 3.0 {
            1.0
        } else if !in_candidate {
            -1.0
        } else {
            0.0
        };

        if w2 != 0.0 {
            weights.entry(row.archetype.clone()).or_default().w_local += w2 * p;
        }
    }

    // --- Final score, clamp, filter, rank ---
    let mut ranked: Vec<(Archetype, f64)> = weights
        .iter()
        .map(|(archetype, w)| {
            let raw = if p_max_global > 0.0 {
                (w.w_global + w.w_local) / p_max_global
            } else {
                0.0
            };
            (archetype.clone(), raw.clamp(0.0, 1.0))
        })
        .filter(|(_, raw)| *raw > SCORE_THRESHOLD)
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    ScoringOutcome {
        weights,
        candidate_set,
        p_max_global,
        ranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bigram;

    fn row(archetype: &str, c1: &str, c2: &str, k1: u8, k2: u8) -> BigramRecord {
        BigramRecord {
            archetype: archetype.to_string(),
            bigram: Bigram::canonical(c1.to_string(), c2.to_string()),
            k1,
            k2,
        }
    }

    #[test]
    fn empty_rows_yield_empty_outcome() {
        let outcome = score(&[]);
        assert!(outcome.ranked.is_empty());
        assert!(outcome.candidate_set.is_empty());
    }

    #[test]
    fn unique_bigram_gets_double_global_weight() {
        let rows = vec![row("Eldrazi", "A", "B", 4, 4)];
        let outcome = score(&rows);
        let w = outcome.weights["Eldrazi"];
        let p = joint_probability(4, 4);
        assert!((w.w_global - 2.0 * p).abs() < 1e-9);
    }

    #[test]
    fn shared_bigram_gets_single_global_weight_each() {
        let rows = vec![
            row("Eldrazi", "A", "B", 4, 4),
            row("Affinity", "A", "B", 4, 4),
        ];
        let outcome = score(&rows);
        let p = joint_probability(4, 4);
        assert!((outcome.weights["Eldrazi"].w_global - p).abs() < 1e-9);
        assert!((outcome.weights["Affinity"].w_global - p).abs() < 1e-9);
    }

    #[test]
    fn sole_matching_archetype_scores_one() {
        // Only one archetype returned at all: it is trivially the whole
        // candidate set, and every bigram is unique to it.
        let rows = vec![
            row("Mono Red", "Mountain", "Goblin Guide", 4, 4),
            row("Mono Red", "Mountain", "Lightning Bolt", 4, 4),
        ];
        let outcome = score(&rows);
        assert_eq!(outcome.ranked.len(), 1);
        assert_eq!(outcome.ranked[0].0, "Mono Red");
        assert_eq!(outcome.ranked[0].1, 1.0);
    }

    #[test]
    fn scores_outside_threshold_are_suppressed() {
        // "Strong Deck" dominates with 20 unique bigrams, pushing both its
        // own W_global and P_MAX_global well above "Weak Deck"'s single,
        // unrelated, low-copy bigram. Weak Deck falls outside the
        // candidate window and never overlaps a candidate bigram, so its
        // normalized score lands under the suppression threshold.
        let mut rows: Vec<BigramRecord> = (0..20)
            .map(|i| row("Strong Deck", &format!("s{i}a"), &format!("s{i}b"), 4, 4))
            .collect();
        rows.push(row("Weak Deck", "X", "Y", 1, 1));

        let outcome = score(&rows);
        assert!(!outcome.candidate_set.contains("Weak Deck"));
        assert!(outcome.ranked.iter().all(|(a, _)| a != "Weak Deck"));
        assert!(outcome.ranked.iter().any(|(a, _)| a == "Strong Deck"));
    }

    #[test]
    fn ties_break_by_archetype_name_ascending() {
        let rows = vec![
            row("Zeta Deck", "A", "B", 4, 4),
            row("Alpha Deck", "C", "D", 4, 4),
        ];
        let outcome = score(&rows);
        assert_eq!(outcome.ranked.len(), 2);
        assert_eq!(outcome.ranked[0].1, outcome.ranked[1].1);
        assert_eq!(outcome.ranked[0].0, "Alpha Deck");
        assert_eq!(outcome.ranked[1].0, "Zeta Deck");
    }

    #[test]
    fn non_overlapping_non_candidates_keep_zero_local_weight() {
        // "Leader" racks up enough unique bigrams to push M - 2 past
        // "Irrelevant"'s single, unrelated, low-copy bigram, excluding it
        // from the candidate set; since that bigram overlaps no
        // candidate's bigram either, pass 2 never touches it.
        let mut rows: Vec<BigramRecord> = (0..20)
            .map(|i| row("Leader", &format!("l{i}a"), &format!("l{i}b"), 4, 4))
            .collect();
        rows.push(row("Irrelevant", "Z", "Y", 1, 1));

        let outcome = score(&rows);
        assert!(!outcome.candidate_set.contains("Irrelevant"));
        assert_eq!(outcome.weights["Irrelevant"].w_local, 0.0);
    }

    #[test]
    fn scores_never_exceed_one() {
        let rows = vec![
            row("A", "x1", "x2", 4, 4),
            row("A", "x1", "x3", 4, 4),
            row("A", "x2", "x3", 4, 4),
            row("B", "x1", "x2", 4, 4),
        ];
        let outcome = score(&rows);
        assert!(outcome.ranked.iter().all(|(_, s)| *s <= 1.0));
    }
}
