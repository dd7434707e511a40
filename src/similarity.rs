//! Fuzzy similarity between normalized team keys.
//!
//! Score is a 0-100 float. Two signals are combined and the higher one wins:
//! - character edit similarity (normalized Levenshtein) x 100
//! - edit similarity of the per-token Double Metaphone codes x 84
//!
//! The phonetic signal tops out just under the default fuzzy threshold.
//! Two short keys that merely share a code ("tech" and "duke" are both TK)
//! do not match unless the caller lowers the threshold; "dook" vs "duke"
//! scores 84 and resolves at a threshold of 80.

use rphonetic::{DoubleMetaphone, Encoder};
use std::sync::OnceLock;

use crate::config::DEFAULT_FUZZY_THRESHOLD;

/// Weight applied to phonetic similarity
pub const PHONETIC_WEIGHT: f64 = DEFAULT_FUZZY_THRESHOLD - 1.0;

fn encoder() -> &'static DoubleMetaphone {
    static ENCODER: OnceLock<DoubleMetaphone> = OnceLock::new();
    ENCODER.get_or_init(DoubleMetaphone::default)
}

/// Space-joined Double Metaphone codes, one per token with letters in it
pub fn phonetic_key(key: &str) -> String {
    let dm = encoder();
    key.split_whitespace()
        .filter(|token| token.chars().any(|c| c.is_ascii_alphabetic()))
        .map(|token| dm.encode(&token.to_ascii_uppercase()))
        .filter(|code| !code.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fuzzy candidate: a snapshot key with its phonetic code precomputed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub phonetic: String,
}

impl Candidate {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let phonetic = phonetic_key(&key);
        Self { key, phonetic }
    }
}

/// Best fuzzy hit: the candidate key and its score
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit<'a> {
    pub key: &'a str,
    pub score: f64,
}

fn score_with_phonetic(query: &str, query_phonetic: &str, candidate: &Candidate) -> f64 {
    let spelled = strsim::normalized_levenshtein(query, &candidate.key) * 100.0;
    let sounded = if query_phonetic.is_empty() || candidate.phonetic.is_empty() {
        0.0
    } else {
        strsim::normalized_levenshtein(query_phonetic, &candidate.phonetic) * PHONETIC_WEIGHT
    };
    spelled.max(sounded)
}

/// Similarity of two normalized keys, 0-100
pub fn similarity(a: &str, b: &str) -> f64 {
    score_with_phonetic(a, &phonetic_key(a), &Candidate::new(b))
}

/// Highest-scoring candidate at or above `threshold`.
///
/// Ties keep the earliest candidate, so provider order decides between
/// equally good keys.
pub fn best_match<'a>(query: &str, candidates: &'a [Candidate], threshold: f64) -> Option<FuzzyHit<'a>> {
    if query.is_empty() {
        return None;
    }
    let query_phonetic = phonetic_key(query);

    let mut best: Option<FuzzyHit<'a>> = None;
    for candidate in candidates {
        let score = score_with_phonetic(query, &query_phonetic, candidate);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(FuzzyHit {
                key: &candidate.key,
                score,
            });
        }
    }

    best.filter(|hit| hit.score >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(keys: &[&str]) -> Vec<Candidate> {
        keys.iter().map(|k| Candidate::new(*k)).collect()
    }

    #[test]
    fn test_identical_keys_score_100() {
        assert_eq!(similarity("duke", "duke"), 100.0);
        assert_eq!(similarity("north carolina", "north carolina"), 100.0);
    }

    #[test]
    fn test_sound_alike_scores_phonetic_weight() {
        assert_eq!(phonetic_key("dook"), phonetic_key("duke"));
        let score = similarity("dook", "duke");
        assert!((score - PHONETIC_WEIGHT).abs() < 1e-9, "score={}", score);
    }

    #[test]
    fn test_phonetic_only_hits_stay_below_default_threshold() {
        let pool = candidates(&["duke", "rice", "georgia tech", "texas tech"]);
        for query in ["tech", "doug", "take", "rose", "ross"] {
            let score = pool
                .iter()
                .map(|c| similarity(query, &c.key))
                .fold(0.0, f64::max);
            assert!(score < DEFAULT_FUZZY_THRESHOLD, "{} scored {}", query, score);
            assert!(best_match(query, &pool, DEFAULT_FUZZY_THRESHOLD).is_none());
        }

        assert_eq!(similarity("tech", "duke"), PHONETIC_WEIGHT);
    }

    #[test]
    fn test_transposition_scores_high() {
        let score = similarity("villanvoa", "villanova");
        assert!(score >= 75.0, "score={}", score);
    }

    #[test]
    fn test_unrelated_keys_score_low() {
        assert!(similarity("completely fake team xyz", "duke") < 50.0);
        assert!(similarity("gonzaga", "syracuse") < 60.0);
    }

    #[test]
    fn test_best_match_prefers_highest() {
        let pool = candidates(&["duke", "north carolina", "villanova"]);
        let hit = best_match("north carolna", &pool, 85.0).unwrap();
        assert_eq!(hit.key, "north carolina");
        assert!(hit.score >= 85.0);
    }

    #[test]
    fn test_best_match_respects_threshold() {
        let pool = candidates(&["duke", "villanova"]);
        assert!(best_match("completely fake team xyz", &pool, 85.0).is_none());
        assert!(best_match("dook", &pool, 95.0).is_none());
        assert!(best_match("dook", &pool, 80.0).is_some());
    }

    #[test]
    fn test_best_match_tie_keeps_first_candidate() {
        let pool = candidates(&["miami fl", "miami oh"]);
        let hit = best_match("miami", &pool, 0.0).unwrap();
        assert_eq!(hit.key, "miami fl");

        let reversed = candidates(&["miami oh", "miami fl"]);
        let hit = best_match("miami", &reversed, 0.0).unwrap();
        assert_eq!(hit.key, "miami oh");
    }

    #[test]
    fn test_best_match_empty_inputs() {
        let pool = candidates(&["duke"]);
        assert!(best_match("", &pool, 0.0).is_none());
        assert!(best_match("duke", &[], 0.0).is_none());
    }

    #[test]
    fn test_phonetic_key_skips_tokens_without_letters() {
        assert_eq!(phonetic_key("123"), "");
        assert_eq!(phonetic_key("duke 2"), phonetic_key("duke"));
    }
}
