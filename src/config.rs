use std::collections::HashSet;

use crate::error::AlignmentError;

/// Stopwords excluded from anchor content: an n-gram made mostly of these
/// matches all over a book and carries no positional information.
const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had", "has",
    "have", "he", "her", "his", "i", "in", "is", "it", "its", "my", "no", "not", "of", "on", "or",
    "she", "so", "that", "the", "their", "them", "they", "this", "to", "was", "we", "were", "with",
    "you",
];

/// Disfluency tokens the ASR emits that have no manuscript counterpart.
const DEFAULT_FILLERS: &[&str] = &["ah", "eh", "er", "erm", "hm", "hmm", "huh", "mhm", "uh", "um"];

/// Spelling variants and read-aloud expansions treated as near-free
/// substitutions during windowed alignment.
const DEFAULT_EQUIVALENCES: &[(&str, &str)] = &[
    ("gray", "grey"),
    ("toward", "towards"),
    ("ok", "okay"),
    ("mr", "mister"),
    ("mrs", "missus"),
    ("dr", "doctor"),
    ("st", "saint"),
];

#[derive(Debug, Clone)]
pub struct AlignPolicy {
    /// Starting n-gram size for anchor discovery.
    pub ngram_size: usize,
    /// Floor for density-driven n-gram relaxation. Never below 2.
    pub min_ngram_size: usize,
    /// Desired anchor density: ~1 anchor per this many book tokens.
    pub target_per_tokens: usize,
    /// Minimum token distance between repeat occurrences accepted by the
    /// relaxed (two-occurrence) anchor pass.
    pub min_separation: usize,
    /// Allow anchors whose n-gram crosses a book sentence boundary.
    pub allow_sentence_spanning: bool,
    pub stopwords: HashSet<String>,
    pub fillers: HashSet<String>,
    pub(crate) equivalences: HashSet<(String, String)>,
}

impl AlignPolicy {
    pub const DEFAULT_NGRAM_SIZE: usize = 3;
    pub const DEFAULT_MIN_NGRAM_SIZE: usize = 2;
    pub const DEFAULT_TARGET_PER_TOKENS: usize = 50;
    pub const DEFAULT_MIN_SEPARATION: usize = 100;

    pub fn with_equivalence(mut self, a: &str, b: &str) -> Self {
        self.equivalences.insert(equivalence_key(a, b));
        self
    }

    pub fn are_equivalent(&self, a: &str, b: &str) -> bool {
        self.equivalences.contains(&equivalence_key(a, b))
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.min_ngram_size < 2 {
            return Err(AlignmentError::invalid_input(format!(
                "min_ngram_size must be at least 2, got {}",
                self.min_ngram_size
            )));
        }
        if self.ngram_size < self.min_ngram_size {
            return Err(AlignmentError::invalid_input(format!(
                "ngram_size {} below min_ngram_size {}",
                self.ngram_size, self.min_ngram_size
            )));
        }
        if self.target_per_tokens == 0 {
            return Err(AlignmentError::invalid_input(
                "target_per_tokens must be positive",
            ));
        }
        Ok(())
    }
}

/// Pairs are stored orientation-free.
fn equivalence_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl Default for AlignPolicy {
    fn default() -> Self {
        Self {
            ngram_size: Self::DEFAULT_NGRAM_SIZE,
            min_ngram_size: Self::DEFAULT_MIN_NGRAM_SIZE,
            target_per_tokens: Self::DEFAULT_TARGET_PER_TOKENS,
            min_separation: Self::DEFAULT_MIN_SEPARATION,
            allow_sentence_spanning: false,
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            fillers: DEFAULT_FILLERS.iter().map(|s| s.to_string()).collect(),
            equivalences: DEFAULT_EQUIVALENCES
                .iter()
                .map(|(a, b)| equivalence_key(a, b))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults() {
        let policy = AlignPolicy::default();
        assert_eq!(policy.ngram_size, 3);
        assert_eq!(policy.min_ngram_size, 2);
        assert_eq!(policy.target_per_tokens, 50);
        assert!(!policy.allow_sentence_spanning);
        assert!(policy.stopwords.contains("the"));
        assert!(policy.fillers.contains("um"));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn equivalence_is_symmetric() {
        let policy = AlignPolicy::default();
        assert!(policy.are_equivalent("gray", "grey"));
        assert!(policy.are_equivalent("grey", "gray"));
        assert!(!policy.are_equivalent("gray", "blue"));
    }

    #[test]
    fn with_equivalence_extends_table() {
        let policy = AlignPolicy::default().with_equivalence("theatre", "theater");
        assert!(policy.are_equivalent("theater", "theatre"));
    }

    #[test]
    fn validate_rejects_ngram_floor_below_two() {
        let policy = AlignPolicy {
            min_ngram_size: 1,
            ..AlignPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn validate_rejects_ngram_below_floor() {
        let policy = AlignPolicy {
            ngram_size: 2,
            min_ngram_size: 3,
            ..AlignPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_density_target() {
        let policy = AlignPolicy {
            target_per_tokens: 0,
            ..AlignPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
