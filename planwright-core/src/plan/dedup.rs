//! Near-duplicate task suppression
//!
//! Tasks are compared as sets of normalized words. Two tasks are considered
//! duplicates when their Jaccard similarity reaches the threshold. The
//! comparison runs against every task accepted so far in the plan, not just
//! the current week.

use std::collections::HashSet;

use super::normalize::normalize_for_comparison;

/// Default similarity at or above which a task is a duplicate
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.85;

/// Jaccard similarity of the whitespace-delimited word sets of two strings
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a: HashSet<&str> = a.split_whitespace().collect();
    let b: HashSet<&str> = b.split_whitespace().collect();
    word_set_similarity(&a, &b)
}

fn word_set_similarity<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Check a candidate against previously accepted task descriptions
pub fn is_duplicate(candidate: &str, accepted: &[String], threshold: f64) -> bool {
    let candidate = normalize_for_comparison(candidate);
    accepted.iter().any(|existing| {
        let existing = normalize_for_comparison(existing);
        existing == candidate || jaccard_similarity(&candidate, &existing) >= threshold
    })
}

#[derive(Debug, Clone)]
struct AcceptedTask {
    normalized: String,
    words: HashSet<String>,
}

/// Running duplicate filter for a single parse
#[derive(Debug, Clone)]
pub struct DedupFilter {
    threshold: f64,
    accepted: Vec<AcceptedTask>,
}

impl DedupFilter {
    /// Create an empty filter with the given similarity threshold
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            accepted: Vec::new(),
        }
    }

    /// Similarity threshold in use
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of tasks accepted so far
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    /// Accept the candidate unless it duplicates an earlier task
    ///
    /// Returns `true` when the candidate was accepted and recorded.
    pub fn check_and_record(&mut self, candidate: &str) -> bool {
        let normalized = normalize_for_comparison(candidate);
        let words: HashSet<String> = normalized.split_whitespace().map(str::to_string).collect();

        let duplicate = self.accepted.iter().any(|existing| {
            existing.normalized == normalized
                || word_set_similarity(&existing.words, &words) >= self.threshold
        });

        if !duplicate {
            self.accepted.push(AcceptedTask { normalized, words });
        }
        !duplicate
    }
}

impl Default for DedupFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_THRESHOLD)
    }
}
