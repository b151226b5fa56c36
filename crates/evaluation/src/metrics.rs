//! Top-k retrieval metrics.

use data_loader::MovieId;
use std::collections::HashSet;

fn hits_at_k(recommended: &[MovieId], liked: &HashSet<MovieId>, k: usize) -> usize {
    let top: HashSet<MovieId> = recommended.iter().take(k).copied().collect();
    top.intersection(liked).count()
}

/// Relevant share of the first `k` recommendations.
///
/// The denominator is `min(k, recommended.len())`, so a short list is not
/// penalized for its missing slots. Empty input scores 0.
pub fn precision_at_k(recommended: &[MovieId], liked: &HashSet<MovieId>, k: usize) -> f64 {
    let denominator = k.min(recommended.len());
    if denominator == 0 {
        return 0.0;
    }
    hits_at_k(recommended, liked, k) as f64 / denominator as f64
}

/// Share of `liked` found in the first `k` recommendations. Empty `liked` scores 0.
pub fn recall_at_k(recommended: &[MovieId], liked: &HashSet<MovieId>, k: usize) -> f64 {
    if liked.is_empty() {
        return 0.0;
    }
    hits_at_k(recommended, liked, k) as f64 / liked.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn liked(ids: &[MovieId]) -> HashSet<MovieId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_precision_uses_short_list_length() {
        // 2 of 4 recommended are liked, k = 10
        assert_eq!(precision_at_k(&[1, 2, 3, 4], &liked(&[2, 4, 9]), 10), 0.5);
    }

    #[test]
    fn test_precision_truncates_to_k() {
        assert_eq!(precision_at_k(&[1, 2, 3, 4], &liked(&[1, 4]), 2), 0.5);
    }

    #[test]
    fn test_recall() {
        assert_eq!(recall_at_k(&[1, 2, 3], &liked(&[1, 3, 5, 7]), 10), 0.5);
        assert_eq!(recall_at_k(&[1, 2, 3], &liked(&[3]), 2), 0.0);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(precision_at_k(&[], &liked(&[1]), 10), 0.0);
        assert_eq!(recall_at_k(&[1], &liked(&[]), 10), 0.0);
    }

    #[test]
    fn test_duplicates_do_not_inflate() {
        let p = precision_at_k(&[1, 1, 1], &liked(&[1]), 3);
        assert!(p <= 1.0);
    }
}
