//! Dense ranking by aptitude score

use std::cmp::Ordering;

use crate::models::RankedEntry;

/// Ranking result: ranked entries best first, plus unscored indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub ranked: Vec<RankedEntry>,
    pub unscored: Vec<usize>,
}

/// Rank scores descending with dense ranks (ties share a rank, no gaps).
///
/// Undefined scores are left out of the ranking and listed as unscored.
/// Equal scores keep their input order.
///
/// # Examples
/// ```
/// use keiba::core::ranker::dense_rank;
///
/// let ranking = dense_rank(&[Some(80.0), Some(80.0), Some(75.0)]);
/// let ranks: Vec<u32> = ranking.ranked.iter().map(|r| r.rank).collect();
/// assert_eq!(ranks, vec![1, 1, 2]);
/// ```
pub fn dense_rank(scores: &[Option<f64>]) -> Ranking {
    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(scores.len());
    let mut unscored = Vec::new();

    for (i, score) in scores.iter().enumerate() {
        match score.filter(|s| !s.is_nan()) {
            Some(s) => scored.push((i, s)),
            None => unscored.push(i),
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut ranked = Vec::with_capacity(scored.len());
    let mut rank = 0u32;
    let mut previous: Option<f64> = None;

    for (index, score) in scored {
        if previous != Some(score) {
            rank += 1;
            previous = Some(score);
        }
        ranked.push(RankedEntry { index, score, rank });
    }

    Ranking { ranked, unscored }
}

/// Rank of each input position, `None` for unscored
pub fn ranks_by_index(ranking: &Ranking, len: usize) -> Vec<Option<u32>> {
    let mut ranks = vec![None; len];
    for entry in &ranking.ranked {
        if let Some(slot) = ranks.get_mut(entry.index) {
            *slot = Some(entry.rank);
        }
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(ranking: &Ranking) -> Vec<u32> {
        ranking.ranked.iter().map(|r| r.rank).collect()
    }

    #[test]
    fn test_dense_rank_with_ties() {
        let ranking = dense_rank(&[Some(80.0), Some(80.0), Some(75.0)]);
        assert_eq!(ranks(&ranking), vec![1, 1, 2]);
        assert!(ranking.unscored.is_empty());
    }

    #[test]
    fn test_sorts_descending() {
        let ranking = dense_rank(&[Some(45.0), Some(62.5), Some(50.0)]);
        let order: Vec<usize> = ranking.ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(ranks(&ranking), vec![1, 2, 3]);
    }

    #[test]
    fn test_no_rank_skipping() {
        let ranking = dense_rank(&[Some(70.0), Some(70.0), Some(70.0), Some(60.0), Some(55.0)]);
        assert_eq!(ranks(&ranking), vec![1, 1, 1, 2, 3]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranking = dense_rank(&[Some(50.0), Some(60.0), Some(50.0)]);
        let order: Vec<usize> = ranking.ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_unscored_excluded() {
        let ranking = dense_rank(&[None, Some(55.0), Some(f64::NAN), Some(48.0)]);
        assert_eq!(ranking.unscored, vec![0, 2]);
        assert_eq!(ranks(&ranking), vec![1, 2]);
    }

    #[test]
    fn test_ranks_by_index() {
        let ranking = dense_rank(&[Some(40.0), None, Some(60.0)]);
        assert_eq!(ranks_by_index(&ranking, 3), vec![Some(2), None, Some(1)]);
    }

    #[test]
    fn test_empty() {
        let ranking = dense_rank(&[]);
        assert!(ranking.ranked.is_empty());
        assert!(ranking.unscored.is_empty());
    }
}
