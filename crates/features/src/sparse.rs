//! Sparse feature vectors.
//!
//! Genre flags and TF-IDF weights are almost entirely zero, so vectors keep
//! only their non-zero entries as `(index, weight)` pairs sorted by index.
//! Dot products are a merge-join over the two index lists.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseVector {
    /// Non-zero entries, strictly increasing by index
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the non-zero slots of a dense vector
    pub fn from_dense(dense: &[f64]) -> Self {
        let entries = dense
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w != 0.0)
            .map(|(i, &w)| (i as u32, w))
            .collect();
        Self { entries }
    }

    /// Build from arbitrary `(index, weight)` pairs. Entries are sorted,
    /// repeated indices are summed and zeros dropped.
    pub fn from_entries(mut entries: Vec<(u32, f64)>) -> Self {
        entries.sort_by_key(|&(i, _)| i);

        let mut merged: Vec<(u32, f64)> = Vec::with_capacity(entries.len());
        for (index, weight) in entries {
            match merged.last_mut() {
                Some((last, total)) if *last == index => *total += weight,
                _ => merged.push((index, weight)),
            }
        }
        merged.retain(|&(_, w)| w != 0.0);
        Self { entries: merged }
    }

    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight at `index`, 0 when absent
    pub fn get(&self, index: u32) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Largest stored index, `None` for the zero vector
    pub fn max_index(&self) -> Option<u32> {
        self.entries.last().map(|&(i, _)| i)
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn l2_norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Unit-length copy; the zero vector stays zero
    pub fn normalized(&self) -> Self {
        let norm = self.l2_norm();
        if norm == 0.0 {
            return self.clone();
        }
        Self {
            entries: self.entries.iter().map(|&(i, w)| (i, w / norm)).collect(),
        }
    }

    /// Append `other` shifted by `offset`. Every index of `other` plus
    /// `offset` must be above this vector's largest index.
    pub fn append_block(&mut self, other: &SparseVector, offset: u32) {
        debug_assert!(
            other.is_zero() || self.max_index().is_none_or(|m| m < offset),
            "appended block overlaps existing entries"
        );
        self.entries
            .extend(other.entries.iter().map(|&(i, w)| (i + offset, w)));
    }

    pub fn to_dense(&self, dimension: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dimension];
        for &(i, w) in &self.entries {
            if let Some(slot) = dense.get_mut(i as usize) {
                *slot = w;
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dense_keeps_non_zero_slots() {
        let v = SparseVector::from_dense(&[0.0, 2.0, 0.0, -1.0]);
        assert_eq!(v.entries(), &[(1, 2.0), (3, -1.0)]);
        assert_eq!(v.get(3), -1.0);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.to_dense(5), vec![0.0, 2.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_from_entries_sorts_and_merges() {
        let v = SparseVector::from_entries(vec![(7, 1.0), (2, 0.5), (7, 2.0), (4, 0.0)]);
        assert_eq!(v.entries(), &[(2, 0.5), (7, 3.0)]);
        assert_eq!(v.max_index(), Some(7));
    }

    #[test]
    fn test_dot_matches_dense_dot() {
        let a = [1.0, 0.0, 3.0, 0.0, 2.0];
        let b = [0.0, 4.0, 0.5, 0.0, 1.0];
        let dense: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();

        let sa = SparseVector::from_dense(&a);
        let sb = SparseVector::from_dense(&b);
        assert_eq!(sa.dot(&sb), dense);
        assert_eq!(sb.dot(&sa), dense);
    }

    #[test]
    fn test_normalized_has_unit_length() {
        let v = SparseVector::from_dense(&[3.0, 0.0, 4.0]).normalized();
        assert!((v.l2_norm() - 1.0).abs() < 1e-12);
        assert!(SparseVector::new().normalized().is_zero());
    }

    #[test]
    fn test_append_block_offsets_indices() {
        let mut v = SparseVector::from_dense(&[1.0, 0.0]);
        v.append_block(&SparseVector::from_entries(vec![(0, 0.5), (3, 0.25)]), 2);
        assert_eq!(v.entries(), &[(0, 1.0), (2, 0.5), (5, 0.25)]);
    }

    #[test]
    fn test_serializes_as_pairs() {
        let v = SparseVector::from_entries(vec![(4, 0.5)]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[[4,0.5]]");
    }
}
