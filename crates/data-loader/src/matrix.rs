//! Dense user × item rating table.
//!
//! Rows are the users present in the training partition, columns the items
//! present in the training partition, both in ascending id order. A cell holds
//! the rating or `0.0` for "unrated".
//!
//! On disk the matrix is stored as sparse triples and densified again on load.

use crate::error::DataLoadError;
use crate::types::{MovieId, Rating, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SparseMatrix", into = "SparseMatrix")]
pub struct UserItemMatrix {
    users: Vec<UserId>,
    items: Vec<MovieId>,
    /// Row-major, `users.len() * items.len()` cells
    values: Vec<f32>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<MovieId, usize>,
}

impl UserItemMatrix {
    /// Pivot rating events into a matrix. A repeated (user, item) pair keeps
    /// the last rating seen.
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let users: Vec<UserId> = ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let items: Vec<MovieId> = ratings
            .iter()
            .map(|r| r.movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut matrix = Self::zeros(users, items);
        for r in ratings {
            let row = matrix.user_index[&r.user_id];
            let col = matrix.item_index[&r.movie_id];
            let width = matrix.items.len();
            matrix.values[row * width + col] = r.rating;
        }
        matrix
    }

    fn zeros(users: Vec<UserId>, items: Vec<MovieId>) -> Self {
        let user_index = users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let item_index = items.iter().enumerate().map(|(i, &m)| (m, i)).collect();
        Self {
            values: vec![0.0; users.len() * items.len()],
            users,
            items,
            user_index,
            item_index,
        }
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Row labels, ascending
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Column labels, ascending
    pub fn items(&self) -> &[MovieId] {
        &self.items
    }

    pub fn user_position(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn item_position(&self, movie_id: MovieId) -> Option<usize> {
        self.item_index.get(&movie_id).copied()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    /// Rating row by position. Panics if `row` is out of range.
    pub fn row(&self, row: usize) -> &[f32] {
        let width = self.items.len();
        &self.values[row * width..(row + 1) * width]
    }

    pub fn user_row(&self, user_id: UserId) -> Option<&[f32]> {
        self.user_position(user_id).map(|row| self.row(row))
    }

    /// Rating for a (user, item) pair, `0.0` when unrated or unknown
    pub fn get(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        match (self.user_position(user_id), self.item_position(movie_id)) {
            (Some(row), Some(col)) => self.values[row * self.items.len() + col],
            _ => 0.0,
        }
    }

    /// Whether the backing storage matches the declared shape
    pub fn is_consistent(&self) -> bool {
        self.values.len() == self.users.len() * self.items.len()
            && self.user_index.len() == self.users.len()
            && self.item_index.len() == self.items.len()
    }

    /// Mean of every column, zeros (unrated) included
    pub fn column_means(&self) -> Vec<f64> {
        let n_items = self.items.len();
        let mut sums = vec![0.0f64; n_items];
        for row in 0..self.users.len() {
            for (sum, &value) in sums.iter_mut().zip(self.row(row)) {
                *sum += value as f64;
            }
        }
        let n_users = self.users.len().max(1) as f64;
        sums.into_iter().map(|s| s / n_users).collect()
    }

    /// Number of non-zero cells
    pub fn nnz(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0.0).count()
    }
}

/// Serialized form: labels plus the non-zero cells
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SparseMatrix {
    users: Vec<UserId>,
    items: Vec<MovieId>,
    /// (row, column, rating)
    entries: Vec<(u32, u32, f32)>,
}

impl From<UserItemMatrix> for SparseMatrix {
    fn from(matrix: UserItemMatrix) -> Self {
        let width = matrix.items.len();
        let entries = matrix
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, &v)| ((i / width) as u32, (i % width) as u32, v))
            .collect();
        SparseMatrix {
            users: matrix.users,
            items: matrix.items,
            entries,
        }
    }
}

impl TryFrom<SparseMatrix> for UserItemMatrix {
    type Error = DataLoadError;

    fn try_from(sparse: SparseMatrix) -> Result<Self, Self::Error> {
        let (n_users, n_items) = (sparse.users.len(), sparse.items.len());
        let mut matrix = Self::zeros(sparse.users, sparse.items);

        if matrix.user_index.len() != n_users || matrix.item_index.len() != n_items {
            return Err(DataLoadError::ValidationError(
                "duplicate row or column label in stored matrix".to_string(),
            ));
        }

        for (row, col, value) in sparse.entries {
            let (row, col) = (row as usize, col as usize);
            if row >= n_users || col >= n_items {
                return Err(DataLoadError::ValidationError(format!(
                    "stored cell ({row}, {col}) outside a {n_users}x{n_items} matrix"
                )));
            }
            matrix.values[row * n_items + col] = value;
        }
        Ok(matrix)
    }
}
