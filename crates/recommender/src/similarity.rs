//! Song Similarity Engine
//!
//! Pairwise cosine similarity between the song columns of an
//! [`InteractionMatrix`]:
//!
//! ```text
//! sim(i, j) = dot(col_i, col_j) / (|col_i| * |col_j|)
//! ```
//!
//! ## Algorithm
//! 1. Transpose the matrix once so every song column is contiguous
//! 2. Compute each column's L2 norm
//! 3. For every row `i` (in parallel) compute the upper triangle `j >= i`
//! 4. Mirror each value into `(j, i)`
//!
//! A column with no plays at all has norm 0; every similarity involving it
//! is 0, including its own diagonal cell. Each cell is a fixed sequential
//! reduction, so parallelism never changes the result.
//!
//! Cost is O(S² · U) time and O(S²) memory for S songs and U users.

use crate::matrix::InteractionMatrix;
use data_loader::SongId;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Dense symmetric song × song similarity matrix.
///
/// Shares the column order of the matrix it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct SongSimilarity {
    song_ids: Vec<SongId>,
    song_index: HashMap<SongId, usize>,
    values: Vec<f64>,
}

/// Cosine similarity of two equally long vectors.
///
/// Returns 0.0 when either vector is all zeros.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    cosine_with_norms(a, b, norm_a, norm_b)
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_with_norms(a: &[f64], b: &[f64], norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (norm_a * norm_b)).min(1.0)
}

impl SongSimilarity {
    /// Compute the full similarity matrix for every song column
    #[instrument(skip(matrix), fields(songs = matrix.n_songs(), users = matrix.n_users()))]
    pub fn compute(matrix: &InteractionMatrix) -> Self {
        let n = matrix.n_songs();
        let columns: Vec<Vec<f64>> = (0..n).map(|idx| matrix.column(idx)).collect();
        let norms: Vec<f64> = columns.iter().map(|c| l2_norm(c)).collect();

        // Upper triangle, one Vec per row i holding sim(i, i..n)
        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i..n)
                    .map(|j| {
                        if i == j {
                            if norms[i] > 0.0 { 1.0 } else { 0.0 }
                        } else {
                            cosine_with_norms(&columns[i], &columns[j], norms[i], norms[j])
                        }
                    })
                    .collect()
            })
            .collect();

        let mut values = vec![0.0; n * n];
        for (i, row) in upper.iter().enumerate() {
            for (offset, &sim) in row.iter().enumerate() {
                let j = i + offset;
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        let song_ids = matrix.song_ids().to_vec();
        let song_index = song_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        debug!("computed {}x{} song similarity matrix", n, n);

        Self {
            song_ids,
            song_index,
            values,
        }
    }

    /// Number of songs (rows == columns)
    pub fn len(&self) -> usize {
        self.song_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.song_ids.is_empty()
    }

    pub fn song_ids(&self) -> &[SongId] {
        &self.song_ids
    }

    pub fn song_index(&self, song_id: SongId) -> Option<usize> {
        self.song_index.get(&song_id).copied()
    }

    /// Similarities of the song at `idx` to every song, in column order.
    /// Panics if `idx >= len()`.
    pub fn row_at(&self, idx: usize) -> &[f64] {
        let n = self.len();
        &self.values[idx * n..(idx + 1) * n]
    }

    /// Similarity of two songs; `None` if either id is unknown
    pub fn get(&self, a: SongId, b: SongId) -> Option<f64> {
        let i = self.song_index(a)?;
        let j = self.song_index(b)?;
        Some(self.row_at(i)[j])
    }
}
