//! One-hot genre encoding.

use data_loader::{Genre, Movie};

/// Width of a genre vector: one flag per known genre
pub const GENRE_DIMENSION: usize = Genre::ALL.len();

/// Flags in [`Genre::ALL`] order, `1.0` where the movie carries the genre.
pub fn genre_one_hot(movie: &Movie) -> Vec<f64> {
    let mut flags = vec![0.0; GENRE_DIMENSION];
    for genre in &movie.genres {
        flags[genre.index()] = 1.0;
    }
    flags
}

/// Genres as space-separated words, the text form fed into TF-IDF
pub fn genre_text(movie: &Movie) -> String {
    movie
        .genres
        .iter()
        .map(|g| g.label())
        .collect::<Vec<_>>()
        .join(" ")
}
