//! Parser for MovieLens CSV files.
//!
//! - ratings.csv: userId,movieId,rating,timestamp
//! - movies.csv: movieId,title,genres (titles may be quoted and contain commas)
//! - tags.csv: userId,movieId,tag,timestamp
//!
//! Every parser has a `*_from_reader` twin so callers (and tests) can feed
//! in-memory data.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    genres: String,
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    tag: String,
    timestamp: i64,
}

/// Open a dataset file, mapping "not found" onto the data-unavailable error
fn open_dataset_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::DataUnavailable {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Deserialize every record of a headered CSV stream.
fn read_records<T, R>(reader: R, file: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    csv_reader
        .deserialize()
        .map(|record| {
            record.map_err(|source| DataLoadError::CsvError {
                file: file.to_string(),
                source,
            })
        })
        .collect()
}

pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = open_dataset_file(path)?;
    parse_ratings_from_reader(file, &file_label(path))
}

pub fn parse_ratings_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Rating>> {
    let records: Vec<RatingRecord> = read_records(reader, file)?;
    Ok(records
        .into_iter()
        .map(|r| Rating {
            user_id: r.user_id,
            movie_id: r.movie_id,
            rating: r.rating,
            timestamp: r.timestamp,
        })
        .collect())
}

pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = open_dataset_file(path)?;
    parse_movies_from_reader(file, &file_label(path))
}

pub fn parse_movies_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Movie>> {
    let records: Vec<MovieRecord> = read_records(reader, file)?;
    let mut movies = Vec::with_capacity(records.len());

    for (idx, record) in records.into_iter().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let line = idx + 2;
        let genres = parse_genres(&record.genres).map_err(|e| DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: e.to_string(),
        })?;

        movies.push(Movie {
            id: record.movie_id,
            year: extract_year_from_title(&record.title),
            title: record.title,
            genres,
        });
    }
    Ok(movies)
}

pub fn parse_tags(path: &Path) -> Result<Vec<Tag>> {
    let file = open_dataset_file(path)?;
    parse_tags_from_reader(file, &file_label(path))
}

pub fn parse_tags_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Tag>> {
    let records: Vec<TagRecord> = read_records(reader, file)?;
    Ok(records
        .into_iter()
        .map(|r| Tag {
            user_id: r.user_id,
            movie_id: r.movie_id,
            tag: r.tag,
            timestamp: r.timestamp,
        })
        .collect())
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let title = title.trim_end();
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end && end == title.len() - 1 {
        return title[start + 1..end].parse::<u16>().ok();
    }
    None
}

/// Parse a genre label into the Genre enum
///
/// Example: "Action" -> Ok(Genre::Action)
///          "Sci-Fi" -> Ok(Genre::SciFi)
pub fn parse_genre(s: &str) -> Result<Genre> {
    match s {
        "(no genres listed)" => Ok(Genre::NoGenresListed),
        "Action" => Ok(Genre::Action),
        "Adventure" => Ok(Genre::Adventure),
        "Animation" => Ok(Genre::Animation),
        // Older MovieLens releases spell it with an apostrophe
        "Children" | "Children's" => Ok(Genre::Children),
        "Comedy" => Ok(Genre::Comedy),
        "Crime" => Ok(Genre::Crime),
        "Documentary" => Ok(Genre::Documentary),
        "Drama" => Ok(Genre::Drama),
        "Fantasy" => Ok(Genre::Fantasy),
        "Film-Noir" => Ok(Genre::FilmNoir),
        "Horror" => Ok(Genre::Horror),
        "IMAX" => Ok(Genre::Imax),
        "Musical" => Ok(Genre::Musical),
        "Mystery" => Ok(Genre::Mystery),
        "Romance" => Ok(Genre::Romance),
        "Sci-Fi" => Ok(Genre::SciFi),
        "Thriller" => Ok(Genre::Thriller),
        "War" => Ok(Genre::War),
        "Western" => Ok(Genre::Western),
        _ => Err(DataLoadError::InvalidValue {
            field: "genre".to_string(),
            value: s.to_string(),
        }),
    }
}

/// Parse pipe-separated genres
///
/// Example: "Action|Adventure|Sci-Fi" -> vec![Genre::Action, Genre::Adventure, Genre::SciFi]
fn parse_genres(s: &str) -> Result<Vec<Genre>> {
    s.split('|')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(parse_genre)
        .collect()
}
