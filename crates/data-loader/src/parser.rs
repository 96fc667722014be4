//! Parser for the listening-history CSV files.
//!
//! - user.csv: `user_id[,...]`
//! - songs.csv: `song_id,title,artist[,...]`
//! - listen_history.csv: `user_id,song_id,listen_count[,...]`
//!
//! Every file starts with a header row. Columns are located by name, so
//! extra columns and column order do not matter. Quoting follows RFC 4180
//! via the `csv` crate.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;

pub const USERS_FILE: &str = "user.csv";
pub const SONGS_FILE: &str = "songs.csv";
pub const LISTEN_HISTORY_FILE: &str = "listen_history.csv";

/// Read a whole file as text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; song metadata
/// scraped from the wild is rarely clean.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Rows of user.csv
#[derive(Debug, Deserialize)]
struct UserRow {
    user_id: UserId,
}

/// Rows of songs.csv
#[derive(Debug, Deserialize)]
struct SongRow {
    song_id: SongId,
    title: String,
    artist: String,
}

/// Rows of listen_history.csv
#[derive(Debug, Deserialize)]
struct ListenRow {
    user_id: UserId,
    song_id: SongId,
    listen_count: f64,
}

fn csv_error(file: &str, err: &csv::Error) -> DataLoadError {
    DataLoadError::ParseError {
        file: file.to_string(),
        line: err.position().map_or(1, |p| p.line() as usize),
        reason: err.to_string(),
    }
}

/// Deserialize every data row of `content` into `T`.
///
/// Header names are matched case-insensitively; each of `required` must be
/// present or the whole file is rejected with `MissingColumn`.
fn read_rows<T: DeserializeOwned>(file: &str, content: &str, required: &[&str]) -> Result<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| csv_error(file, &e))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();

    if let Some(column) = required.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(DataLoadError::MissingColumn {
            file: file.to_string(),
            column: column.to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(file, &e))?;
        let row = record
            .deserialize(Some(&headers))
            .map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line: record.position().map_or(1, |p| p.line() as usize),
                reason: e.to_string(),
            })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Parse the contents of user.csv
pub fn parse_users_str(content: &str) -> Result<Vec<User>> {
    let rows: Vec<UserRow> = read_rows(USERS_FILE, content, &["user_id"])?;
    Ok(rows.into_iter().map(|r| User { id: r.user_id }).collect())
}

/// Parse the contents of songs.csv
pub fn parse_songs_str(content: &str) -> Result<Vec<Song>> {
    let rows: Vec<SongRow> = read_rows(SONGS_FILE, content, &["song_id", "title", "artist"])?;
    Ok(rows
        .into_iter()
        .map(|r| Song {
            id: r.song_id,
            title: r.title,
            artist: r.artist,
        })
        .collect())
}

/// Parse the contents of listen_history.csv
///
/// Counts are parsed as floating point so both `3` and `3.0` are accepted.
/// Range checks happen in `DataIndex::validate`, not here.
pub fn parse_listen_events_str(content: &str) -> Result<Vec<ListenEvent>> {
    let rows: Vec<ListenRow> = read_rows(
        LISTEN_HISTORY_FILE,
        content,
        &["user_id", "song_id", "listen_count"],
    )?;
    Ok(rows
        .into_iter()
        .map(|r| ListenEvent::new(r.user_id, r.song_id, r.listen_count))
        .collect())
}

pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    parse_users_str(&read_text(path)?)
}

pub fn parse_songs(path: &Path) -> Result<Vec<Song>> {
    parse_songs_str(&read_text(path)?)
}

pub fn parse_listen_events(path: &Path) -> Result<Vec<ListenEvent>> {
    parse_listen_events_str(&read_text(path)?)
}
