//! Plain-text tables for the terminal.

use core_library::{AlbumSummary, LeaderboardRow, SongRecord};
use std::fmt::Write;

fn width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.chars().count()))
        .max()
        .unwrap_or(0)
}

pub fn song_table(rows: &[LeaderboardRow]) -> String {
    if rows.is_empty() {
        return "No songs to show.\n".to_string();
    }

    let title_w = width(rows.iter().map(|r| r.title.as_str()), "Title");
    let album_w = width(rows.iter().map(|r| r.album.as_str()), "Album");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<title_w$}  {:>6}  {:>7}  {:<album_w$}",
        "#", "Title", "Score", "Matches", "Album"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>4}  {:<title_w$}  {:>6.0}  {:>7}  {:<album_w$}",
            row.rank, row.title, row.score, row.matches, row.album
        );
    }
    out
}

pub fn album_table(rows: &[AlbumSummary]) -> String {
    if rows.is_empty() {
        return "No albums to show.\n".to_string();
    }

    let album_w = width(rows.iter().map(|r| r.album.as_str()), "Album");
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:<album_w$}  {:>7}  {:>5}", "#", "Album", "Average", "Songs");
    for (i, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<album_w$}  {:>7.1}  {:>5}",
            i + 1,
            row.album,
            row.average_score,
            row.song_count
        );
    }
    out
}

/// One side of a matchup prompt, e.g. `Duchess - Duke (1980) [1216]`.
pub fn contender(title: &str, record: Option<&SongRecord>) -> String {
    match record {
        Some(record) => format!("{} - {} [{:.0}]", title, record.album, record.score),
        None => title.to_string(),
    }
}
