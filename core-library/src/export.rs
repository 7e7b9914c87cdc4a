//! CSV export of the song leaderboard.
//!
//! Columns are `Title,Artist,Album,Year,Rank,Score`, the layout most playlist
//! importers accept. Scores are truncated toward zero. Fields are quoted only
//! when they contain a comma, a quote or a line break, and rows end in CRLF.

use crate::error::{LibraryError, Result};
use crate::models::LeaderboardRow;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, instrument};

pub const CSV_HEADER: [&str; 6] = ["Title", "Artist", "Album", "Year", "Rank", "Score"];

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_record<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\r\n")
}

/// Write the header and one line per row.
pub fn write_csv<W: Write>(writer: &mut W, rows: &[LeaderboardRow]) -> io::Result<()> {
    write_record(writer, &CSV_HEADER)?;
    for row in rows {
        let rank = row.rank.to_string();
        let score = (row.score.trunc() as i64).to_string();
        write_record(
            writer,
            &[
                row.title.as_str(),
                row.artist.as_str(),
                row.album.as_str(),
                row.year.as_str(),
                rank.as_str(),
                score.as_str(),
            ],
        )?;
    }
    Ok(())
}

/// Render the CSV document in memory.
pub fn to_csv_string(rows: &[LeaderboardRow]) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_csv(&mut buffer, rows);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Export rows to `path`. An empty leaderboard is rejected.
#[instrument(level = "debug", skip(rows), fields(path = %path.display(), rows = rows.len()))]
pub fn export_csv(path: &Path, rows: &[LeaderboardRow]) -> Result<usize> {
    if rows.is_empty() {
        return Err(LibraryError::InvalidInput {
            field: "rows".to_string(),
            message: "No songs to export".to_string(),
        });
    }

    fs::write(path, to_csv_string(rows)).map_err(|e| LibraryError::io(path, e))?;
    info!(count = rows.len(), "Exported leaderboard");
    Ok(rows.len())
}
