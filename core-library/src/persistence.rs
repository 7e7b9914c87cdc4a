//! Session file persistence.
//!
//! A session file is a JSON object keyed by song title, pretty-printed with
//! four-space indentation. Saves are whole-file: the document is written to a
//! temporary sibling and renamed over the target, so a failed save never
//! leaves a truncated file behind.

use crate::error::{LibraryError, Result};
use crate::store::SongStore;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Parse a session document.
pub fn from_json_str(path: &Path, contents: &str) -> Result<SongStore> {
    serde_json::from_str(contents).map_err(|e| LibraryError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Render a session document with four-space indentation.
fn render(path: &Path, store: &SongStore) -> Result<String> {
    let format_error = |message: String| LibraryError::Format {
        path: path.to_path_buf(),
        message,
    };

    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    store
        .serialize(&mut serializer)
        .map_err(|e| format_error(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| format_error(e.to_string()))
}

/// Read and parse a session file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_store(path: &Path) -> Result<SongStore> {
    let contents = fs::read_to_string(path).map_err(|e| LibraryError::io(path, e))?;
    let store = from_json_str(path, &contents)?;
    debug!(songs = store.len(), "Session file parsed");
    Ok(store)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Serialize `store` and atomically replace `path` with it.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn save_store(path: &Path, store: &SongStore) -> Result<()> {
    let json = render(path, store)?;
    let tmp = temp_sibling(path);

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };

    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(LibraryError::io(path, e));
    }

    debug!(songs = store.len(), bytes = json.len(), "Session file written");
    Ok(())
}
