//! Snapshot files: JSON documents read whole at the start of a run and
//! written whole at the end.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::Account;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read any JSON document: account snapshots, rosters, boundaries, options.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn read_accounts(path: &Path) -> Result<Vec<Account>, SnapshotError> {
    let accounts: Vec<Account> = read_json(path)?;
    tracing::info!(path = %path.display(), accounts = accounts.len(), "loaded snapshot");
    Ok(accounts)
}

/// Pretty-print `value` to `path`.
///
/// Writes to a sibling temp file and renames it into place, so a failed run
/// never leaves a truncated snapshot behind. The temp file is removed if
/// writing fails.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path);
    if let Err(error) = write_pretty(&tmp_path, value) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            tracing::debug!(path = %tmp_path.display(), error = %cleanup, "temp file not removed");
        }
        return Err(error);
    }
    fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "wrote snapshot");
    Ok(())
}

/// `out/a.json` becomes `out/a.json.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
