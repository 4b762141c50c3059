//! File utility functions.

use crate::error::{Result, StatforgeError};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively find files with given extension in a directory.
pub fn find_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(StatforgeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            if let Some(ext) = entry.path().extension() {
                if ext == extension {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Decode pasted text. UTF-8 first; files saved by older Windows editors
/// fall back to Windows-1252, which maps every byte, so decoding never fails.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let bytes = err.into_bytes();
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            tracing::debug!("Decoded {} bytes as Windows-1252", bytes.len());
            text.into_owned()
        }
    }
}

/// Read a text file (UTF-8 with Windows-1252 fallback).
pub fn read_text_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        tracing::warn!("Failed to read {}: {}", path.display(), e);
        e
    })?;
    Ok(decode_text(bytes))
}

/// Read from `path`, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => read_text_file(path),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes)?;
            Ok(decode_text(bytes))
        }
    }
}

/// Write a record as pretty JSON to `<dir>/<key>`, creating `dir` if needed.
pub fn write_record<T: Serialize>(dir: &Path, key: &str, record: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(key);
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(&path, json)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}
