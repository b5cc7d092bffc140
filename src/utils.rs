// ABOUTME: Utility functions for the deck-forge application
// ABOUTME: Provides file validation and output helpers for the CLI

use crate::errors::{DeckError, Result};
use serde::Serialize;
use std::path::Path;

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::ValidationError(format!(
            "Path not found: {:?}",
            path
        )));
    }
    if !path.is_file() {
        return Err(DeckError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(DeckError::FileReadError)?;
        } else if !parent.is_dir() {
            return Err(DeckError::ValidationError(format!(
                "Path exists but is not a directory: {:?}",
                parent
            )));
        }
    }
    Ok(())
}

/// Pretty JSON to `path` when given, stdout otherwise.
pub fn write_json_output<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            ensure_parent_directory_exists(path)?;
            std::fs::write(path, json)?;
        }
        None => println!("{}", json),
    }
    Ok(())
}
