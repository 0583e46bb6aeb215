use crate::errors::{StackError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Atomic file operations to prevent corruption during writes
pub mod atomic_file {
    use super::*;

    /// Write JSON data to a file atomically using a temporary file + rename strategy
    pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| StackError::config(format!("Failed to serialize data: {e}")))?;

        write_string(path, &content)
    }

    /// Write string content to a file atomically
    pub fn write_string(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            crate::config::ensure_state_dir(parent)?;
        }

        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, content)
            .map_err(|e| StackError::config(format!("Failed to write temporary file: {e}")))?;

        atomic_rename(&temp_path, path)
    }

    /// Read JSON data written by [`write_json`]; `None` if the file does not exist
    pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StackError::config(format!("Failed to read {}: {e}", path.display())))?;

        let data = serde_json::from_str(&content)
            .map_err(|e| StackError::config(format!("Failed to parse {}: {e}", path.display())))?;

        Ok(Some(data))
    }

    /// Remove a file and prune its directory if that leaves it empty
    pub fn remove(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .map_err(|e| StackError::config(format!("Failed to remove {}: {e}", path.display())))?;
        }

        if let Some(parent) = path.parent() {
            // Only succeeds on empty directories
            let _ = fs::remove_dir(parent);
        }

        Ok(())
    }

    #[cfg(windows)]
    fn atomic_rename(temp_path: &Path, final_path: &Path) -> Result<()> {
        const MAX_RETRIES: u32 = 3;
        const RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(100);

        let mut attempt = 1;
        loop {
            match fs::rename(temp_path, final_path) {
                Ok(()) => return Ok(()),
                Err(e) if attempt == MAX_RETRIES => {
                    let _ = fs::remove_file(temp_path);
                    return Err(StackError::config(format!(
                        "Failed to finalize file write after {MAX_RETRIES} attempts on Windows: {e}"
                    )));
                }
                Err(_) => {
                    std::thread::sleep(RETRY_DELAY);
                    attempt += 1;
                }
            }
        }
    }

    #[cfg(not(windows))]
    fn atomic_rename(temp_path: &Path, final_path: &Path) -> Result<()> {
        fs::rename(temp_path, final_path)
            .map_err(|e| StackError::config(format!("Failed to finalize file write: {e}")))?;
        Ok(())
    }
}
