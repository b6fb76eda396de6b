//! Filesystem helpers for report and chart output

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};

/// Create a directory (and parents) if it doesn't exist
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| Error::write(dir, e))?;
    info!("Created output directory: {}", dir.display());
    Ok(())
}

/// Write `contents` to `path` atomically
///
/// The bytes go to a temporary file in the destination directory which is
/// then renamed over `path`. A failed write leaves any previous file intact
/// and never leaves a truncated one behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| Error::write(path, e))?;
    temp.write_all(contents).map_err(|e| Error::write(path, e))?;
    temp.flush().map_err(|e| Error::write(path, e))?;
    temp.persist(path).map_err(|e| Error::write(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report").join("out.md");

        write_atomic(&path, b"# Report\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Report\n");
    }

    #[test]
    fn test_write_atomic_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chart.svg");

        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");

        // No temp files left next to the target
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_atomic(&blocker.join("report.md"), b"x").unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }
}
