use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, SkelError};

// === Output Sink ===

/// Where the rendered skeleton goes.
#[derive(Debug, Clone)]
pub enum Sink {
    Stdout,
    File(PathBuf),
}

impl Sink {
    pub fn from_arg(output: Option<PathBuf>) -> Self {
        match output {
            Some(path) => Self::File(path),
            None => Self::Stdout,
        }
    }

    /// Write the complete text in one go. Callers render first, so a failed
    /// run never reaches the sink.
    pub fn write(&self, text: &str) -> Result<()> {
        match self {
            Self::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(text.as_bytes())
                    .and_then(|_| lock.flush())
                    .map_err(|e| SkelError::io("failed to write output", "<stdout>", e))?;
            }
            Self::File(path) => write_file(path, text)?,
        }
        tracing::debug!(sink = ?self, bytes = text.len(), "wrote skeleton");
        Ok(())
    }
}

/// Write through a temp file in the destination directory and rename it into
/// place; on failure the temp file is dropped and no partial file remains.
fn write_file(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| SkelError::io("failed to create output directory", &dir, e))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .map_err(|e| SkelError::io("failed to create output file", path, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| SkelError::io("failed to write output", path, e))?;
    tmp.persist(path)
        .map_err(|e| SkelError::io("failed to write output", path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/deeper/skeleton.go");

        Sink::File(out.clone()).write("package a\n").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "package a\n");
        // только итоговый файл, без временных
        let entries = std::fs::read_dir(out.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_file_sink_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("skeleton.go");
        std::fs::write(&out, "stale contents that are longer\n").unwrap();

        Sink::File(out.clone()).write("package b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "package b\n");
    }

    #[test]
    fn test_file_sink_reports_blocked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let err = Sink::File(blocker.join("out.go")).write("package a\n").unwrap_err();
        assert!(matches!(err, SkelError::Io { .. }));
        assert!(!blocker.join("out.go").exists());
    }

    #[test]
    fn test_from_arg() {
        assert!(matches!(Sink::from_arg(None), Sink::Stdout));
        assert!(matches!(
            Sink::from_arg(Some(PathBuf::from("o.go"))),
            Sink::File(_)
        ));
    }
}
