use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::Mutex as PlMutex;

/// Append-only, per-logger-name text sink.
///
/// Each record is written as `"[" + ddMMyy HH:mm:ss + "] " + message + "\n"`.
/// If a file with the same logger name already exists in `dir` when the
/// sink is constructed, it is archived into `dir/Archive/` first so a
/// fresh run never silently appends to (or clobbers) a prior run's log.
pub struct FileSink {
    file: PlMutex<File>,
}

impl FileSink {
    pub fn new(dir: impl AsRef<Path>, logger_name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("creating log directory")?;

        let path = dir.join(format!("{logger_name}.log"));
        if path.exists() {
            Self::archive(dir, &path, logger_name)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;

        Ok(Self {
            file: PlMutex::new(file),
        })
    }

    fn archive(dir: &Path, existing: &Path, logger_name: &str) -> Result<()> {
        let archive_dir = dir.join("Archive");
        fs::create_dir_all(&archive_dir).context("creating Archive directory")?;

        let stamp = Local::now().format("%d%m%y_%H%M%S");
        let archived: PathBuf = archive_dir.join(format!("{logger_name}_{stamp}.log"));

        fs::rename(existing, &archived)
            .with_context(|| format!("archiving prior log to {}", archived.display()))?;
        Ok(())
    }

    /// Appends one record. Never propagates I/O failure into the caller's
    /// hot path; log it and move on, per the error-handling design.
    pub fn append(&self, message: &str) {
        let line = format!("[{}] {}\n", Local::now().format("%d%m%y %H:%M:%S"), message);
        let mut f = self.file.lock();
        if let Err(e) = f.write_all(line.as_bytes()) {
            tracing::warn!(error = %e, "file sink write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path(), "fleet").unwrap();
        sink.append("hello");
        sink.append("world");

        let contents = fs::read_to_string(dir.path().join("fleet.log")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("hello"));
    }

    #[test]
    fn archives_prior_log_on_construction() {
        let dir = tempfile::tempdir().unwrap();

        {
            let sink = FileSink::new(dir.path(), "fleet").unwrap();
            sink.append("first run");
        }

        let sink = FileSink::new(dir.path(), "fleet").unwrap();
        sink.append("second run");

        let archive_dir = dir.path().join("Archive");
        let archived: Vec<_> = fs::read_dir(&archive_dir).unwrap().collect();
        assert_eq!(archived.len(), 1);

        let contents = fs::read_to_string(dir.path().join("fleet.log")).unwrap();
        assert!(contents.contains("second run"));
        assert!(!contents.contains("first run"));
    }
}
