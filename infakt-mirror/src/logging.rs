use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_FILE_NAME: &str = "usage.log";
pub const MAX_LOG_BYTES: u64 = 25 * 1024 * 1024;
pub const MAX_ROTATED_FILES: usize = 5;

pub fn init(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    let rotated = rotate_if_needed(&log_path, MAX_LOG_BYTES, MAX_ROTATED_FILES)
        .with_context(|| format!("failed to rotate {}", log_path.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE_NAME));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stdout))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("failed to install tracing subscriber")?;

    if rotated {
        tracing::info!(path = %log_path.display(), "log file rotated");
    }
    Ok(guard)
}

pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }
    if max_files == 0 {
        fs::remove_file(log_path)?;
        return Ok(true);
    }

    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..max_files).rev() {
        let src = numbered_path(log_path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, numbered_path(log_path, 1))?;
    Ok(true)
}

fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(LOG_FILE_NAME);
    base.with_file_name(format!("{name}.{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn small_or_missing_files_are_left_alone() {
        let dir = tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        assert!(!rotate_if_needed(&log, 10, 5).unwrap());

        fs::write(&log, "short").unwrap();
        assert!(!rotate_if_needed(&log, 10, 5).unwrap());
        assert!(log.exists());
    }

    #[test]
    fn large_file_is_shifted_into_numbered_backups() {
        let dir = tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        fs::write(numbered_path(&log, 1), "older").unwrap();
        fs::write(&log, "0123456789ABC").unwrap();

        assert!(rotate_if_needed(&log, 10, 5).unwrap());

        assert!(!log.exists());
        assert_eq!(fs::read_to_string(numbered_path(&log, 1)).unwrap(), "0123456789ABC");
        assert_eq!(fs::read_to_string(numbered_path(&log, 2)).unwrap(), "older");
    }

    #[test]
    fn oldest_backup_is_dropped() {
        let dir = tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        for n in 1..=2 {
            fs::write(numbered_path(&log, n), format!("backup {n}")).unwrap();
        }
        fs::write(&log, "0123456789ABC").unwrap();

        assert!(rotate_if_needed(&log, 10, 2).unwrap());

        assert_eq!(fs::read_to_string(numbered_path(&log, 2)).unwrap(), "backup 1");
        assert!(!numbered_path(&log, 3).exists());
    }
}
