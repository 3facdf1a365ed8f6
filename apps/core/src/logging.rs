use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::Level;

const LOG_FILE_NAME: &str = "quickswitch.log";
const ARCHIVE_PREFIX: &str = "quickswitch-";
const MAX_LOG_BYTES: u64 = 1_000_000;
const MAX_ARCHIVES: usize = 5;

static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to install subscriber: {0}")]
    Install(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Sends events to `<log_dir>/quickswitch.log`, archiving the current file
/// first when it has grown past the size cap. Returns the log file path.
pub fn init(log_dir: &Path, verbose: bool) -> Result<PathBuf, LoggingError> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate_if_needed(&log_path, log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level(verbose))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    install_panic_hook();
    tracing::info!(path = %log_path.display(), "logging initialized");
    Ok(log_path)
}

pub fn init_stderr(verbose: bool) -> Result<(), LoggingError> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level(verbose))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    install_panic_hook();
    Ok(())
}

fn max_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn rotate_if_needed(log_path: &Path, log_dir: &Path) -> Result<(), std::io::Error> {
    let meta = match fs::metadata(log_path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    if meta.len() < MAX_LOG_BYTES {
        return Ok(());
    }

    let mut stamp = now_secs();
    let mut archived = log_dir.join(format!("{ARCHIVE_PREFIX}{stamp}.log"));
    while archived.exists() {
        stamp += 1;
        archived = log_dir.join(format!("{ARCHIVE_PREFIX}{stamp}.log"));
    }
    fs::rename(log_path, archived)?;
    prune_old_archives(log_dir)
}

fn prune_old_archives(log_dir: &Path) -> Result<(), std::io::Error> {
    let mut archives = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".log"))
        })
        .collect::<Vec<_>>();

    archives.sort();
    while archives.len() > MAX_ARCHIVES {
        let oldest = archives.remove(0);
        let _ = fs::remove_file(oldest);
    }
    Ok(())
}

fn install_panic_hook() {
    let _ = PANIC_HOOK_INSTALLED.get_or_init(|| {
        let prior = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let payload = panic_info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload unavailable".to_string());
            tracing::error!(%location, %payload, "panic");
            prior(panic_info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::{rotate_if_needed, MAX_ARCHIVES, MAX_LOG_BYTES};

    #[test]
    fn oversized_log_is_archived_and_archives_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in 0..MAX_ARCHIVES {
            std::fs::write(dir.path().join(format!("quickswitch-{stamp}.log")), b"old").unwrap();
        }
        let log_path = dir.path().join("quickswitch.log");
        std::fs::write(&log_path, vec![b'x'; MAX_LOG_BYTES as usize]).unwrap();

        rotate_if_needed(&log_path, dir.path()).unwrap();

        assert!(!log_path.exists());
        let archives = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("quickswitch-"))
            .count();
        assert_eq!(archives, MAX_ARCHIVES);
        assert!(!dir.path().join("quickswitch-0.log").exists());
    }

    #[test]
    fn small_log_is_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("quickswitch.log");
        std::fs::write(&log_path, b"short").unwrap();
        rotate_if_needed(&log_path, dir.path()).unwrap();
        assert!(log_path.exists());
    }
}
