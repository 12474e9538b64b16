use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// In-memory database shared by every pooled connection of this process.
const SHARED_MEMORY_URL: &str = "sqlite:file:quiz?mode=memory&cache=shared";

/// Turn a user-supplied database location into a `sqlx` URL.
///
/// Bare and `sqlite:` relative paths are made absolute against the working
/// directory. `sqlite::memory:` maps to a shared in-memory database so the
/// pool's connections see the same tables.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" {
        return SHARED_MEMORY_URL.to_string();
    }
    if trimmed.starts_with("sqlite://") || trimmed.starts_with("sqlite:file:") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its directory exist before connecting.
///
/// # Errors
///
/// Fails on malformed URLs or when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}
