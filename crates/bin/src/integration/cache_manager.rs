//! Location and opening of the on-disk quote cache.

use movers_data::{DataError, SqliteCache};
use std::path::{Path, PathBuf};

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/movers/`
/// - macOS: `~/Library/Caches/movers/`
/// - Windows: `%LOCALAPPDATA%\movers\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("movers")
}

/// Get the default cache database path.
pub(crate) fn default_cache_path() -> PathBuf {
    default_cache_dir().join("movers.db")
}

/// Resolve an optional `--cache-path` override.
pub(crate) fn resolve_cache_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(default_cache_path, Path::to_path_buf)
}

/// Open the cache at `path`, creating the directory if needed.
pub(crate) fn open_cache(path: &Path) -> Result<SqliteCache, DataError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    SqliteCache::new(path)
}
