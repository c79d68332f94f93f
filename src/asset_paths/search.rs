use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Find the first file called `file_name` below `dir`.
///
/// Each directory level is checked before its subdirectories are descended, and entries are
/// visited in name order so the result does not depend on the platform's listing order.
/// Symlinked directories are not followed. Unreadable directories are skipped.
pub fn find_static_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "skipping unreadable static directory");
            return None;
        }
    };

    let mut entries: Vec<_> = entries.flatten().collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirs = Vec::new();
    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            subdirs.push(entry.path());
        } else if entry.file_name() == file_name {
            return Some(entry.path());
        }
    }

    subdirs
        .iter()
        .find_map(|subdir| find_static_file(subdir, file_name))
}
