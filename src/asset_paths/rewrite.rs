use std::path::PathBuf;

use super::normalise::{filepath_to_uri, unixify};
use crate::error::{Result, WebpackError};

/// Join a static file name onto the public static prefix.
///
/// Leading slashes on `name` are dropped so the name always lands under the prefix, which is
/// expected to end with `/` (for example `/static/`).
pub fn static_url(prefix: &str, name: &str) -> String {
    let name = filepath_to_uri(name);
    let name = name.trim_start_matches('/');
    if prefix.is_empty() || prefix.ends_with('/') {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}/{name}")
    }
}

/// Rewrite an on-disk bundle path into a root-relative URL.
///
/// Directories are tried in order and the first one that occurs inside the path wins. The
/// path is cut after the first occurrence of that directory and the remainder is placed
/// under `static_prefix`. The result always starts with `/`.
pub fn rewrite_bundle_path(
    path: &str,
    static_dirs: &[PathBuf],
    static_prefix: &str,
) -> Result<String> {
    let path = unixify(path);

    for dir in static_dirs {
        let dir = unixify(&dir.to_string_lossy());
        if dir.is_empty() {
            continue;
        }

        if let Some((_, remainder)) = path.split_once(dir.as_str()) {
            let url = static_url(static_prefix, remainder);
            return Ok(if url.starts_with('/') {
                url
            } else {
                format!("/{url}")
            });
        }
    }

    Err(WebpackError::PathRewriteFailed { path })
}
