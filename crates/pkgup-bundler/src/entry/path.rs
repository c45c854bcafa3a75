//! Canonical relative path strings.
//!
//! Manifest paths appear as `dist/index.js`, `./dist/index.js` or absolute
//! paths. Everything that is compared or used as a map key goes through
//! [`normalize_path`] first so the spellings collapse to `./dist/index.js`.

use path_clean::PathClean;
use std::path::Path;

/// Normalize a manifest or CLI path.
///
/// Relative paths that do not start with `.` or `/` get a `./` prefix.
/// With `is_dir`, a trailing `/` is appended when missing. Idempotent.
pub fn normalize_path(path: &str, is_dir: bool) -> String {
    let mut normalized =
        if Path::new(path).is_absolute() || path.starts_with('/') || path.starts_with('.') {
            path.to_string()
        } else {
            format!("./{path}")
        };

    if is_dir && !normalized.ends_with('/') {
        normalized.push('/');
    }

    normalized
}

/// Normalize `path`, first making it relative to `root` when it is an
/// absolute path inside `root`.
pub fn normalize_under(path: &str, root: &Path) -> String {
    let absolute = Path::new(path);
    if !absolute.is_absolute() {
        return normalize_path(path, false);
    }

    let cleaned = absolute.clean();
    match cleaned.strip_prefix(root.clean()) {
        Ok(relative) => {
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            normalize_path(&relative, false)
        }
        Err(_) => normalize_path(path, false),
    }
}

/// Strip a normalized directory prefix (`./src/`) from a normalized path.
pub(crate) fn strip_dir<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    path.strip_prefix(dir)
}
