//! Writing compiler output to the destination directory.
//!
//! All paths are validated against the destination directory before anything
//! is touched, and every file of one plan is written through a temporary
//! sibling and renamed into place. If one file fails, the temporaries of the
//! plan are removed again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use crate::compiler::EmittedFile;
use crate::{Error, Result};

/// Interpreter line put at the top of executable outputs.
pub const SHEBANG: &str = "#!/usr/bin/env node\n";

/// Resolve `filename` under `base_dir`, rejecting anything that escapes it.
pub fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    #[cfg(target_os = "windows")]
    {
        let stem = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename)
            .split('.')
            .next()
            .unwrap_or_default()
            .to_uppercase();
        let device_names = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        if device_names.contains(&stem.as_str()) {
            return Err(Error::InvalidOutputPath(format!(
                "Filename is a reserved device name: {filename}"
            )));
        }
    }

    let base_dir = base_dir.clean();
    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if full_path == base_dir || !full_path.starts_with(&base_dir) {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

/// Prefix `contents` with [`SHEBANG`] unless it already starts with `#!`.
pub fn with_shebang(contents: Vec<u8>) -> Vec<u8> {
    if contents.starts_with(b"#!") {
        return contents;
    }
    let mut out = Vec::with_capacity(SHEBANG.len() + contents.len());
    out.extend_from_slice(SHEBANG.as_bytes());
    out.extend(contents);
    out
}

/// `index.js` becomes `index.js.tmp`, so `index.js` and `index.mjs` never
/// share a temporary.
fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `files` under `dir`. Returns the written paths in input order.
pub fn write_files(dir: &Path, files: &[EmittedFile]) -> Result<Vec<PathBuf>> {
    let operations = files
        .iter()
        .map(|file| Ok((validate_output_path(dir, &file.filename)?, file.contents.as_slice())))
        .collect::<Result<Vec<_>>>()?;

    let mut temp_files: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(operations.len());

    for (target, contents) in &operations {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp = temp_path(target);
        fs::write(&temp, contents).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp.display(),
                e
            ))
        })?;
        temp_files.push((temp, target.clone()));
    }

    for (temp, target) in &temp_files {
        fs::rename(temp, target).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp.display(),
                target.display(),
                e
            ))
        })?;
        debug!(path = %target.display(), "Wrote output");
    }

    Ok(temp_files.into_iter().map(|(_, target)| target).collect())
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp, _) in temp_files {
        if let Err(e) = fs::remove_file(temp)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %temp.display(), error = %e, "Failed to clean up temporary file");
        }
    }
}

/// Remove previous outputs and their `.map` siblings. Missing files are fine.
///
/// Returns how many files were removed.
pub fn remove_stale<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Result<usize> {
    let mut removed = 0;
    for path in paths {
        let mut map = path.as_os_str().to_os_string();
        map.push(".map");
        for target in [path.to_path_buf(), PathBuf::from(map)] {
            match fs::remove_file(&target) {
                Ok(()) => {
                    debug!(path = %target.display(), "Removed stale output");
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::WriteFailure(format!(
                        "Failed to remove stale output '{}': {}",
                        target.display(),
                        e
                    )));
                }
            }
        }
    }
    Ok(removed)
}

/// Set mode 0755. No-op off Unix.
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
            Error::WriteFailure(format!(
                "Failed to make '{}' executable: {}",
                path.display(),
                e
            ))
        })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_output_path_normal() {
        let base = Path::new("/tmp/output");
        assert_eq!(
            validate_output_path(base, "index.js").unwrap(),
            Path::new("/tmp/output/index.js")
        );
        assert_eq!(
            validate_output_path(base, "./bin/cli.js").unwrap(),
            Path::new("/tmp/output/bin/cli.js")
        );
    }

    #[test]
    fn test_validate_output_path_traversal() {
        let base = Path::new("/tmp/output");
        assert!(matches!(
            validate_output_path(base, "../etc/passwd"),
            Err(Error::InvalidOutputPath(_))
        ));
        assert!(validate_output_path(base, "safe/../../../../etc/passwd").is_err());
        assert!(validate_output_path(base, "file\0name.js").is_err());
        assert!(validate_output_path(base, ".").is_err());
    }

    #[test]
    fn test_with_shebang() {
        assert_eq!(with_shebang(b"run();".to_vec()), b"#!/usr/bin/env node\nrun();");
        assert_eq!(with_shebang(b"#!/bin/sh\n".to_vec()), b"#!/bin/sh\n");
    }

    #[test]
    fn test_write_files_creates_directories() {
        let temp = TempDir::new().unwrap();
        let files = vec![
            EmittedFile::new("index.js", "a"),
            EmittedFile::new("index.mjs", "b"),
            EmittedFile::new("bin/cli.js", "c"),
        ];

        let written = write_files(temp.path(), &files).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(temp.path().join("index.js")).unwrap(), "a");
        assert_eq!(fs::read_to_string(temp.path().join("index.mjs")).unwrap(), "b");
        assert_eq!(fs::read_to_string(temp.path().join("bin/cli.js")).unwrap(), "c");
        assert!(!temp.path().join("index.js.tmp").exists());
    }

    #[test]
    fn test_write_files_rejects_traversal_before_writing() {
        let temp = TempDir::new().unwrap();
        let dist = temp.path().join("dist");
        let files = vec![
            EmittedFile::new("ok.js", "a"),
            EmittedFile::new("../escape.js", "b"),
        ];

        assert!(write_files(&dist, &files).is_err());
        assert!(!dist.join("ok.js").exists());
        assert!(!temp.path().join("escape.js").exists());
    }

    #[test]
    fn test_remove_stale() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("index.js");
        fs::write(&output, "old").unwrap();
        fs::write(temp.path().join("index.js.map"), "{}").unwrap();
        let missing = temp.path().join("missing.js");

        let removed = remove_stale([output.as_path(), missing.as_path()]).unwrap();

        assert_eq!(removed, 2);
        assert!(!output.exists());
        assert!(!temp.path().join("index.js.map").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cli.js");
        fs::write(&path, "").unwrap();

        make_executable(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
