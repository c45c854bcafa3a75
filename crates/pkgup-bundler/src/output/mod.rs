//! Destination directory handling.

pub mod writer;

pub use writer::{SHEBANG, make_executable, remove_stale, validate_output_path, with_shebang, write_files};
