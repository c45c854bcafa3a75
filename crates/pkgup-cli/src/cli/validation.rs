/// Parse a directory argument such as `--src-dir` or `--out-dir`.
///
/// Leading and trailing whitespace is trimmed; the result must not be empty.
///
/// # Errors
///
/// Returns an error message for an empty value.
pub fn parse_dir(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Directory cannot be empty".to_string());
    }
    Ok(trimmed.to_string())
}
