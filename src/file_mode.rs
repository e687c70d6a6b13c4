//! Octal permission strings such as `"0644"`.

/// Mode applied when a permission string cannot be parsed.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode used for parent directories created on demand.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

const PERMISSION_BITS: u32 = 0o7777;

/// Parse an octal permission string.
///
/// Leading whitespace is skipped and parsing stops at the first non-octal
/// character, so `"0600"`, `"600"` and `" 755\n"` are all accepted. Input
/// without a leading octal digit falls back to [`DEFAULT_FILE_MODE`].
pub fn parse_file_mode(mode: &str) -> u32 {
    let trimmed = mode.trim_start();
    let digits: &str = {
        let end = trimmed
            .find(|c: char| !('0'..='7').contains(&c))
            .unwrap_or(trimmed.len());
        &trimmed[..end]
    };

    if digits.is_empty() {
        return DEFAULT_FILE_MODE;
    }

    match u32::from_str_radix(digits, 8) {
        Ok(value) => value & PERMISSION_BITS,
        Err(_) => DEFAULT_FILE_MODE,
    }
}

/// Render permission bits as a four-digit octal string.
pub fn format_file_mode(mode: u32) -> String {
    format!("{:04o}", mode & PERMISSION_BITS)
}
