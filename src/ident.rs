//! Resource identifiers
//!
//! IDs are the MD5 of the declared input followed by the creation time
//! (RFC 3339, UTC, whole seconds). They are opaque to the host engine and
//! only need to differ between two creations of the same input.

use chrono::{DateTime, SecondsFormat, Utc};

/// Identifier for a `local_file` resource or data source, derived from its path.
pub fn generate_file_id(path: &str, timestamp: DateTime<Utc>) -> String {
    content_id(path, timestamp)
}

/// Identifier for a `local_exec` resource or data source, derived from its command.
pub fn generate_exec_id(command: &str, timestamp: DateTime<Utc>) -> String {
    content_id(command, timestamp)
}

fn content_id(input: &str, timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut data = Vec::with_capacity(input.len() + stamp.len());
    data.extend_from_slice(input.as_bytes());
    data.extend_from_slice(stamp.as_bytes());
    format!("{:x}", md5::compute(&data))
}
