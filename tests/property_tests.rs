//! Property-Based Tests
//!
//! These tests verify:
//! - File mode format → parse is the identity on permission bits
//! - Parsing never panics and never leaves permission range
//! - Identifiers are always 32 lowercase hex characters

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tf_local::{format_file_mode, generate_exec_id, generate_file_id, parse_file_mode};

proptest! {
    /// Any permission value survives format → parse
    #[test]
    fn file_mode_roundtrip(mode in 0u32..=0o7777) {
        prop_assert_eq!(parse_file_mode(&format_file_mode(mode)), mode);
    }

    /// Arbitrary input parses to something within the permission bits
    #[test]
    fn file_mode_parse_is_total(input in ".*") {
        prop_assert!(parse_file_mode(&input) <= 0o7777);
    }

    /// Strings without a leading octal digit fall back to 0644
    #[test]
    fn file_mode_default_for_non_octal(input in "[a-zA-Z89_-][a-zA-Z0-9]*") {
        prop_assert_eq!(parse_file_mode(&input), 0o644);
    }

    /// IDs have a fixed shape regardless of input
    #[test]
    fn ids_are_md5_hex(input in ".*", secs in 0i64..4_000_000_000) {
        let ts = Utc.timestamp_opt(secs, 0).unwrap();
        for id in [generate_exec_id(&input, ts), generate_file_id(&input, ts)] {
            prop_assert_eq!(id.len(), 32);
            prop_assert!(id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }

    /// Same input and second → same ID
    #[test]
    fn ids_are_deterministic(input in ".*", secs in 0i64..4_000_000_000) {
        let ts = Utc.timestamp_opt(secs, 0).unwrap();
        prop_assert_eq!(generate_file_id(&input, ts), generate_file_id(&input, ts));
    }
}
