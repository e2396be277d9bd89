//! Shared validation helpers for credentials, hostnames and node ids.

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
///
/// Used for SSIDs, broker hostnames and node identities.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Returns `true` if `s` can stand as a single MQTT topic level: printable
/// ASCII, non-empty, and free of separators (`/`), wildcards (`+`, `#`) and
/// spaces.
pub(crate) fn is_topic_level(s: &str) -> bool {
    !s.is_empty()
        && is_printable_ascii(s)
        && !s.bytes().any(|b| matches!(b, b'/' | b'+' | b'#' | b' '))
}
