//! Shared utility functions used across multiple modules.

/// Prefix for identifiers minted locally while the backend is unreachable.
pub const OFFLINE_ID_PREFIX: &str = "OFFLINE-";

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Mint a temporary identifier for a record created while offline.
///
/// The identifier is replaced by a server-assigned one once the record
/// reaches the backend; until then the UI can show it as pending.
pub fn offline_id() -> String {
    format!("{OFFLINE_ID_PREFIX}{}", now_millis())
}

/// Check whether an identifier is a temporary offline one.
pub fn is_offline_id(id: &str) -> bool {
    id.starts_with(OFFLINE_ID_PREFIX)
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_id_has_prefix() {
        let id = offline_id();
        assert!(id.starts_with(OFFLINE_ID_PREFIX));
        assert!(is_offline_id(&id));
    }

    #[test]
    fn is_offline_id_rejects_real_ids() {
        assert!(!is_offline_id("0192a1b2-7def-7abc-8000-5f2c9d1e4a77"));
        assert!(!is_offline_id("offline-123"));
        assert!(!is_offline_id(""));
    }

    #[test]
    fn compact_text_truncates_long_values() {
        let long = "x".repeat(500);
        assert_eq!(compact_text(&long).len(), 180);
        assert_eq!(compact_text("  short  "), "short");
    }
}
