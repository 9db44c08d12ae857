//! Fixed loyalty program rules and user-facing texts.

/// Stamps needed for the free drink.
pub const TOTAL_DRINKS: u32 = 5;

/// Minimum time between two scans that get past the rate gate.
pub const COOLDOWN_MS: i64 = 1200;

/// Substrings a normalized payload must all contain.
pub const REQUIRED_TOKENS: [&str; 3] = ["snuggest", "drink", "qr"];

/// Shown once the last stamp lands, and kept while the card is full.
pub const REWARD_UNLOCKED_MESSAGE: &str = "🎉 FREE DRINK UNLOCKED! 🎉";
/// Shown when a scan clears the cooldown but is not a loyalty code.
pub const INVALID_CODE_MESSAGE: &str = "Invalid QR code.";
/// Shown when the camera cannot be opened.
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Camera access blocked or unavailable.";

/// Message shown after a stamp that does not complete the card.
pub fn progress_message(count: u32, total: u32) -> String {
    format!("Drink added! ({count}/{total})")
}

/// Trims surrounding whitespace and lowercases.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Loose content match: every required token appears somewhere, in any order.
pub fn is_valid_payload(normalized: &str) -> bool {
    REQUIRED_TOKENS
        .iter()
        .all(|token| normalized.contains(token))
}
