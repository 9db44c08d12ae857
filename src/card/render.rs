//! Text rendering of the stamp card.

use super::ProgressState;
use std::fmt::Write;
use std::path::Path;

/// Card heading.
pub const TITLE: &str = "The Snuggest Loyalty Program";

/// Venue line printed under the card.
pub const FOOTER: &str = "The Snuggest Gastro & Pub · Zirgu iela 3, Riga";

/// One slot on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Already collected.
    Filled,
    /// Empty slot showing its 1-based position.
    Empty(u32),
}

impl std::fmt::Display for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stamp::Filled => write!(f, "[✓]"),
            Stamp::Empty(n) => write!(f, "[{n}]"),
        }
    }
}

/// Stamp row for a card with `total` slots.
pub fn stamps(state: &ProgressState, total: u32) -> Vec<Stamp> {
    (0..total)
        .map(|i| {
            if i < state.drink_count() {
                Stamp::Filled
            } else {
                Stamp::Empty(i + 1)
            }
        })
        .collect()
}

/// Renders the whole card as terminal text.
pub fn render_card(state: &ProgressState, total: u32, qr_image: &Path) -> String {
    let mut out = String::new();
    let row = stamps(state, total)
        .iter()
        .map(Stamp::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(
        out,
        "Scan the QR code. Collect {total} drinks and get 1 FREE!"
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  {row}");
    let _ = writeln!(out);
    let _ = writeln!(out, "QR code: {}", qr_image.display());
    let _ = writeln!(out, "Type `r` + Enter to reset the card, `q` to quit.");
    if !state.message().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", state.message());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{FOOTER}");
    out
}
