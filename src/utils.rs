//! Pure formatting and lookup helpers for presenters.

/// Fixed display palette for player markers, cycled by player index
const PLAYER_PALETTE: [&str; 10] = [
    "#667eea", "#764ba2", "#48bb78", "#f56565", "#ed8936", "#38b2ac", "#ecc94b", "#9f7aea",
    "#fc8181", "#4299e1",
];

/// Format a duration in seconds as `m:ss`
///
/// Uses floor semantics and zero-pads the seconds. Negative inputs clamp to
/// `0:00`.
///
/// ```
/// use pitchtrack::utils::format_duration;
/// assert_eq!(format_duration(125.0), "2:05");
/// assert_eq!(format_duration(59.0), "0:59");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Display color for the player at `index` in the results list
///
/// Deterministic: cycles through a fixed 10-color palette modulo its length.
pub fn palette_color(index: usize) -> &'static str {
    PLAYER_PALETTE[index % PLAYER_PALETTE.len()]
}
