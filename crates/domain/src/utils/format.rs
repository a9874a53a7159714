//! Display formatting for track metadata

/// Render a duration in milliseconds as `m:ss`.
///
/// Seconds are always two digits; minutes are not capped, so an hour-long
/// track renders as `60:00`.
///
/// # Examples
///
/// ```
/// use minihome_domain::utils::format::format_duration;
///
/// assert_eq!(format_duration(205_000), "3:25");
/// assert_eq!(format_duration(59_999), "0:59");
/// ```
#[must_use]
pub fn format_duration(duration_ms: u64) -> String {
    let minutes = duration_ms / 60_000;
    let seconds = (duration_ms % 60_000) / 1_000;
    format!("{minutes}:{seconds:02}")
}
