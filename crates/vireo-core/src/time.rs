//! Time formatting and speed-change conversion
//!
//! Pure helpers shared by controllers that display elapsed/remaining time.

/// Format a time value in seconds as `M:SS`, `H:MM:SS`, or `HH:MM:SS`.
///
/// Negative or non-finite input is treated as zero. Hours are omitted unless
/// `full` is requested or the value exceeds one hour; `full` zero-pads the
/// hour field.
pub fn format(seconds: f64, full: bool) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if full {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Re-normalize a time value across a playback-speed change.
///
/// Keeps the on-screen counter numerically consistent immediately after a
/// speed change, instead of restarting measurement from zero. Rounded to
/// millisecond precision.
pub fn convert(time: f64, old_speed: f64, new_speed: f64) -> f64 {
    (time * old_speed / new_speed * 1000.0).round() / 1000.0
}
