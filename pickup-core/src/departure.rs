use chrono::{DateTime, Duration, TimeZone};

pub const DEFAULT_BUFFER_MINUTES: f64 = 30.0;

/// Largest buffer or lead time accepted from callers: one week.
pub const MAX_OFFSET_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Wall-clock offset for a possibly fractional number of minutes, microsecond precision.
pub fn minutes(value: f64) -> Duration {
    Duration::microseconds((value * 60_000_000.0).round() as i64)
}

/// Time to leave so that the driver reaches the curb `buffer_minutes` after
/// the flight lands.
///
/// Works on absolute instants, so DST and date boundaries are handled by chrono.
/// A result already in the past is returned as-is; `None` only when the
/// offsets push the instant outside chrono's representable range.
pub fn compute_departure<Tz: TimeZone>(
    arrival: &DateTime<Tz>,
    driving_minutes: f64,
    buffer_minutes: f64,
) -> Option<DateTime<Tz>> {
    arrival
        .clone()
        .checked_add_signed(minutes(buffer_minutes))?
        .checked_sub_signed(minutes(driving_minutes))
}
