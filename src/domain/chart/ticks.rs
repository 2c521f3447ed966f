// Time axis ticks and label formatting
use chrono::{DateTime, FixedOffset, Offset, Utc};

pub const AXIS_LABEL_FORMAT: &str = "%I:%M %p %A, %b %e";
pub const XHAIR_TIME_FORMAT: &str = "%I:%M %p";
pub const XHAIR_DATE_FORMAT: &str = "%A %b %e, %Y";

/// Minimum horizontal distance between two axis ticks, in pixels.
pub const MIN_TICK_SPACING: f64 = 160.0;
/// Upper bound on ticks produced for one window.
pub const MAX_TICKS: usize = 256;

const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;

const TICK_INTERVALS_MS: [f64; 9] = [
    MINUTE_MS,
    5.0 * MINUTE_MS,
    15.0 * MINUTE_MS,
    30.0 * MINUTE_MS,
    HOUR_MS,
    3.0 * HOUR_MS,
    6.0 * HOUR_MS,
    12.0 * HOUR_MS,
    24.0 * HOUR_MS,
];

/// Formats millisecond timestamps in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct TimeFormatter {
    offset: FixedOffset,
}

impl TimeFormatter {
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset.local_minus_utc() as f64 * 1000.0
    }

    /// Format `timestamp` (ms) with a strftime pattern; empty for timestamps
    /// chrono cannot represent.
    pub fn format(&self, timestamp: f64, pattern: &str) -> String {
        if !timestamp.is_finite() {
            return String::new();
        }
        DateTime::<Utc>::from_timestamp_millis(timestamp.round() as i64)
            .map(|at| at.with_timezone(&self.offset).format(pattern).to_string())
            .unwrap_or_default()
    }
}

/// Smallest tick interval that keeps ticks at least [`MIN_TICK_SPACING`]
/// pixels apart at `px_per_ms`.
pub fn tick_interval(px_per_ms: f64) -> f64 {
    TICK_INTERVALS_MS
        .iter()
        .copied()
        .find(|interval| interval * px_per_ms >= MIN_TICK_SPACING)
        .unwrap_or(TICK_INTERVALS_MS[TICK_INTERVALS_MS.len() - 1])
}

/// Tick timestamps within `[start, end]`, aligned to `interval` in local time.
/// At most [`MAX_TICKS`] are returned, starting from `start`.
pub fn time_ticks(start: f64, end: f64, interval: f64, formatter: &TimeFormatter) -> Vec<f64> {
    if !(start.is_finite() && end.is_finite()) || end < start || interval <= 0.0 {
        return Vec::new();
    }
    let offset = formatter.offset_ms();
    let mut tick = ((start + offset) / interval).ceil() * interval - offset;
    let mut ticks = Vec::new();
    while tick <= end && ticks.len() < MAX_TICKS {
        ticks.push(tick);
        tick += interval;
    }
    ticks
}
