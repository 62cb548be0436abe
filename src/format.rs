// Compact text formatting for indicators: byte rates and uptime.

const UNITS: [&str; 4] = ["B", "K", "M", "G"];
const STEP: f64 = 1024.0;

/// Formats a byte (or byte/sec) value into at most three significant characters plus a unit.
///
/// The unit is the largest one where the value is >= 1, bumped once more when the value
/// would otherwise be >= 100 (`150K` becomes `0.1M`). Values below 10 keep one decimal,
/// larger ones are rounded to an integer, and a trailing `.0` is dropped. Zero renders as
/// `"0"` with no unit; negative or non-finite input is treated as zero.
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() || bytes <= 0.0 {
        return "0".into();
    }

    let last = UNITS.len() - 1;
    let mut unit = 0;
    let mut value = bytes;
    while value >= STEP && unit < last {
        unit += 1;
        value = bytes / STEP.powi(unit as i32);
    }

    if value >= 100.0 && unit < last {
        unit += 1;
        value = bytes / STEP.powi(unit as i32);
    }

    let formatted = if value >= 10.0 {
        format!("{}", value.round() as u64)
    } else {
        let fixed = to_fixed_one(value);
        match fixed.strip_suffix(".0") {
            Some(whole) => whole.to_string(),
            None => fixed,
        }
    };

    format!("{}{}", formatted, UNITS[unit])
}

/// One-decimal rendering with exact halves rounded up (`1.25` -> `1.3`).
fn to_fixed_one(value: f64) -> String {
    // Only quarter values (x.25, x.75) sit exactly on a one-decimal tie.
    if (value * 4.0).fract() == 0.0 && (value * 2.0).fract() != 0.0 {
        let tenths = (value * 10.0).round() as u64;
        return format!("{}.{}", tenths / 10, tenths % 10);
    }
    format!("{:.1}", value)
}

/// `1d1h` when at least a day, `3h12m` when at least an hour, else `42m`.
pub fn format_uptime(uptime_secs: u64) -> String {
    let hours = uptime_secs / 3600;
    let days = hours / 24;
    if days > 0 {
        format!("{}d{}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h{}m", hours, (uptime_secs % 3600) / 60)
    } else {
        format!("{}m", uptime_secs / 60)
    }
}

/// Clamps a percentage to [0, 100] for bar-style display.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}
