//! Dashboard utilities: cell formatting.

use std::time::Duration;

/// Format a round-trip time the way `ping` users expect: `12.345ms`,
/// `830µs`, `1.2s`. Trailing zeros are dropped; zero is `0s`.
pub fn format_rtt(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".into();
    }

    let (unit_nanos, unit, frac_digits): (u128, &str, usize) = if nanos < 1_000 {
        (1, "ns", 0)
    } else if nanos < 1_000_000 {
        (1_000, "µs", 3)
    } else if nanos < 1_000_000_000 {
        (1_000_000, "ms", 6)
    } else {
        (1_000_000_000, "s", 9)
    };

    let whole = nanos / unit_nanos;
    let frac = nanos % unit_nanos;
    if frac == 0 {
        return format!("{whole}{unit}");
    }
    let digits = format!("{frac:0frac_digits$}");
    format!("{whole}.{}{unit}", digits.trim_end_matches('0'))
}

/// Format a loss percentage: `0%`, `12.5%`.
pub fn format_loss(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{percent:.0}%")
    } else {
        format!("{percent:.1}%")
    }
}
