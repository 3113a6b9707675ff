use std::time::Duration;

use eyre::{Result, bail, eyre};

/// Unit suffix to nanoseconds multiplier.
const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("\u{b5}s", 1_000),
    ("\u{3bc}s", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

/// Fractional digits kept per component; anything finer than this is below a nanosecond.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a duration expression such as "45m", "1h30m", "1.5h" or "250ms".
///
/// An expression is a sequence of decimal numbers, each with an optional fraction and a
/// mandatory unit (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`). The bare string "0" is also
/// accepted. Signs are not.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        bail!("invalid duration {input:?}: empty expression");
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = s;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len =
            rest.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        if number.is_empty() || number == "." {
            bail!("invalid duration {input:?}: expected a number");
        }
        if unit.is_empty() {
            bail!("invalid duration {input:?}: missing unit after {number:?}");
        }
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| eyre!("invalid duration {input:?}: unknown unit {unit:?}"))?;
        let nanos = component_nanos(number, scale)
            .ok_or_else(|| eyre!("invalid duration {input:?}: bad number {number:?}"))?;
        total = total
            .checked_add(nanos)
            .ok_or_else(|| eyre!("invalid duration {input:?}: out of range"))?;
        rest = tail;
    }

    let nanos = u64::try_from(total).map_err(|_| eyre!("invalid duration {input:?}: out of range"))?;
    Ok(Duration::from_nanos(nanos))
}

/// Nanoseconds for one `<number><unit>` component, `None` on malformed or overflowing input.
fn component_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let nanos = whole.checked_mul(scale)?;

    let mut fraction_value: u128 = 0;
    let mut divisor: u128 = 1;
    for digit in fraction.bytes().take(MAX_FRACTION_DIGITS) {
        fraction_value = fraction_value * 10 + u128::from(digit - b'0');
        divisor *= 10;
    }
    nanos.checked_add(fraction_value * scale / divisor)
}

/// Format a duration as hours, minutes and seconds, e.g. "1h2m3s" or "45s".
///
/// Sub-second precision is dropped.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("45m").unwrap(), Duration::from_secs(45 * 60));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("7us").unwrap(), Duration::from_micros(7));
        assert_eq!(parse_duration("7µs").unwrap(), Duration::from_micros(7));
        assert_eq!(parse_duration("12ns").unwrap(), Duration::from_nanos(12));
    }

    #[test]
    fn parses_compound_and_fractional_expressions() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1m0.25s").unwrap(), Duration::from_millis(60_250));
    }

    #[test]
    fn parses_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn rejects_malformed_expressions() {
        for input in ["", "10", "abc", "5x", "-5m", "+5m", "1..5h", "m", "."] {
            assert!(parse_duration(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn rejects_out_of_range() {
        let err = parse_duration("99999999999999999999h").unwrap_err();
        assert!(err.to_string().contains("99999999999999999999h"));
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(45_900)), "45s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m5s");
        assert_eq!(format_duration(Duration::from_secs(3605)), "1h0m5s");
    }
}
