use std::time::Duration;

use anyhow::{Result, bail};

/// Unit suffix to nanoseconds multiplier
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1_000.0),
    ("µs", 1_000.0),
    ("μs", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "30s", "1m30s", "1.5h", "250ms"
///
/// A duration is a sequence of decimal numbers, each followed by a unit.
/// A bare "0" is accepted. Signs are rejected since every duration in the
/// configuration is a wait time.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty duration");
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut nanos = 0.0f64;
    let mut rest = s;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            bail!("invalid duration {s:?}: expected a number");
        }
        let value: f64 = number.parse()?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            bail!("invalid duration {s:?}: missing unit");
        }

        let Some((_, multiplier)) = UNITS.iter().find(|(suffix, _)| *suffix == unit) else {
            bail!("invalid duration {s:?}: unknown unit {unit:?}");
        };

        nanos += value * multiplier;
        rest = tail;
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        bail!("invalid duration {s:?}: out of range");
    }

    Ok(Duration::from_nanos(nanos as u64))
}
