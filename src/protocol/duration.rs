//! Duration Literal Parsing
//!
//! Parses ttl literals such as `500ms`, `10s`, `1h30m`, `1.5h` or `-5s`.
//! A literal is an optional sign followed by one or more
//! `<digits>[.<digits>]<unit>` groups; a bare `0` is also accepted.

use chrono::TimeDelta;

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SEC: i128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

// == Parse Duration ==
/// Parses a duration literal. Returns `None` for anything malformed or
/// longer than `i64::MAX` nanoseconds.
pub fn parse_duration(input: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after) = rest.split_at(int_len);

        let (frac_part, after) = match after.strip_prefix('.') {
            Some(fraction) => {
                let frac_len = fraction.bytes().take_while(u8::is_ascii_digit).count();
                fraction.split_at(frac_len)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, tail) = after.split_at(unit_len);
        let scale = unit_nanos(unit)?;

        let whole: i128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
        let mut nanos = whole.checked_mul(scale)?;

        // digits below one nanosecond are dropped
        let mut place = scale;
        for digit in frac_part.bytes() {
            place /= 10;
            if place == 0 {
                break;
            }
            nanos += i128::from(digit - b'0') * place;
        }

        total = total.checked_add(nanos)?;
        if total > i128::from(i64::MAX) {
            return None;
        }
        rest = tail;
    }

    let total = i64::try_from(total).ok()?;
    Some(TimeDelta::nanoseconds(if negative { -total } else { total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_units() {
        assert_eq!(parse_duration("500ms"), Some(TimeDelta::milliseconds(500)));
        assert_eq!(parse_duration("10s"), Some(TimeDelta::seconds(10)));
        assert_eq!(parse_duration("5m"), Some(TimeDelta::minutes(5)));
        assert_eq!(parse_duration("2h"), Some(TimeDelta::hours(2)));
        assert_eq!(parse_duration("7us"), Some(TimeDelta::microseconds(7)));
        assert_eq!(parse_duration("7µs"), Some(TimeDelta::microseconds(7)));
        assert_eq!(parse_duration("42ns"), Some(TimeDelta::nanoseconds(42)));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m"), Some(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("1.5h"), Some(TimeDelta::minutes(90)));
        assert_eq!(parse_duration(".5s"), Some(TimeDelta::milliseconds(500)));
        assert_eq!(parse_duration("1.s"), Some(TimeDelta::seconds(1)));
        assert_eq!(parse_duration("2m3.25s"), Some(TimeDelta::milliseconds(123_250)));
    }

    #[test]
    fn test_parse_signs_and_zero() {
        assert_eq!(parse_duration("0"), Some(TimeDelta::zero()));
        assert_eq!(parse_duration("-0"), Some(TimeDelta::zero()));
        assert_eq!(parse_duration("0s"), Some(TimeDelta::zero()));
        assert_eq!(parse_duration("-5s"), Some(TimeDelta::seconds(-5)));
        assert_eq!(parse_duration("+5s"), Some(TimeDelta::seconds(5)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "-", "10", "s", "abc", "5x", "1e3s", ".s", "5 s", "1h-2m"] {
            assert_eq!(parse_duration(input), None, "{:?} should not parse", input);
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert_eq!(parse_duration("9999999999999999999h"), None);
        assert_eq!(parse_duration("3000000h"), None);
        assert!(parse_duration("2000000h").is_some());
    }
}
