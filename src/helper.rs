//! Helper utilities for Socksdial
//!
//! Small parsing helpers shared by the configuration layer.

use std::time::Duration;

/// Default SOCKS proxy port (IANA)
pub const DEFAULT_PROXY_PORT: u16 = 1080;

/// Parse a duration string such as `300ms`, `5s`, `1m30s` or `1.5h`
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare
/// `0` is accepted and yields a zero duration.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(format!("invalid duration {:?}", input));
        }
        let value: f64 = rest[..num_len]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", input))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1e0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {:?}", input)),
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, input)),
        };
        rest = &rest[unit_len..];
        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return Err(format!("duration {:?} out of range", input));
    }
    Ok(Duration::from_nanos(total as u64))
}
