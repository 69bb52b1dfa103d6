#![forbid(unsafe_code)]

//! Decoder for the ISO-8601 duration subset the Data API emits for videos.

use crate::error::DurationParseError;

/// Decodes strings such as `PT1H1M11S`, `PT4M30S`, or `PT19S` into whole
/// seconds. Any subset of the hour/minute/second components is accepted as
/// long as they appear in order and at least one is present. Everything else
/// (days, fractions, empty `PT`, stray text) is rejected so a malformed
/// duration can never masquerade as a zero-length video.
pub fn parse_duration_seconds(raw: &str) -> Result<u64, DurationParseError> {
    let err = || DurationParseError {
        input: raw.to_owned(),
    };

    let rest = raw.strip_prefix("PT").ok_or_else(err)?;
    if rest.is_empty() {
        return Err(err());
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    // Designators must stay in H > M > S order; track the last one seen.
    let mut last_rank = 0u8;

    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let (rank, multiplier) = match ch {
            'H' => (1, 3600),
            'M' => (2, 60),
            'S' => (3, 1),
            _ => return Err(err()),
        };
        if rank <= last_rank || digits.is_empty() {
            return Err(err());
        }
        last_rank = rank;

        let value: u64 = digits.parse().map_err(|_| err())?;
        total = value
            .checked_mul(multiplier)
            .and_then(|part| total.checked_add(part))
            .ok_or_else(err)?;
        digits.clear();
    }

    // Trailing digits without a designator are malformed.
    if !digits.is_empty() {
        return Err(err());
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders seconds back into the provider's grammar, skipping zero-valued
    /// leading components the way the API does.
    fn encode(seconds: u64) -> String {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        let secs = seconds % 60;

        let mut out = String::from("PT");
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 || (hours > 0 && secs > 0) {
            out.push_str(&format!("{minutes}M"));
        }
        if secs > 0 || (hours == 0 && minutes == 0) {
            out.push_str(&format!("{secs}S"));
        }
        out
    }

    #[test]
    fn decodes_component_subsets() {
        assert_eq!(parse_duration_seconds("PT19S").unwrap(), 19);
        assert_eq!(parse_duration_seconds("PT4M30S").unwrap(), 270);
        assert_eq!(parse_duration_seconds("PT1H1M11S").unwrap(), 3671);
        assert_eq!(parse_duration_seconds("PT2H").unwrap(), 7200);
        assert_eq!(parse_duration_seconds("PT90M").unwrap(), 5400);
        assert_eq!(parse_duration_seconds("PT1H5S").unwrap(), 3605);
        assert_eq!(parse_duration_seconds("PT0S").unwrap(), 0);
    }

    #[test]
    fn round_trips_every_value_up_to_99_59_59() {
        for seconds in 0..=359_999u64 {
            let encoded = encode(seconds);
            assert_eq!(
                parse_duration_seconds(&encoded).unwrap(),
                seconds,
                "round trip failed for {encoded}"
            );
        }
    }

    #[test]
    fn rejects_malformed_inputs() {
        for bad in [
            "", "PT", "P0D", "P1DT2H", "5M", "PT5", "PTM", "PT1S2M", "PT1H1H", "pt5m", "PT1.5S",
            "PT5M ", "PT5Mx",
        ] {
            let err = parse_duration_seconds(bad).unwrap_err();
            assert_eq!(err.input, bad);
        }
    }

    #[test]
    fn rejects_values_that_overflow() {
        assert!(parse_duration_seconds("PT99999999999999999999H").is_err());
    }
}
