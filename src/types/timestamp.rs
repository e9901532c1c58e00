/// Multipliers of the `HH:MM:SS` components, read from the right
const MULTIPLIERS: [u64; 3] = [1, 60, 3600];

/// Parse a `SS`, `MM:SS` or `HH:MM:SS` timestamp into a number of seconds.
///
/// Return `None` if the text is empty, has more than three components,
/// or if any component is not a non-negative integer.
pub fn parse_time(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > MULTIPLIERS.len() {
        return None;
    }

    parts
        .iter()
        .rev()
        .zip(MULTIPLIERS)
        .try_fold(0u64, |total, (part, mult)| {
            let value = part.trim().parse::<u64>().ok()?;
            total.checked_add(value.checked_mul(mult)?)
        })
}

#[cfg(test)]
mod tests {
    use super::parse_time;

    #[test]
    fn seconds_only() {
        assert_eq!(parse_time("90"), Some(90));
        assert_eq!(parse_time("0"), Some(0));
    }

    #[test]
    fn minutes_and_hours() {
        assert_eq!(parse_time("1:30"), Some(90));
        assert_eq!(parse_time("1:00:00"), Some(3600));
        assert_eq!(parse_time("01:02:03"), Some(3723));
        assert_eq!(parse_time("0:75"), Some(75));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_time(" 0:10 "), Some(10));
    }

    #[test]
    fn unparsable_inputs() {
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("   "), None);
        assert_eq!(parse_time("a:b"), None);
        assert_eq!(parse_time("1:"), None);
        assert_eq!(parse_time("-5"), None);
        assert_eq!(parse_time("1.5"), None);
    }

    #[test]
    fn more_than_three_components_is_rejected() {
        assert_eq!(parse_time("1:00:00:00"), None);
    }
}
