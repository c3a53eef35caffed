//! Locale-aware salary number parsing.
//!
//! Accepts Italian (`1.234,56`) and US (`1,234.56`) grouping, bare
//! thousands groups (`40.000`, `40,000`) and `k`/`m` magnitude suffixes.

/// Parse a salary figure as written in text.
///
/// Separator rules:
/// - both `.` and `,` present: the one appearing last is the decimal mark
/// - one kind, repeated: it groups thousands (`1.234.567`)
/// - one kind, once: a trailing group of exactly three digits means
///   thousands (`40.000`), anything else is a decimal (`2,5`)
///
/// Returns `None` when no digits are present or the result is not finite.
pub fn parse_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let multiplier = magnitude_suffix(text);

    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ',');
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, group) = if dot > comma { ('.', ',') } else { (',', '.') };
            cleaned
                .chars()
                .filter(|c| *c != group)
                .map(|c| if c == decimal { '.' } else { c })
                .collect()
        }
        (Some(_), None) => single_separator(cleaned, '.'),
        (None, Some(_)) => single_separator(cleaned, ','),
        (None, None) => cleaned.to_string(),
    };

    let value: f64 = normalized.parse().ok()?;
    let value = value * multiplier;
    value.is_finite().then_some(value)
}

/// `k` → ×1 000, `m` → ×1 000 000, when it is the last letter of the token.
pub(crate) fn magnitude_suffix(text: &str) -> f64 {
    match text.chars().rev().find(|c| c.is_alphabetic()) {
        Some('k' | 'K') => 1_000.0,
        Some('m' | 'M') => 1_000_000.0,
        _ => 1.0,
    }
}

fn single_separator(cleaned: &str, sep: char) -> String {
    let groups: Vec<&str> = cleaned.split(sep).collect();
    let is_grouping = groups.len() > 2 || groups.last().is_some_and(|g| g.len() == 3);
    if is_grouping {
        groups.concat()
    } else {
        groups.join(".")
    }
}

/// Format an integer with a thousands separator (`40000` → `40.000`).
pub(crate) fn group_thousands(value: u64, sep: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn italian_and_us_decimals() {
        assert_eq!(parse_number("1.234,56"), Some(1234.56));
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
    }

    #[test]
    fn thousands_only() {
        assert_eq!(parse_number("40.000"), Some(40_000.0));
        assert_eq!(parse_number("40,000"), Some(40_000.0));
        assert_eq!(parse_number("1.250.000"), Some(1_250_000.0));
    }

    #[test]
    fn short_trailing_group_is_decimal() {
        assert_eq!(parse_number("2,5"), Some(2.5));
        assert_eq!(parse_number("42.50"), Some(42.5));
    }

    #[test]
    fn magnitude_suffixes() {
        assert_eq!(parse_number("45k"), Some(45_000.0));
        assert_eq!(parse_number("45 K"), Some(45_000.0));
        assert_eq!(parse_number("2M"), Some(2_000_000.0));
        assert_eq!(parse_number("2,5k"), Some(2_500.0));
    }

    #[test]
    fn currency_noise_is_ignored() {
        assert_eq!(parse_number("€ 35.000"), Some(35_000.0));
        assert_eq!(parse_number("45.000."), Some(45_000.0));
        assert_eq!(parse_number("  38000 "), Some(38_000.0));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(".,"), None);
    }

    #[test]
    fn grouping_formats() {
        assert_eq!(group_thousands(40_000, '.'), "40.000");
        assert_eq!(group_thousands(1_234_567, ','), "1,234,567");
        assert_eq!(group_thousands(950, '.'), "950");
    }
}
