//! Deterministic salary-range pattern matcher.
//!
//! Patterns are tried in priority order; the first one that yields a
//! parseable pair wins for a given candidate.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use salarysignal_shared::{CandidateEntry, ExtractedRange, ExtractionStrategy};

use crate::number::{magnitude_suffix, parse_number};
use crate::period::detect_period;

/// A salary figure: digits with optional grouping and a `k`/`m` suffix that
/// must end the word (so the `m` of "mensili" is not a magnitude).
const NUM: &str = r"\d[\d.,]*(?:\s*[kKmM]\b)?";

/// Range separators.
const SEP: &str = r"(?:-|–|to|a)";

/// Currency markers, longest first.
const CUR: &str = r"(?:€|euro|eur)";

struct RangePattern {
    name: &'static str,
    regex: Regex,
}

static PATTERNS: LazyLock<Vec<RangePattern>> = LazyLock::new(|| {
    let specs: [(&str, String); 6] = [
        (
            "range_then_currency",
            format!(r"(?i)({NUM})\s*{SEP}\s*({NUM})\s*{CUR}"),
        ),
        (
            "currency_then_range",
            format!(r"(?i){CUR}\s*({NUM})(?:\s*{SEP}\s*{CUR}?\s*({NUM}))?"),
        ),
        (
            "salary_label",
            format!(
                r"(?i)\b(?:ral|retribuzion[ei]|stipendio|salary)\b[^\d]{{0,20}}?({NUM})(?:\s*{SEP}\s*({NUM}))?"
            ),
        ),
        (
            "between",
            format!(r"(?i)\b(?:compres[ao]\s+tra|tra|fra|da)\s*({NUM})\s*(?:e|a)\s*({NUM})"),
        ),
        (
            "range_then_gross",
            format!(r"(?i)({NUM})\s*(?:-|–)\s*({NUM})\s*(?:annu[aio]|annui|lord[aio]|lordi)\b"),
        ),
        ("amount_then_currency", format!(r"(?i)({NUM})\s*{CUR}")),
    ];
    specs
        .into_iter()
        .map(|(name, pattern)| RangePattern {
            name,
            regex: Regex::new(&pattern).expect("valid regex"),
        })
        .collect()
});

/// A raw pair found in text, with the pattern that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeMatch {
    pub pattern: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Find the first salary range in `text`.
///
/// A single figure (e.g. "€ 35.000") yields `min == max`.
pub fn match_range(text: &str) -> Option<RangeMatch> {
    for pattern in PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(text) {
            let Some(lower) = caps.get(1) else {
                continue;
            };
            let Some(mut min) = parse_number(lower.as_str()) else {
                continue;
            };
            let max = match caps.get(2) {
                Some(upper) => match parse_number(upper.as_str()) {
                    Some(v) => {
                        // "30-35k": a suffix written once covers both bounds
                        let scale = magnitude_suffix(upper.as_str());
                        if scale > 1.0 && magnitude_suffix(lower.as_str()) == 1.0 && min < 1_000.0 {
                            min *= scale;
                        }
                        v
                    }
                    None => continue,
                },
                None => min,
            };
            return Some(RangeMatch {
                pattern: pattern.name,
                min,
                max,
            });
        }
    }
    None
}

/// Run the pattern matcher over a candidate corpus.
pub fn extract_patterns(corpus: &[CandidateEntry]) -> Vec<ExtractedRange> {
    corpus
        .iter()
        .filter_map(|entry| {
            let found = match_range(&entry.text)?;
            debug!(url = %entry.url, pattern = found.pattern, min = found.min, max = found.max, "pattern match");
            Some(ExtractedRange {
                url: entry.url.clone(),
                min: found.min,
                max: found.max,
                period: detect_period(&entry.text),
                company: entry.company.clone(),
                strategy: ExtractionStrategy::Pattern,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use salarysignal_shared::Period;

    fn entry(url: &str, text: &str) -> CandidateEntry {
        CandidateEntry {
            url: url.into(),
            title: String::new(),
            text: text.into(),
            company: None,
        }
    }

    #[test]
    fn range_followed_by_currency() {
        let m = match_range("Data Analyst Milano — RAL 40.000-45.000€").unwrap();
        assert_eq!(m.pattern, "range_then_currency");
        assert_eq!((m.min, m.max), (40_000.0, 45_000.0));
    }

    #[test]
    fn currency_first_single_value() {
        let m = match_range("Offriamo € 35.000 lordi").unwrap();
        assert_eq!(m.pattern, "currency_then_range");
        assert_eq!((m.min, m.max), (35_000.0, 35_000.0));
    }

    #[test]
    fn currency_first_range_with_repeated_symbol() {
        let m = match_range("Stipendio: €30k - €38k").unwrap();
        assert_eq!((m.min, m.max), (30_000.0, 38_000.0));
    }

    #[test]
    fn labelled_salary() {
        let m = match_range("Retribuzione annua lorda: 28.000 - 32.000").unwrap();
        assert_eq!(m.pattern, "salary_label");
        assert_eq!((m.min, m.max), (28_000.0, 32_000.0));

        let m = match_range("RAL 40-55 in base all'esperienza").unwrap();
        assert_eq!((m.min, m.max), (40.0, 55.0));
    }

    #[test]
    fn trailing_suffix_applies_to_both_bounds() {
        let m = match_range("Data Analyst Milano RAL 30-35k €").unwrap();
        assert_eq!((m.min, m.max), (30_000.0, 35_000.0));

        let m = match_range("Data Analyst, RAL 40-55k").unwrap();
        assert_eq!((m.min, m.max), (40_000.0, 55_000.0));

        let m = match_range("Budget €30-35k").unwrap();
        assert_eq!((m.min, m.max), (30_000.0, 35_000.0));

        // a lower bound already in full is left alone
        let m = match_range("RAL 40.000 - 55k").unwrap();
        assert_eq!((m.min, m.max), (40_000.0, 55_000.0));
    }

    #[test]
    fn between_phrasing() {
        let m = match_range("compensation compresa tra 30k e 35k").unwrap();
        assert_eq!(m.pattern, "between");
        assert_eq!((m.min, m.max), (30_000.0, 35_000.0));
    }

    #[test]
    fn gross_suffix_range() {
        let m = match_range("Pacchetto 38.000 – 42.000 lordi").unwrap();
        assert_eq!(m.pattern, "range_then_gross");
        assert_eq!((m.min, m.max), (38_000.0, 42_000.0));
    }

    #[test]
    fn single_amount_before_currency() {
        let m = match_range("2.000 € al mese").unwrap();
        assert_eq!(m.pattern, "amount_then_currency");
        assert_eq!((m.min, m.max), (2_000.0, 2_000.0));
    }

    #[test]
    fn mensili_is_not_a_million_suffix() {
        let m = match_range("€ 2.000 mensili").unwrap();
        assert_eq!(m.min, 2_000.0);
    }

    #[test]
    fn no_salary_no_match() {
        assert!(match_range("Junior Data Analyst, Milano, ibrido").is_none());
    }

    #[test]
    fn extraction_tags_period_and_strategy() {
        let corpus = vec![
            entry("https://a", "RAL 40.000-45.000€"),
            entry("https://b", "2.000 € al mese"),
            entry("https://c", "nessun numero"),
        ];
        let ranges = extract_patterns(&corpus);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].period, Period::Annual);
        assert_eq!(ranges[1].period, Period::Monthly);
        assert!(ranges.iter().all(|r| r.strategy == ExtractionStrategy::Pattern));
    }
}
