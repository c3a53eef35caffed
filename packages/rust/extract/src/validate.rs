//! Value normalizer and validator.
//!
//! Turns untrusted [`ExtractedRange`]s into [`ValidatedRange`]s:
//! annualize monthly figures, order the bounds, rescale bare thousands,
//! apply plausibility bounds and finally require that the figures literally
//! appear in the candidate's text.

use std::collections::HashSet;

use tracing::debug;

use salarysignal_shared::{
    CandidateEntry, ExtractedRange, PipelineConfig, Period, ValidatedRange,
};

use crate::number::group_thousands;
use crate::period::monthly_multiplier;

/// Plausibility window for an annual upper bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryBounds {
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for SalaryBounds {
    fn default() -> Self {
        Self {
            floor: 15_000.0,
            ceiling: 300_000.0,
        }
    }
}

/// Why an extracted range was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The range points at a URL that is not in the corpus.
    UnknownSource,
    /// A bound is NaN, infinite or negative.
    NotFinite,
    /// Upper bound outside the plausibility window.
    Implausible,
    /// Neither bound appears in the source text.
    NoLiteralMatch,
}

/// Order the bounds, rescale values quoted in thousands and apply the
/// plausibility window. Applying it to its own output is a no-op.
///
/// A lower bound under a tenth of the floor is a unit mix-up ("30" next to
/// "35000"), not a salary, and rejects the range.
pub fn normalize_range(min: f64, max: f64, bounds: SalaryBounds) -> Option<(f64, f64)> {
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    let (mut lo, mut hi) = if min > max { (max, min) } else { (min, max) };
    if hi < 1_000.0 {
        lo *= 1_000.0;
        hi *= 1_000.0;
    }
    if hi < bounds.floor || hi > bounds.ceiling || lo < bounds.floor / 10.0 {
        return None;
    }
    Some((lo, hi))
}

/// Whether `value` appears in `text` as a whole token, in any of the forms
/// a posting might use: `42000`, `42.000`, `42,000`, `42k`, `42 k`, and for
/// figures with cents `1.850,50` or `1,850.50`.
pub fn literal_match(text: &str, value: f64) -> bool {
    if text.is_empty() || !value.is_finite() || value < 0.0 {
        return false;
    }
    let text = text.to_lowercase();
    literal_forms(value)
        .iter()
        .any(|form| contains_token(&text, form))
}

fn literal_forms(value: f64) -> Vec<String> {
    let cents = (value * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    if fraction != 0 {
        let two = format!("{fraction:02}");
        let mut decimals = vec![two.clone()];
        if let Some(short) = two.strip_suffix('0') {
            decimals.push(short.to_string());
        }
        let mut forms = Vec::new();
        for dec in &decimals {
            forms.push(format!("{},{dec}", group_thousands(whole, '.')));
            forms.push(format!("{},{dec}", whole));
            forms.push(format!("{}.{dec}", group_thousands(whole, ',')));
            forms.push(format!("{}.{dec}", whole));
        }
        return forms;
    }

    let mut forms = vec![
        whole.to_string(),
        group_thousands(whole, '.'),
        group_thousands(whole, ','),
    ];
    if whole >= 1_000 && whole % 1_000 == 0 {
        let thousands = whole / 1_000;
        forms.push(format!("{thousands}k"));
        forms.push(format!("{thousands} k"));
    }
    forms
}

/// `needle` occurs in `haystack` with no word character on either side.
fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Validates extracted ranges against their source candidates.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    bounds: SalaryBounds,
    default_mensilita: u32,
}

impl Validator {
    pub fn new(bounds: SalaryBounds, default_mensilita: u32) -> Self {
        Self {
            bounds,
            default_mensilita,
        }
    }

    pub fn bounds(&self) -> SalaryBounds {
        self.bounds
    }

    /// Validate one range against its source entry.
    pub fn validate(
        &self,
        range: &ExtractedRange,
        source: &CandidateEntry,
    ) -> std::result::Result<ValidatedRange, Rejection> {
        if range.url != source.url {
            return Err(Rejection::UnknownSource);
        }
        if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 || range.max < 0.0 {
            return Err(Rejection::NotFinite);
        }

        let factor = match range.period {
            Period::Monthly => f64::from(monthly_multiplier(&source.text, self.default_mensilita)),
            Period::Annual => 1.0,
        };

        let (min, max) = normalize_range(range.min * factor, range.max * factor, self.bounds)
            .ok_or(Rejection::Implausible)?;

        // The gate looks at the figures as quoted, before annualization.
        if !literal_match(&source.text, range.min) && !literal_match(&source.text, range.max) {
            return Err(Rejection::NoLiteralMatch);
        }

        Ok(ValidatedRange {
            url: source.url.clone(),
            title: source.title.clone(),
            min,
            max,
            company: range.company.clone().or_else(|| source.company.clone()),
            strategy: range.strategy,
        })
    }

    /// Validate a batch against the corpus. Ranges whose URL is not in the
    /// corpus are dropped, and only the first valid range per URL is kept.
    pub fn validate_all(
        &self,
        ranges: &[ExtractedRange],
        corpus: &[CandidateEntry],
    ) -> Vec<ValidatedRange> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut validated = Vec::new();

        for range in ranges {
            if seen.contains(range.url.as_str()) {
                continue;
            }
            let outcome = match corpus.iter().find(|entry| entry.url == range.url) {
                Some(source) => self.validate(range, source),
                None => Err(Rejection::UnknownSource),
            };
            match outcome {
                Ok(valid) => {
                    seen.insert(range.url.as_str());
                    validated.push(valid);
                }
                Err(reason) => {
                    debug!(url = %range.url, min = range.min, max = range.max, ?reason, "range rejected");
                }
            }
        }

        validated
    }
}

impl From<&PipelineConfig> for Validator {
    fn from(config: &PipelineConfig) -> Self {
        Self::new(
            SalaryBounds {
                floor: config.salary_floor,
                ceiling: config.salary_ceiling,
            },
            config.default_mensilita,
        )
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(SalaryBounds::default(), 13)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salarysignal_shared::ExtractionStrategy;

    fn source(text: &str) -> CandidateEntry {
        CandidateEntry {
            url: "https://it.indeed.com/viewjob?jk=1".into(),
            title: "Data Analyst".into(),
            text: text.into(),
            company: None,
        }
    }

    fn range(min: f64, max: f64, period: Period) -> ExtractedRange {
        ExtractedRange {
            url: "https://it.indeed.com/viewjob?jk=1".into(),
            min,
            max,
            period,
            company: None,
            strategy: ExtractionStrategy::Llm,
        }
    }

    #[test]
    fn normalize_swaps_and_rescales() {
        let b = SalaryBounds::default();
        assert_eq!(normalize_range(45_000.0, 40_000.0, b), Some((40_000.0, 45_000.0)));
        assert_eq!(normalize_range(40.0, 55.0, b), Some((40_000.0, 55_000.0)));
        assert_eq!(normalize_range(1_000.0, 9_000.0, b), None);
        assert_eq!(normalize_range(100_000.0, 400_000.0, b), None);
        assert_eq!(normalize_range(f64::NAN, 40_000.0, b), None);
    }

    #[test]
    fn normalize_is_a_fixed_point() {
        let b = SalaryBounds::default();
        for (min, max) in [(40.0, 55.0), (45_000.0, 38_000.0), (2_500.0, 39_000.0)] {
            let once = normalize_range(min, max, b).unwrap();
            let twice = normalize_range(once.0, once.1, b).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn accepted_literal_forms() {
        let text = "RAL 40.000-45.000€, bonus 5k, welfare 1,500";
        assert!(literal_match(text, 40_000.0));
        assert!(literal_match(text, 45_000.0));
        assert!(literal_match(text, 5_000.0));
        assert!(literal_match(text, 1_500.0));
        assert!(literal_match("fino a 42 k lordi", 42_000.0));
        assert!(literal_match("38000 euro", 38_000.0));
        assert!(!literal_match(text, 42_500.0));
        assert!(!literal_match("RAL 140.000", 40_000.0));
    }

    #[test]
    fn thousands_form_only_for_round_values() {
        assert!(!literal_match("bonus 43k", 42_500.0));
        assert!(literal_match("bonus 43K", 43_000.0));
        assert!(!literal_match("RAL 42.500", 42_000.0));
    }

    #[test]
    fn figures_with_cents() {
        assert!(literal_match("1.850,50 € al mese", 1_850.5));
        assert!(literal_match("$1,850.50 per month", 1_850.5));
        assert!(literal_match("1850,5 euro", 1_850.5));
        assert!(!literal_match("1.850 € al mese", 1_850.5));
    }

    #[test]
    fn tiny_lower_bound_is_a_unit_error() {
        let b = SalaryBounds::default();
        assert_eq!(normalize_range(30.0, 35_000.0, b), None);
        assert_eq!(normalize_range(1_500.0, 35_000.0, b), Some((1_500.0, 35_000.0)));
    }

    #[test]
    fn single_suffix_ranges_validate_in_full() {
        let v = Validator::default();
        for (text, expected) in [
            ("Data Analyst Milano RAL 30-35k €", (30_000.0, 35_000.0)),
            ("Data Analyst, RAL 40-55k", (40_000.0, 55_000.0)),
        ] {
            let corpus = vec![source(text)];
            let out = v.validate_all(&crate::extract_patterns(&corpus), &corpus);
            assert_eq!(out.len(), 1, "{text}");
            assert_eq!((out[0].min, out[0].max), expected, "{text}");
        }
    }

    #[test]
    fn monthly_figure_next_to_ral_is_annualized() {
        let corpus = vec![source("RAL: 2.000 € lordi al mese per 14 mensilità")];
        let extracted = crate::extract_patterns(&corpus);
        assert_eq!(extracted[0].period, Period::Monthly);

        let out = Validator::default().validate_all(&extracted, &corpus);
        assert_eq!((out[0].min, out[0].max), (28_000.0, 28_000.0));
    }

    #[test]
    fn monthly_with_fourteen_installments() {
        let v = Validator::default();
        let text = "Impiegato amministrativo 3.000 € lordi al mese per 14 mensilità";
        let out = v.validate(&range(3_000.0, 3_000.0, Period::Monthly), &source(text)).unwrap();
        assert_eq!((out.min, out.max), (42_000.0, 42_000.0));
    }

    #[test]
    fn monthly_without_count_uses_default() {
        let text = "1.800 - 2.000 € al mese";
        let thirteen = Validator::new(SalaryBounds::default(), 13)
            .validate(&range(1_800.0, 2_000.0, Period::Monthly), &source(text))
            .unwrap();
        assert_eq!((thirteen.min, thirteen.max), (23_400.0, 26_000.0));

        let twelve = Validator::new(SalaryBounds::default(), 12)
            .validate(&range(1_800.0, 2_000.0, Period::Monthly), &source(text))
            .unwrap();
        assert_eq!((twelve.min, twelve.max), (21_600.0, 24_000.0));
    }

    #[test]
    fn hallucinated_values_are_rejected() {
        let v = Validator::default();
        let err = v
            .validate(&range(50_000.0, 60_000.0, Period::Annual), &source("RAL 40.000-45.000€"))
            .unwrap_err();
        assert_eq!(err, Rejection::NoLiteralMatch);
    }

    #[test]
    fn one_matching_bound_is_enough() {
        let v = Validator::default();
        let out = v
            .validate(&range(40_000.0, 47_000.0, Period::Annual), &source("da 40.000 € in su"))
            .unwrap();
        assert_eq!(out.max, 47_000.0);
    }

    #[test]
    fn implausible_values_are_rejected() {
        let v = Validator::default();
        let err = v
            .validate(&range(2_020.0, 2_024.0, Period::Annual), &source("2020-2024 lordi"))
            .unwrap_err();
        assert_eq!(err, Rejection::Implausible);
    }

    #[test]
    fn validated_ranges_hold_invariants() {
        let v = Validator::default();
        let corpus = vec![source("RAL 45.000 - 40.000 €")];
        let ranges = vec![
            range(45_000.0, 40_000.0, Period::Annual),
            range(40_000.0, 45_000.0, Period::Annual),
        ];
        let out = v.validate_all(&ranges, &corpus);
        assert_eq!(out.len(), 1, "one range per url");
        for r in &out {
            assert!(r.min <= r.max);
            assert!(r.max >= 15_000.0 && r.max <= 300_000.0);
            assert!(literal_match(&corpus[0].text, r.min) || literal_match(&corpus[0].text, r.max));
        }
    }

    #[test]
    fn ranges_without_source_are_dropped() {
        let v = Validator::default();
        let mut orphan = range(40_000.0, 45_000.0, Period::Annual);
        orphan.url = "https://elsewhere.example/job".into();
        let out = v.validate_all(&[orphan], &[source("RAL 40.000-45.000€")]);
        assert!(out.is_empty());
    }
}
