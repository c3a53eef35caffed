//! Pay-period detection and monthly → annual conversion factors.

use std::sync::LazyLock;

use regex::Regex;

use salarysignal_shared::Period;

static ANNUAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ral|annu[aio]|annui|annual|yearly|per year)\b|/\s*anno\b|all['’]anno")
        .expect("valid regex")
});

static MONTHLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)€\s*\d[\d.,]*\s*/?\s*mo\b|\b(?:al mese|mensile|mensili|mensilità|per month)\b|/\s*(?:mese|month)\b",
    )
    .expect("valid regex")
});

/// Markers that put a figure itself in monthly terms. The installment count
/// ("14 mensilità") is not one of them.
static MONTHLY_FIGURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)€\s*\d[\d.,]*\s*/?\s*mo\b|\b(?:al mese|mensile|mensili|per month)\b|/\s*(?:mese|month)\b",
    )
    .expect("valid regex")
});

static MENSILITA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(1[234])\s*mensilit").expect("valid regex")
});

static GENERIC_MENSIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)mensil").expect("valid regex"));

/// Whether the text talks about a monthly figure at all.
pub fn is_monthly_text(text: &str) -> bool {
    MONTHLY_RE.is_match(text)
}

/// Best guess at the period a snippet quotes its figures in.
///
/// A figure marked as monthly ("2.000 € al mese") is monthly even next to
/// "RAL". Otherwise annual markers win, since "RAL 30.000 su 14 mensilità"
/// is an annual figure that merely mentions the installment count.
pub fn detect_period(text: &str) -> Period {
    if MONTHLY_FIGURE_RE.is_match(text) {
        Period::Monthly
    } else if ANNUAL_RE.is_match(text) {
        Period::Annual
    } else if is_monthly_text(text) {
        Period::Monthly
    } else {
        Period::Annual
    }
}

/// Installments per year for a monthly figure quoted in `text`.
///
/// An explicit "12/13/14 mensilità" wins; any other mention of mensilità
/// means 13; no mention at all falls back to `default`.
pub fn monthly_multiplier(text: &str, default: u32) -> u32 {
    if let Some(caps) = MENSILITA_RE.captures(text) {
        if let Ok(count) = caps[1].parse() {
            return count;
        }
    }
    if GENERIC_MENSIL_RE.is_match(text) {
        return 13;
    }
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_mensilita_counts() {
        assert_eq!(monthly_multiplier("3.000€ lordi al mese per 14 mensilità", 13), 14);
        assert_eq!(monthly_multiplier("13 mensilità + ticket", 12), 13);
        assert_eq!(monthly_multiplier("12 mensilità", 13), 12);
    }

    #[test]
    fn generic_and_default_multipliers() {
        assert_eq!(monthly_multiplier("retribuzione mensile 2.000€", 12), 13);
        assert_eq!(monthly_multiplier("2.000€ al mese", 12), 12);
        assert_eq!(monthly_multiplier("2.000€ al mese", 13), 13);
    }

    #[test]
    fn monthly_text_detection() {
        assert!(is_monthly_text("€2.100/mo"));
        assert!(is_monthly_text("1.800 € al mese"));
        assert!(is_monthly_text("stipendio mensile"));
        assert!(!is_monthly_text("RAL 40.000 €"));
    }

    #[test]
    fn annual_markers_win_over_installment_counts() {
        assert_eq!(detect_period("RAL 30.000 su 14 mensilità"), Period::Annual);
        assert_eq!(detect_period("13 mensilità"), Period::Monthly);
        assert_eq!(detect_period("2.000 € al mese"), Period::Monthly);
        assert_eq!(detect_period("Data Analyst 40.000-45.000€"), Period::Annual);
    }

    #[test]
    fn monthly_figures_win_over_bare_annual_words() {
        assert_eq!(detect_period("RAL: 2.000 € lordi al mese per 14 mensilità"), Period::Monthly);
        assert_eq!(detect_period("Retribuzione annua, €2.100/mo"), Period::Monthly);
        assert_eq!(detect_period("RAL 1.800 € mensili"), Period::Monthly);
    }
}
