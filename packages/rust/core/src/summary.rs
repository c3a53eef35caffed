//! Folds validated ranges into one distribution with citations.

use std::collections::HashSet;

use serde::Serialize;

use salarysignal_shared::{Benchmark, BenchmarkSummary, ValidatedRange};

/// Per-competitor distribution in the competitor benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorAggregate {
    pub competitor: String,
    #[serde(flatten)]
    pub summary: BenchmarkSummary,
}

/// Global min of mins, global max of maxes, rounded mean of midpoints and
/// the contributing URLs in first-seen order. No ranges means no verified
/// salary.
pub fn summarize(ranges: &[ValidatedRange]) -> Benchmark {
    if ranges.is_empty() {
        return Benchmark::NoVerifiedSalary;
    }

    let min = ranges.iter().map(|r| r.min).fold(f64::INFINITY, f64::min);
    let max = ranges.iter().map(|r| r.max).fold(f64::NEG_INFINITY, f64::max);
    let mean = ranges.iter().map(ValidatedRange::midpoint).sum::<f64>() / ranges.len() as f64;

    let mut seen = HashSet::new();
    let sources = ranges
        .iter()
        .filter(|r| seen.insert(r.url.as_str()))
        .map(|r| r.url.clone())
        .collect();

    Benchmark::Verified(BenchmarkSummary {
        min,
        med: mean.round(),
        max,
        sources,
    })
}

/// One aggregate per competitor, in first-seen order. Ranges without a
/// competitor tag are left out.
pub fn summarize_by_competitor(ranges: &[ValidatedRange]) -> Vec<CompetitorAggregate> {
    let mut order: Vec<&str> = Vec::new();
    for name in ranges.iter().filter_map(|r| r.company.as_deref()) {
        if !order.contains(&name) {
            order.push(name);
        }
    }

    order
        .into_iter()
        .filter_map(|name| {
            let own: Vec<ValidatedRange> = ranges
                .iter()
                .filter(|r| r.company.as_deref() == Some(name))
                .cloned()
                .collect();
            match summarize(&own) {
                Benchmark::Verified(summary) => Some(CompetitorAggregate {
                    competitor: name.to_string(),
                    summary,
                }),
                Benchmark::NoVerifiedSalary => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use salarysignal_shared::ExtractionStrategy;

    fn range(url: &str, min: f64, max: f64, company: Option<&str>) -> ValidatedRange {
        ValidatedRange {
            url: url.into(),
            title: String::new(),
            min,
            max,
            company: company.map(String::from),
            strategy: ExtractionStrategy::Pattern,
        }
    }

    #[test]
    fn empty_is_no_verified_salary() {
        let benchmark = summarize(&[]);
        assert_eq!(benchmark, Benchmark::NoVerifiedSalary);
        assert!(benchmark.sources().is_empty());
    }

    #[test]
    fn single_range() {
        let Benchmark::Verified(s) = summarize(&[range("https://a", 40000.0, 45000.0, None)]) else {
            panic!("expected verified");
        };
        assert_eq!((s.min, s.med, s.max), (40000.0, 42500.0, 45000.0));
        assert_eq!(s.sources, vec!["https://a"]);
    }

    #[test]
    fn med_is_rounded_mean_of_midpoints() {
        let ranges = [
            range("https://a", 30000.0, 35000.0, None),
            range("https://b", 40001.0, 50000.0, None),
            range("https://a", 28000.0, 31000.0, None),
        ];
        let Benchmark::Verified(s) = summarize(&ranges) else {
            panic!("expected verified");
        };
        // midpoints 32500, 45000.5, 29500 → mean 35666.83
        assert_eq!(s.med, 35667.0);
        assert_eq!(s.min, 28000.0);
        assert_eq!(s.max, 50000.0);
        assert_eq!(s.sources, vec!["https://a", "https://b"]);
    }

    #[test]
    fn groups_by_competitor() {
        let ranges = [
            range("https://a", 30000.0, 35000.0, Some("Acme")),
            range("https://b", 50000.0, 60000.0, Some("Globex")),
            range("https://c", 32000.0, 40000.0, Some("Acme")),
            range("https://d", 20000.0, 25000.0, None),
        ];
        let aggregates = summarize_by_competitor(&ranges);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].competitor, "Acme");
        assert_eq!(aggregates[0].summary.min, 30000.0);
        assert_eq!(aggregates[0].summary.max, 40000.0);
        assert_eq!(aggregates[0].summary.sources, vec!["https://a", "https://c"]);
        assert_eq!(aggregates[1].competitor, "Globex");
    }
}
