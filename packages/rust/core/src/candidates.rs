//! Candidate filter and deduplicator.
//!
//! Narrows raw search hits to the corpus the extractors see: allowlisted
//! source, relevant to the target, unique by URL, capped.

use std::collections::HashSet;

use tracing::debug;

use salarysignal_shared::{CandidateEntry, RawResult, RelevancePolicy};

use crate::query::normalize_text;
use crate::sources::{SourceKind, SourceMode};

/// What a hit must be about.
#[derive(Debug, Clone)]
pub enum Target {
    /// Any of these role terms (the role plus its aliases).
    Role(Vec<String>),
    /// The company the originating query was built for. Must appear in the
    /// title, or in the snippet of an Indeed posting.
    Company,
}

/// Token containment test. Tokens shorter than 2 characters are ignored; a
/// term with no significant tokens never matches.
pub fn term_matches(normalized_text: &str, term: &str, policy: RelevancePolicy) -> bool {
    let normalized_term = normalize_text(term);
    let tokens: Vec<&str> = normalized_term
        .split(' ')
        .filter(|t| t.chars().count() >= 2)
        .collect();
    if tokens.is_empty() {
        return false;
    }
    match policy {
        RelevancePolicy::AllTokens => tokens.iter().all(|t| normalized_text.contains(t)),
        RelevancePolicy::AnyToken => tokens.iter().any(|t| normalized_text.contains(t)),
    }
}

#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub mode: SourceMode,
    pub policy: RelevancePolicy,
    pub cap: usize,
}

impl CandidateFilter {
    pub fn new(mode: SourceMode, policy: RelevancePolicy, cap: usize) -> Self {
        Self { mode, policy, cap }
    }

    /// Build the corpus from raw hits, in first-seen order.
    pub fn filter(&self, raw: &[RawResult], target: &Target) -> Vec<CandidateEntry> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut corpus = Vec::new();

        for hit in raw {
            if corpus.len() >= self.cap {
                break;
            }
            let url = hit.url.trim();
            if url.is_empty() || seen.contains(url) {
                continue;
            }
            if !self.mode.allows(url) {
                debug!(url, "source not allowlisted");
                continue;
            }
            if !self.is_relevant(hit, target) {
                debug!(url, "irrelevant hit");
                continue;
            }
            seen.insert(url);
            let mut entry = CandidateEntry::from(hit);
            entry.url = url.to_string();
            corpus.push(entry);
        }

        corpus
    }

    fn is_relevant(&self, hit: &RawResult, target: &Target) -> bool {
        match target {
            Target::Role(terms) => {
                let text = normalize_text(&hit.combined_text());
                terms.iter().any(|term| term_matches(&text, term, self.policy))
            }
            Target::Company => {
                let Some(company) = hit.company.as_deref() else {
                    return false;
                };
                if term_matches(&normalize_text(&hit.title), company, self.policy) {
                    return true;
                }
                SourceKind::classify(&hit.url) == Some(SourceKind::IndeedPosting)
                    && term_matches(&normalize_text(&hit.snippet), company, self.policy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str, title: &str, snippet: &str, company: Option<&str>) -> RawResult {
        RawResult {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
            company: company.map(String::from),
        }
    }

    fn role_filter(cap: usize) -> CandidateFilter {
        CandidateFilter::new(SourceMode::JobPostings, RelevancePolicy::AllTokens, cap)
    }

    fn data_analyst() -> Target {
        Target::Role(vec!["Data Analyst".into(), "Analytics Analyst".into()])
    }

    #[test]
    fn all_tokens_is_containment_not_fuzzy() {
        let text = normalize_text("Senior Data-Analyst, Milano");
        assert!(term_matches(&text, "Data Analyst", RelevancePolicy::AllTokens));
        assert!(!term_matches(&text, "Data Engineer", RelevancePolicy::AllTokens));
        assert!(term_matches(&text, "Data Engineer", RelevancePolicy::AnyToken));
        // Single-character tokens are not significant
        assert!(!term_matches(&text, "C", RelevancePolicy::AnyToken));
    }

    #[test]
    fn keeps_relevant_allowlisted_hits_in_order() {
        let raw = vec![
            hit("https://it.linkedin.com/jobs/view/1", "Data Analyst", "RAL 40k", None),
            hit("https://example.com/blog", "Data Analyst salaries", "", None),
            hit("https://it.indeed.com/viewjob?jk=2", "Cuoco", "Milano", None),
            hit("https://it.indeed.com/viewjob?jk=3", "Analista", "Cerchiamo un analytics analyst", None),
        ];
        let corpus = role_filter(30).filter(&raw, &data_analyst());

        let urls: Vec<_> = corpus.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://it.linkedin.com/jobs/view/1", "https://it.indeed.com/viewjob?jk=3"]
        );
        assert_eq!(corpus[0].text, "Data Analyst RAL 40k");
    }

    #[test]
    fn dedups_by_url_first_wins() {
        let raw = vec![
            hit("https://it.linkedin.com/jobs/view/1", "Data Analyst", "first", None),
            hit("https://it.linkedin.com/jobs/view/1", "Data Analyst", "second", None),
        ];
        let corpus = role_filter(30).filter(&raw, &data_analyst());
        assert_eq!(corpus.len(), 1);
        assert!(corpus[0].text.ends_with("first"));
    }

    #[test]
    fn caps_corpus() {
        let raw: Vec<_> = (0..10)
            .map(|i| hit(&format!("https://it.linkedin.com/jobs/view/{i}"), "Data Analyst", "", None))
            .collect();
        assert_eq!(role_filter(4).filter(&raw, &data_analyst()).len(), 4);
    }

    #[test]
    fn company_must_be_in_title_or_indeed_snippet() {
        let filter = CandidateFilter::new(
            SourceMode::JobPostingsAndReports,
            RelevancePolicy::AllTokens,
            40,
        );
        let raw = vec![
            hit("https://www.glassdoor.it/Stipendi/acme", "Stipendi Acme Corp", "", Some("Acme Corp")),
            hit("https://it.indeed.com/viewjob?jk=9", "Data Analyst", "presso Acme Corp", Some("Acme Corp")),
            hit("https://it.linkedin.com/jobs/view/7", "Data Analyst", "presso Acme Corp", Some("Acme Corp")),
            hit("https://www.glassdoor.it/Stipendi/other", "Stipendi Acme Corp", "", None),
        ];
        let corpus = filter.filter(&raw, &Target::Company);

        let urls: Vec<_> = corpus.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://www.glassdoor.it/Stipendi/acme", "https://it.indeed.com/viewjob?jk=9"]
        );
        assert_eq!(corpus[0].company.as_deref(), Some("Acme Corp"));
    }
}
