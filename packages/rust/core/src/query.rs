//! Query synthesis: role/location/company → `site:`-scoped search queries.
//!
//! Pure string building, no network access. The strict tier ORs in salary
//! keywords, the relaxed tier drops them (and, for roles, finally the
//! location too). The reports tier points a role at salary-report sites.

use std::collections::HashSet;

use salarysignal_shared::{QueryTier, SearchQuery};

use crate::sources::{ITALIAN_JOB_POSTING_SITES, JOB_POSTING_SITES, REPORT_SITES};

/// Known synonyms keyed by normalized role.
const ROLE_ALIASES: &[(&str, &[&str])] = &[
    ("data analyst", &["Data Analytics Analyst", "Analytics Analyst"]),
    (
        "compensation and benefits specialist",
        &[
            "C&B Specialist",
            "Compensation & Benefits Specialist",
            "Comp & Ben Specialist",
        ],
    ),
    ("software engineer", &["Software Developer", "SWE"]),
    ("product manager", &["PM"]),
    ("ux designer", &["UX/UI Designer", "User Experience Designer"]),
    ("payroll specialist", &["Payroll Analyst"]),
    ("talent acquisition lead", &["TA Lead", "Talent Acquisition Manager"]),
    ("hrbp", &["HR Business Partner", "Human Resources Business Partner"]),
];

/// Lowercase, `&` → `and`, anything non-alphanumeric → space, collapsed.
pub fn normalize_text(value: &str) -> String {
    value
        .to_lowercase()
        .replace('&', " and ")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The role itself followed by its known synonyms, without duplicates.
pub fn role_terms(role: &str) -> Vec<String> {
    let role = role.trim();
    let normalized = normalize_text(role);
    let mut terms = vec![role.to_string()];

    if normalized == "hr" {
        terms.extend(["HR", "Human Resources", "HR Manager", "HR Specialist"].map(String::from));
    } else {
        let words: Vec<&str> = normalized.split(' ').collect();
        let is_hr = words.contains(&"hr") || normalized.contains("human resources");
        if is_hr && normalized.contains("business partner") {
            terms.extend(["HRBP", "HR BP"].map(String::from));
        }
        if let Some((_, aliases)) = ROLE_ALIASES.iter().find(|(key, _)| *key == normalized) {
            terms.extend(aliases.iter().map(|a| a.to_string()));
        }
    }

    dedup_ordered(terms)
}

/// Builds queries for one request.
#[derive(Debug, Clone)]
pub struct QuerySynthesizer {
    keywords: Vec<String>,
}

impl QuerySynthesizer {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| sanitize(k))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// `("RAL" OR "retribuzione" OR ...)`, empty when no keywords are set.
    fn keyword_group(&self) -> Option<String> {
        (!self.keywords.is_empty()).then(|| or_group(&self.keywords))
    }

    /// Single-role queries against the Italian job-posting scopes, or the
    /// salary-report scopes for [`QueryTier::Reports`].
    pub fn role_queries(&self, role: &str, location: &str, tier: QueryTier) -> Vec<SearchQuery> {
        let role_group = or_group(&role_terms(role));
        let location = sanitize(location);

        let mut texts = Vec::new();
        match tier {
            QueryTier::Strict => {
                for site in ITALIAN_JOB_POSTING_SITES {
                    texts.push(join_parts(&[
                        Some(format!("site:{site}")),
                        Some(role_group.clone()),
                        quoted(&location),
                        self.keyword_group(),
                    ]));
                }
            }
            QueryTier::Relaxed => {
                for site in ITALIAN_JOB_POSTING_SITES {
                    texts.push(join_parts(&[
                        Some(format!("site:{site}")),
                        Some(role_group.clone()),
                        quoted(&location),
                    ]));
                }
                for site in ITALIAN_JOB_POSTING_SITES {
                    texts.push(join_parts(&[Some(format!("site:{site}")), Some(role_group.clone())]));
                }
            }
            QueryTier::Reports => {
                for site in REPORT_SITES {
                    texts.push(join_parts(&[
                        Some(format!("site:{site}")),
                        Some(role_group.clone()),
                        quoted(&location),
                    ]));
                }
            }
        }

        dedup_ordered(texts)
            .into_iter()
            .map(|text| SearchQuery {
                text,
                tier,
                company: None,
            })
            .collect()
    }

    /// Per-company queries against job postings and salary reports. Only the
    /// first `max_competitors` distinct names are used; names that normalize
    /// the same ("Acme", "acme") count once, first spelling kept.
    pub fn competitor_queries(
        &self,
        competitors: &[String],
        location: &str,
        max_competitors: usize,
        tier: QueryTier,
    ) -> Vec<SearchQuery> {
        let location = sanitize(location);
        let mut seen_names = HashSet::new();
        let names: Vec<String> = competitors
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && seen_names.insert(normalize_text(c)))
            .take(max_competitors)
            .collect();

        let mut seen = HashSet::new();
        let mut queries = Vec::new();
        for company in &names {
            for site in JOB_POSTING_SITES.iter().chain(REPORT_SITES) {
                let keywords = match tier {
                    QueryTier::Strict => self.keyword_group(),
                    QueryTier::Relaxed | QueryTier::Reports => None,
                };
                let text = join_parts(&[
                    Some(format!("site:{site}")),
                    quoted(&sanitize(company)),
                    quoted(&location),
                    keywords,
                ]);
                if seen.insert(text.clone()) {
                    queries.push(SearchQuery {
                        text,
                        tier,
                        company: Some(company.clone()),
                    });
                }
            }
        }
        queries
    }
}

/// Strip quotes so user input cannot break out of a quoted phrase.
fn sanitize(value: &str) -> String {
    value.replace('"', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn quoted(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| format!("\"{value}\""))
}

fn or_group(terms: &[String]) -> String {
    let quoted: Vec<String> = terms
        .iter()
        .map(|t| sanitize(t))
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\""))
        .collect();
    format!("({})", quoted.join(" OR "))
}

fn join_parts(parts: &[Option<String>]) -> String {
    parts.iter().flatten().cloned().collect::<Vec<_>>().join(" ")
}

fn dedup_ordered(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> Vec<String> {
        ["RAL", "stipendio", "€"].map(String::from).to_vec()
    }

    #[test]
    fn normalizes_role_text() {
        assert_eq!(normalize_text("  C&B   Specialist! "), "c and b specialist");
        assert_eq!(normalize_text("UX/UI Designer"), "ux ui designer");
        assert_eq!(normalize_text("Responsabile Qualità"), "responsabile qualità");
    }

    #[test]
    fn alias_table_expands_roles() {
        assert_eq!(
            role_terms("Data Analyst"),
            vec!["Data Analyst", "Data Analytics Analyst", "Analytics Analyst"]
        );
        assert_eq!(
            role_terms("Compensation & Benefits Specialist")[1..],
            ["C&B Specialist", "Compensation & Benefits Specialist", "Comp & Ben Specialist"]
        );
        assert_eq!(role_terms("Chef"), vec!["Chef"]);
    }

    #[test]
    fn hr_expansions() {
        assert_eq!(
            role_terms("HR"),
            vec!["HR", "Human Resources", "HR Manager", "HR Specialist"]
        );
        assert_eq!(role_terms("HR Business Partner"), vec!["HR Business Partner", "HRBP", "HR BP"]);
        assert_eq!(
            role_terms("hrbp"),
            vec!["hrbp", "HR Business Partner", "Human Resources Business Partner"]
        );
    }

    #[test]
    fn strict_role_queries_carry_keywords_and_location() {
        let synth = QuerySynthesizer::new(&keywords());
        let queries = synth.role_queries("Data Analyst", "Milano", QueryTier::Strict);

        assert_eq!(queries.len(), 3);
        assert_eq!(
            queries[0].text,
            "site:it.linkedin.com/jobs/view (\"Data Analyst\" OR \"Data Analytics Analyst\" OR \"Analytics Analyst\") \"Milano\" (\"RAL\" OR \"stipendio\" OR \"€\")"
        );
        assert!(queries.iter().all(|q| q.tier == QueryTier::Strict && q.company.is_none()));
    }

    #[test]
    fn relaxed_role_queries_drop_keywords_then_location() {
        let synth = QuerySynthesizer::new(&keywords());
        let queries = synth.role_queries("Chef", "Roma", QueryTier::Relaxed);

        assert_eq!(queries.len(), 6);
        assert_eq!(queries[0].text, "site:it.linkedin.com/jobs/view (\"Chef\") \"Roma\"");
        assert_eq!(queries[3].text, "site:it.linkedin.com/jobs/view (\"Chef\")");
        assert!(queries.iter().all(|q| !q.text.contains("RAL")));
    }

    #[test]
    fn competitor_queries_are_capped_and_tagged() {
        let synth = QuerySynthesizer::new(&keywords());
        let names: Vec<String> = ["Acme", "acme ", "Globex", "Initech", "Umbrella", "Hooli", "Stark", "Wayne"]
            .map(String::from)
            .to_vec();
        let queries = synth.competitor_queries(&names, "Milano", 6, QueryTier::Strict);

        let per_company = JOB_POSTING_SITES.len() + REPORT_SITES.len();
        // "acme " is the same company as "Acme", so only Wayne is cut
        assert_eq!(queries.len(), 6 * per_company);
        assert!(queries.iter().all(|q| q.company.as_deref() != Some("Wayne")));
        assert!(queries.iter().any(|q| q.company.as_deref() == Some("Stark")));
        assert!(queries.iter().all(|q| q.company.as_deref() != Some("acme ")));
        assert_eq!(queries[0].company.as_deref(), Some("Acme"));
        assert!(queries[0].text.starts_with("site:linkedin.com/jobs/view \"Acme\" \"Milano\" (\"RAL\""));
    }

    #[test]
    fn competitor_names_differing_in_case_share_a_slot() {
        let synth = QuerySynthesizer::new(&[]);
        let names: Vec<String> = ["Acme", "ACME", "Globex"].map(String::from).to_vec();
        let queries = synth.competitor_queries(&names, "Milano", 2, QueryTier::Relaxed);

        let companies: HashSet<&str> = queries.iter().filter_map(|q| q.company.as_deref()).collect();
        assert_eq!(companies, HashSet::from(["Acme", "Globex"]));
    }

    #[test]
    fn report_queries_target_salary_sites() {
        let synth = QuerySynthesizer::new(&keywords());
        let queries = synth.role_queries("Chef", "Roma", QueryTier::Reports);

        assert_eq!(queries.len(), REPORT_SITES.len());
        assert_eq!(queries[0].text, "site:datapizza.com (\"Chef\") \"Roma\"");
        assert!(queries.iter().all(|q| q.tier == QueryTier::Reports && !q.text.contains("RAL")));
    }

    #[test]
    fn quotes_in_input_are_neutralized() {
        let synth = QuerySynthesizer::new(&[]);
        let queries = synth.role_queries("Senior \"Chef", "Mi\"lano", QueryTier::Strict);
        assert_eq!(queries[0].text, "site:it.linkedin.com/jobs/view (\"Senior Chef\") \"Mi lano\"");
    }
}
