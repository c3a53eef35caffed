//! Source allowlist: which result URLs may contribute salary figures.

use url::Url;

/// Job-posting scopes used in `site:` restrictions. The single-role variant
/// narrows them to the Italian subdomains.
pub const JOB_POSTING_SITES: &[&str] = &["linkedin.com/jobs/view", "indeed.com/viewjob"];

/// Italian job-posting scopes for the single-role variant.
pub const ITALIAN_JOB_POSTING_SITES: &[&str] = &[
    "it.linkedin.com/jobs/view",
    "it.indeed.com/viewjob",
    "it.indeed.com/job",
];

/// Salary-report and aggregator scopes.
pub const REPORT_SITES: &[&str] = &[
    "datapizza.com",
    "techcompenso.com",
    "stipendiogiusto.it",
    "crebs.it",
    "reteinformaticalavoro.it",
    "wellfound.com",
    "glassdoor.it",
    "glassdoor.com",
];

/// Which kinds of source a request accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    JobPostings,
    JobPostingsAndReports,
}

/// Kind of an allowlisted source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    LinkedInPosting,
    IndeedPosting,
    SalaryReport,
}

impl SourceKind {
    /// Classify a result URL. `None` means the URL is not allowlisted.
    pub fn classify(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        let host = url.host_str()?.to_lowercase();
        let path = url.path().to_lowercase();

        if host_is(&host, "linkedin.com") && path.starts_with("/jobs/view") {
            return Some(Self::LinkedInPosting);
        }
        if host_is(&host, "indeed.com") && (path.starts_with("/viewjob") || path.starts_with("/job")) {
            return Some(Self::IndeedPosting);
        }

        let report = host.contains("glassdoor.")
            || host_is(&host, "wellfound.com")
            || host_is(&host, "angel.co")
            || host.contains("datapizza.")
            || host.contains("techcompenso")
            || host.contains("stipendiogiusto")
            || host.contains("crebs")
            || host.contains("reteinformaticalavoro");
        report.then_some(Self::SalaryReport)
    }

    pub fn is_posting(&self) -> bool {
        matches!(self, Self::LinkedInPosting | Self::IndeedPosting)
    }
}

impl SourceMode {
    /// Whether `url` is an accepted source in this mode.
    pub fn allows(&self, url: &str) -> bool {
        match (SourceKind::classify(url), self) {
            (None, _) => false,
            (Some(kind), Self::JobPostings) => kind.is_posting(),
            (Some(_), Self::JobPostingsAndReports) => true,
        }
    }
}

/// `host` is `domain` or one of its subdomains.
fn host_is(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}
