//! End-to-end benchmarks: request → queries → search → corpus → ranges → summary.
//!
//! Both variants share one tiered loop. The strict query tier runs first;
//! the relaxed tier runs only when the strict one yields no candidates or
//! no validated range. A single role then falls back to salary-report sites
//! unless `report_fallback` is off. Inside a tier, extraction follows the
//! configured [`ExtractionMode`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use salarysignal_extract::{Validator, extract_patterns};
use salarysignal_llm::LlmProvider;
use salarysignal_search::{FanOutOptions, SearchProvider, fan_out};
use salarysignal_shared::{
    Benchmark, CandidateEntry, CompetitorRange, CompetitorRequest, DiagnosticEvent, Diagnostics,
    ExtractedRange, ExtractionMode, ExtractionStrategy, ModelStage, PipelineConfig, QueryTier,
    Result, RoleRequest, SalarySignalError, SearchQuery, ValidatedRange,
};

use crate::candidates::{CandidateFilter, Target};
use crate::llm_extract::extract_with_llm;
use crate::query::{QuerySynthesizer, role_terms};
use crate::sources::SourceMode;
use crate::summary::{CompetitorAggregate, summarize, summarize_by_competitor};

/// Outcome of a single-role benchmark.
#[derive(Debug, Clone)]
pub struct RoleReport {
    pub benchmark: Benchmark,
    /// The ranges the benchmark was folded from.
    pub ranges: Vec<ValidatedRange>,
    pub diagnostics: Diagnostics,
}

impl RoleReport {
    /// Response body: the summary with diagnostics, or the bare sentinel.
    pub fn to_payload(&self) -> serde_json::Value {
        let mut payload = self.benchmark.to_payload();
        if self.benchmark.is_verified() {
            payload["diagnostics"] = json!(self.diagnostics);
        }
        payload
    }
}

/// Outcome of a competitor benchmark. Empty `items` is the no-data outcome.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorReport {
    pub items: Vec<CompetitorRange>,
    pub aggregates: Vec<CompetitorAggregate>,
    pub diagnostics: Diagnostics,
}

impl CompetitorReport {
    pub fn to_payload(&self) -> serde_json::Value {
        json!(self)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a search batch settles.
    fn search_settled(&self, tier: QueryTier, results: usize, failed: usize);
    /// Called when the pipeline completes with `ranges` validated ranges.
    fn done(&self, ranges: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn search_settled(&self, _tier: QueryTier, _results: usize, _failed: usize) {}
    fn done(&self, _ranges: usize) {}
}

/// One step of the query-tier cascade.
struct SearchStage {
    tier: QueryTier,
    queries: Vec<SearchQuery>,
    filter: CandidateFilter,
}

/// One parameterized pipeline serving both request variants. Holds no
/// per-request state.
pub struct SalaryPipeline {
    search: Arc<dyn SearchProvider>,
    llm: Option<Arc<dyn LlmProvider>>,
    models: Vec<ModelStage>,
    config: PipelineConfig,
    validator: Validator,
    queries: QuerySynthesizer,
}

impl SalaryPipeline {
    /// `llm` is optional: without it the LLM strategy is skipped and
    /// recorded as such.
    pub fn new(
        search: Arc<dyn SearchProvider>,
        llm: Option<Arc<dyn LlmProvider>>,
        models: Vec<ModelStage>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            validator: Validator::from(&config),
            queries: QuerySynthesizer::new(&config.salary_keywords),
            search,
            llm,
            models,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Benchmark a single role in a location.
    #[instrument(skip_all, fields(role = %request.role, location = %request.location))]
    pub async fn benchmark_role(
        &self,
        request: &RoleRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<RoleReport> {
        let request = request.validate()?;
        self.within_budget("salary benchmark", self.run_role(&request, progress))
            .await
    }

    /// Benchmark a set of competitors in a location.
    #[instrument(skip_all, fields(competitors = request.competitors.len(), location = %request.location))]
    pub async fn benchmark_competitors(
        &self,
        request: &CompetitorRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<CompetitorReport> {
        let request = request.validate()?;
        self.within_budget("competitor benchmark", self.run_competitors(&request, progress))
            .await
    }

    async fn within_budget<T>(
        &self,
        operation: &str,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let budget = self.config.request_budget_ms;
        tokio::time::timeout(Duration::from_millis(budget), work)
            .await
            .unwrap_or_else(|_| {
                warn!(operation, budget_ms = budget, "request budget exhausted");
                Err(SalarySignalError::timeout(operation, budget))
            })
    }

    async fn run_role(
        &self,
        request: &RoleRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<RoleReport> {
        let mut diagnostics = Diagnostics::new();
        info!(request_id = %diagnostics.request_id, "starting salary benchmark");

        let mut tiers = vec![QueryTier::Strict, QueryTier::Relaxed];
        if self.config.report_fallback {
            tiers.push(QueryTier::Reports);
        }
        let stages = tiers
            .into_iter()
            .map(|tier| {
                let mode = match tier {
                    QueryTier::Reports => SourceMode::JobPostingsAndReports,
                    QueryTier::Strict | QueryTier::Relaxed => SourceMode::JobPostings,
                };
                SearchStage {
                    tier,
                    queries: self.queries.role_queries(&request.role, &request.location, tier),
                    filter: CandidateFilter::new(
                        mode,
                        self.config.relevance,
                        self.config.role_corpus_cap,
                    ),
                }
            })
            .collect();
        let target = Target::Role(role_terms(&request.role));

        let ranges = self
            .run_tiers(stages, &target, &mut diagnostics, progress)
            .await?;
        let benchmark = summarize(&ranges);

        progress.done(ranges.len());
        info!(
            request_id = %diagnostics.request_id,
            ranges = ranges.len(),
            verified = benchmark.is_verified(),
            "salary benchmark complete"
        );

        Ok(RoleReport {
            benchmark,
            ranges,
            diagnostics,
        })
    }

    async fn run_competitors(
        &self,
        request: &CompetitorRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<CompetitorReport> {
        let mut diagnostics = Diagnostics::new();
        info!(request_id = %diagnostics.request_id, "starting competitor benchmark");

        let filter = CandidateFilter::new(
            SourceMode::JobPostingsAndReports,
            self.config.relevance,
            self.config.competitor_corpus_cap,
        );
        let stages = [QueryTier::Strict, QueryTier::Relaxed]
            .into_iter()
            .map(|tier| SearchStage {
                tier,
                queries: self.queries.competitor_queries(
                    &request.competitors,
                    &request.location,
                    self.config.max_competitors,
                    tier,
                ),
                filter: filter.clone(),
            })
            .collect();

        let ranges = self
            .run_tiers(stages, &Target::Company, &mut diagnostics, progress)
            .await?;

        let items: Vec<CompetitorRange> = ranges
            .iter()
            .map(|r| CompetitorRange {
                competitor: r.company.clone().unwrap_or_default(),
                min: r.min,
                max: r.max,
                title: r.title.clone(),
                link: r.url.clone(),
                location: request.location.clone(),
            })
            .collect();
        let aggregates = summarize_by_competitor(&ranges);

        progress.done(items.len());
        info!(
            request_id = %diagnostics.request_id,
            items = items.len(),
            competitors = aggregates.len(),
            "competitor benchmark complete"
        );

        Ok(CompetitorReport {
            items,
            aggregates,
            diagnostics,
        })
    }

    /// Query-tier cascade. Returns the first stage's non-empty validated
    /// ranges, or nothing. Fails only when every query of every stage failed.
    async fn run_tiers(
        &self,
        stages: Vec<SearchStage>,
        target: &Target,
        diagnostics: &mut Diagnostics,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ValidatedRange>> {
        let opts = FanOutOptions::from(&self.config);
        let mut every_batch_failed = true;
        let mut last_error = None;

        let next_tiers: Vec<Option<QueryTier>> = stages
            .iter()
            .skip(1)
            .map(|stage| Some(stage.tier))
            .chain([None])
            .collect();

        for (stage, next) in stages.into_iter().zip(next_tiers) {
            let tier = stage.tier;
            progress.phase(&format!("Searching ({tier} tier)"));
            let batch = fan_out(self.search.as_ref(), &stage.queries, opts).await;
            diagnostics.extend(batch.events(tier));
            progress.search_settled(tier, batch.results.len(), batch.failures.len());

            if batch.all_failed() {
                last_error = batch.into_first_error();
                escalate(diagnostics, next, "every search query failed");
                continue;
            }
            every_batch_failed = false;

            let corpus = stage.filter.filter(&batch.results, target);
            diagnostics.record(DiagnosticEvent::CandidatesFiltered {
                tier,
                raw: batch.results.len(),
                kept: corpus.len(),
            });
            if corpus.is_empty() {
                escalate(diagnostics, next, "no relevant candidates");
                continue;
            }

            progress.phase(&format!("Extracting from {} candidates", corpus.len()));
            let validated = self.extract(tier, &corpus, &mut diagnostics.events).await;
            if !validated.is_empty() {
                return Ok(validated);
            }
            escalate(diagnostics, next, "no validated ranges");
        }

        match last_error {
            Some(e) if every_batch_failed => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    /// Extraction-strategy cascade over one corpus.
    async fn extract(
        &self,
        tier: QueryTier,
        corpus: &[CandidateEntry],
        events: &mut Vec<DiagnosticEvent>,
    ) -> Vec<ValidatedRange> {
        match self.config.extraction {
            ExtractionMode::PatternFirst => {
                let pattern = extract_patterns(corpus);
                let validated = self.validate(tier, ExtractionStrategy::Pattern, &pattern, corpus, events);
                if !validated.is_empty() {
                    return validated;
                }
                let llm = self.llm_ranges(corpus, events).await;
                self.validate(tier, ExtractionStrategy::Llm, &llm, corpus, events)
            }
            ExtractionMode::LlmOnly => {
                let llm = self.llm_ranges(corpus, events).await;
                self.validate(tier, ExtractionStrategy::Llm, &llm, corpus, events)
            }
            ExtractionMode::Corroborate => {
                let pattern = extract_patterns(corpus);
                let llm = self.llm_ranges(corpus, events).await;
                let (pattern_count, llm_count) = (pattern.len(), llm.len());

                // Pattern ranges come first, so they win a URL both strategies hit.
                let mut all = pattern;
                all.extend(llm);
                let validated = self.validator.validate_all(&all, corpus);

                for (strategy, extracted) in [
                    (ExtractionStrategy::Pattern, pattern_count),
                    (ExtractionStrategy::Llm, llm_count),
                ] {
                    events.push(DiagnosticEvent::Extraction {
                        tier,
                        strategy,
                        extracted,
                        validated: validated.iter().filter(|r| r.strategy == strategy).count(),
                    });
                }
                validated
            }
        }
    }

    async fn llm_ranges(
        &self,
        corpus: &[CandidateEntry],
        events: &mut Vec<DiagnosticEvent>,
    ) -> Vec<ExtractedRange> {
        extract_with_llm(self.llm.as_deref(), &self.models, corpus, events).await
    }

    fn validate(
        &self,
        tier: QueryTier,
        strategy: ExtractionStrategy,
        ranges: &[ExtractedRange],
        corpus: &[CandidateEntry],
        events: &mut Vec<DiagnosticEvent>,
    ) -> Vec<ValidatedRange> {
        let validated = self.validator.validate_all(ranges, corpus);
        info!(%tier, strategy = strategy.as_str(), extracted = ranges.len(), validated = validated.len(), "extraction pass");
        events.push(DiagnosticEvent::Extraction {
            tier,
            strategy,
            extracted: ranges.len(),
            validated: validated.len(),
        });
        validated
    }
}

fn escalate(diagnostics: &mut Diagnostics, next: Option<QueryTier>, reason: &str) {
    if let Some(to) = next {
        info!(reason, %to, "escalating to next tier");
        diagnostics.record(DiagnosticEvent::TierEscalated {
            to,
            reason: reason.to_string(),
        });
    }
}
