// Pairwise comparison driver.
//
// Every record of dataset A is compared against every record of dataset B,
// one oracle call per pair. A failed call or an unparseable reply scores the
// pair 0 and is reported as a warning; it never stops the batch.
//
// With concurrency > 1 several oracle calls are in flight at once. Each pair
// owns a pre-assigned slot, so results come back row-major (A outer, B inner)
// no matter which call finishes first.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::prompt::build_prompt;
use super::score::{is_flagged, parse_score};
use crate::dataset::{Dataset, Record};
use crate::error::PairError;
use crate::oracle::SimilarityOracle;

/// A scored pair plus the error that zeroed it, if any.
type PairOutcome = (ComparisonResult, Option<PairError>);

/// One output row: a pair of comments and how similar the oracle judged them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub id_a: usize,
    pub id_b: usize,
    pub text_a: String,
    pub text_b: String,
    pub score: u64,
    /// True iff `score` is below the flag threshold.
    pub flagged: bool,
}

impl ComparisonResult {
    pub fn new(id_a: usize, id_b: usize, text_a: String, text_b: String, score: u64) -> Self {
        Self {
            id_a,
            id_b,
            text_a,
            text_b,
            score,
            flagged: is_flagged(score),
        }
    }
}

/// A pair that was scored 0 because its oracle call or parse failed.
#[derive(Debug, Clone)]
pub struct PairWarning {
    pub id_a: usize,
    pub id_b: usize,
    pub error: PairError,
}

/// Everything a comparison run produces.
#[derive(Debug, Clone, Default)]
pub struct ComparisonReport {
    /// Row-major over (A index, B index).
    pub results: Vec<ComparisonResult>,
    /// Failed pairs, in the same row-major order.
    pub warnings: Vec<PairWarning>,
}

impl ComparisonReport {
    pub fn flagged_count(&self) -> usize {
        self.results.iter().filter(|r| r.flagged).count()
    }
}

/// Compares two datasets pair by pair through a similarity oracle.
pub struct PairwiseComparator<'a> {
    oracle: &'a dyn SimilarityOracle,
    concurrency: usize,
}

impl<'a> PairwiseComparator<'a> {
    /// A sequential comparator: one oracle call at a time.
    pub fn new(oracle: &'a dyn SimilarityOracle) -> Self {
        Self {
            oracle,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` oracle calls in flight. Zero is treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Ask the oracle how similar two comments are and parse its reply.
    pub async fn score_similarity(&self, text_a: &str, text_b: &str) -> Result<u64, PairError> {
        let prompt = build_prompt(text_a, text_b);
        let reply = self.oracle.complete(&prompt).await?;
        let score = parse_score(&reply)?;
        Ok(score)
    }

    /// Compare every record of `a` against every record of `b`.
    ///
    /// `on_progress(completed, total)` is called after each pair finishes.
    pub async fn compare<F>(&self, a: &Dataset, b: &Dataset, mut on_progress: F) -> ComparisonReport
    where
        F: FnMut(usize, usize),
    {
        let total = a.len() * b.len();
        if total == 0 {
            info!(
                dataset_a = %a.name,
                dataset_b = %b.name,
                "Nothing to compare (a dataset is empty)"
            );
            return ComparisonReport::default();
        }

        info!(
            dataset_a = %a.name,
            dataset_b = %b.name,
            pairs = total,
            concurrency = self.concurrency,
            "Starting pairwise comparison"
        );

        // Each pair is boxed as a `Send` future so `compare` can run inside
        // spawned tasks and web handlers.
        let mut jobs: Vec<BoxFuture<'_, (usize, PairOutcome)>> = Vec::with_capacity(total);
        for ra in &a.records {
            for rb in &b.records {
                let slot = jobs.len();
                jobs.push(Box::pin(async move {
                    (slot, self.score_record_pair(ra, rb).await)
                }));
            }
        }

        let mut slots: Vec<Option<PairOutcome>> = vec![None; total];
        let mut completed = 0;

        let mut outcomes = stream::iter(jobs).buffer_unordered(self.concurrency);

        while let Some((slot, outcome)) = outcomes.next().await {
            slots[slot] = Some(outcome);
            completed += 1;
            on_progress(completed, total);
        }

        let mut report = ComparisonReport {
            results: Vec::with_capacity(total),
            warnings: Vec::new(),
        };
        for (result, error) in slots.into_iter().flatten() {
            if let Some(error) = error {
                report.warnings.push(PairWarning {
                    id_a: result.id_a,
                    id_b: result.id_b,
                    error,
                });
            }
            report.results.push(result);
        }

        info!(
            pairs = report.results.len(),
            flagged = report.flagged_count(),
            failed = report.warnings.len(),
            "Pairwise comparison complete"
        );

        report
    }

    /// Score one pair, degrading any failure to 0.
    async fn score_record_pair(
        &self,
        ra: &Record,
        rb: &Record,
    ) -> PairOutcome {
        let (score, error) = match self.score_similarity(&ra.comment, &rb.comment).await {
            Ok(score) => {
                debug!(id_a = ra.id, id_b = rb.id, score, "Scored pair");
                (score, None)
            }
            Err(e) => {
                warn!(id_a = ra.id, id_b = rb.id, error = %e, "Pair scored 0");
                (0, Some(e))
            }
        };

        let result = ComparisonResult::new(
            ra.id,
            rb.id,
            ra.comment.clone(),
            rb.comment.clone(),
            score,
        );
        (result, error)
    }
}
