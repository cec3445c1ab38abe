// Composition tests — the comparator driven end to end by in-process oracles.
//
// These tests exercise the data flow:
//   Dataset -> prompt -> oracle -> parse -> ComparisonResult
// without any network calls. The oracle doubles read the two comments back
// out of the prompt and reply according to a script.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use comment_matcher::dataset::Dataset;
use comment_matcher::error::{OracleError, PairError, PreconditionError};
use comment_matcher::matching::{ComparisonResult, PairwiseComparator};
use comment_matcher::oracle::SimilarityOracle;

/// Pull the two quoted comments back out of a prompt.
fn comments_in(prompt: &str) -> (String, String) {
    let after = |label: &str| {
        let start = prompt.find(label).expect("label in prompt") + label.len();
        let end = prompt[start..].find("\"\n").expect("closing quote") + start;
        prompt[start..end].to_string()
    };
    (after("Comment 1: \""), after("Comment 2: \""))
}

/// Replies with whatever the script returns for (comment1, comment2).
struct ScriptedOracle<F> {
    script: F,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl<F> ScriptedOracle<F>
where
    F: Fn(&str, &str) -> Result<String, OracleError> + Send + Sync,
{
    fn new(script: F) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> SimilarityOracle for ScriptedOracle<F>
where
    F: Fn(&str, &str) -> Result<String, OracleError> + Send + Sync,
{
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (a, b) = comments_in(prompt);
        self.seen.lock().unwrap().push((a.clone(), b.clone()));
        (self.script)(&a, &b)
    }
}

/// Sleeps longer for earlier pairs so completions arrive out of order.
struct SlowFirstOracle;

#[async_trait]
impl SimilarityOracle for SlowFirstOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let (a, b) = comments_in(prompt);
        let index: u64 = a.trim_start_matches('a').parse::<u64>().unwrap() * 10
            + b.trim_start_matches('b').parse::<u64>().unwrap();
        tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(index * 5))).await;
        Ok(format!("{}", 50 + index))
    }
}

fn ids(results: &[ComparisonResult]) -> Vec<(usize, usize)> {
    results.iter().map(|r| (r.id_a, r.id_b)).collect()
}

// ============================================================
// Shape and ordering
// ============================================================

#[tokio::test]
async fn produces_m_times_n_results_row_major() {
    let oracle = ScriptedOracle::new(|_, _| Ok("90".to_string()));
    let a = Dataset::from_comments("a", ["a0", "a1", "a2"]);
    let b = Dataset::from_comments("b", ["b0", "b1"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results.len(), 6);
    assert_eq!(
        ids(&report.results),
        vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
    );
    assert_eq!(report.results[3].text_a, "a1");
    assert_eq!(report.results[3].text_b, "b1");
    assert_eq!(oracle.calls(), 6);
}

#[tokio::test]
async fn sequential_run_calls_oracle_in_row_major_order() {
    let oracle = ScriptedOracle::new(|_, _| Ok("90".to_string()));
    let a = Dataset::from_comments("a", ["x", "y"]);
    let b = Dataset::from_comments("b", ["p", "q"]);

    PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    let seen = oracle.seen.lock().unwrap().clone();
    let expected: Vec<(String, String)> = [("x", "p"), ("x", "q"), ("y", "p"), ("y", "q")]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn symmetric_pairs_are_not_deduplicated() {
    let oracle = ScriptedOracle::new(|_, _| Ok("95".to_string()));
    let a = Dataset::from_comments("a", ["same", "same"]);
    let b = Dataset::from_comments("b", ["same"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn concurrent_run_keeps_row_major_order() {
    let a = Dataset::from_comments("a", ["a0", "a1", "a2"]);
    let b = Dataset::from_comments("b", ["b0", "b1", "b2"]);

    let sequential = PairwiseComparator::new(&SlowFirstOracle)
        .compare(&a, &b, |_, _| {})
        .await;
    let concurrent = PairwiseComparator::new(&SlowFirstOracle)
        .with_concurrency(4)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(concurrent.results, sequential.results);
    assert_eq!(concurrent.results[0].score, 50);
    assert_eq!(concurrent.results[8].score, 72);
}

#[tokio::test]
async fn progress_reports_each_completed_pair() {
    let oracle = ScriptedOracle::new(|_, _| Ok("10".to_string()));
    let a = Dataset::from_comments("a", ["x", "y"]);
    let b = Dataset::from_comments("b", ["p", "q", "r"]);

    let mut seen = Vec::new();
    PairwiseComparator::new(&oracle)
        .compare(&a, &b, |done, total| seen.push((done, total)))
        .await;

    let expected: Vec<(usize, usize)> = (1..=6).map(|k| (k, 6)).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn concurrent_compare_runs_on_a_spawned_task() {
    // tokio::spawn demands a `Send` future, the same bound axum puts on handlers
    let oracle: Arc<dyn SimilarityOracle> = Arc::new(SlowFirstOracle);
    let a = Dataset::from_comments("a", ["a0", "a1"]);
    let b = Dataset::from_comments("b", ["b0", "b1", "b2"]);

    let handle = tokio::spawn(async move {
        PairwiseComparator::new(oracle.as_ref())
            .with_concurrency(3)
            .compare(&a, &b, |_, _| {})
            .await
    });
    let report = handle.await.unwrap();

    assert_eq!(
        ids(&report.results),
        vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
    );
    assert_eq!(report.results[5].score, 62);
}

// ============================================================
// Scoring and flagging
// ============================================================

#[tokio::test]
async fn reply_of_exactly_80_is_not_flagged() {
    let oracle = ScriptedOracle::new(|_, _| Ok("80".to_string()));
    let a = Dataset::from_comments("a", ["x"]);
    let b = Dataset::from_comments("b", ["y"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results[0].score, 80);
    assert!(!report.results[0].flagged);
}

#[tokio::test]
async fn wordy_reply_is_parsed_by_digits() {
    let oracle = ScriptedOracle::new(|_, _| Ok("Similarity: 42%".to_string()));
    let a = Dataset::from_comments("a", ["x"]);
    let b = Dataset::from_comments("b", ["y"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results[0].score, 42);
    assert!(report.results[0].flagged);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn oversized_reply_is_kept_unclamped() {
    let oracle = ScriptedOracle::new(|_, _| Ok("999".to_string()));
    let a = Dataset::from_comments("a", ["x"]);
    let b = Dataset::from_comments("b", ["y"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results[0].score, 999);
    assert!(!report.results[0].flagged);
}

#[tokio::test]
async fn full_width_digits_are_read_as_a_score() {
    let oracle = ScriptedOracle::new(|_, _| Ok("８５".to_string()));
    let a = Dataset::from_comments("a", ["x"]);
    let b = Dataset::from_comments("b", ["y"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results[0].score, 85);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn score_beyond_u32_is_kept() {
    let oracle = ScriptedOracle::new(|_, _| Ok("Score 12345678901".to_string()));
    let a = Dataset::from_comments("a", ["x"]);
    let b = Dataset::from_comments("b", ["y"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results[0].score, 12_345_678_901);
    assert!(!report.results[0].flagged);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn flag_matches_threshold_for_every_result() {
    let oracle = ScriptedOracle::new(|a, b| {
        let score = match (a, b) {
            ("x", "p") => "0",
            ("x", "q") => "79",
            ("y", "p") => "80",
            _ => "100",
        };
        Ok(score.to_string())
    });
    let a = Dataset::from_comments("a", ["x", "y"]);
    let b = Dataset::from_comments("b", ["p", "q"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    for result in &report.results {
        assert_eq!(result.flagged, result.score < 80, "{result:?}");
    }
    assert_eq!(report.flagged_count(), 2);
}

// ============================================================
// Failure degradation
// ============================================================

#[tokio::test]
async fn transport_error_zeroes_only_that_pair() {
    let oracle = ScriptedOracle::new(|a, b| {
        if a == "y" && b == "p" {
            Err(OracleError::Status {
                status: 503,
                body: "overloaded".into(),
            })
        } else {
            Ok("91".to_string())
        }
    });
    let a = Dataset::from_comments("a", ["x", "y"]);
    let b = Dataset::from_comments("b", ["p", "q"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    let scores: Vec<u64> = report.results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![91, 91, 0, 91]);
    assert!(report.results[2].flagged);

    assert_eq!(report.warnings.len(), 1);
    let warning = &report.warnings[0];
    assert_eq!((warning.id_a, warning.id_b), (1, 0));
    assert!(matches!(warning.error, PairError::Oracle(_)));
}

#[tokio::test]
async fn reply_without_digits_scores_zero() {
    let oracle = ScriptedOracle::new(|_, _| Ok("N/A".to_string()));
    let a = Dataset::from_comments("a", ["x"]);
    let b = Dataset::from_comments("b", ["y"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results[0].score, 0);
    assert!(report.results[0].flagged);
    assert!(matches!(report.warnings[0].error, PairError::Parse(_)));
}

// ============================================================
// Preconditions
// ============================================================

#[tokio::test]
async fn missing_comment_column_means_no_oracle_calls() {
    let oracle = ScriptedOracle::new(|_, _| Ok("90".to_string()));

    let good = Dataset::from_bytes("good.csv", b"Comment\nRent\n".to_vec());
    let bad = Dataset::from_bytes("bad.csv", b"Notes\nRent\n".to_vec());

    // The caller loads both inputs first; a failure stops before comparing.
    let loaded: Result<(Dataset, Dataset), PreconditionError> = good.and_then(|g| bad.map(|b| (g, b)));
    match loaded {
        Ok((a, b)) => {
            PairwiseComparator::new(&oracle)
                .compare(&a, &b, |_, _| {})
                .await;
            panic!("bad.csv should have been rejected");
        }
        Err(e) => {
            assert!(matches!(e, PreconditionError::MissingColumn { .. }));
            assert!(e.to_string().contains("bad.csv"));
        }
    }
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn missing_cells_reach_the_oracle_as_nan() {
    let oracle = ScriptedOracle::new(|_, _| Ok("50".to_string()));
    let a = Dataset::from_bytes("a.csv", b"Comment,Amount\n,10\n".to_vec()).unwrap();
    let b = Dataset::from_comments("b", ["Rent"]);

    let report = PairwiseComparator::new(&oracle)
        .compare(&a, &b, |_, _| {})
        .await;

    assert_eq!(report.results[0].text_a, "nan");
    assert_eq!(oracle.seen.lock().unwrap()[0].0, "nan");
}
