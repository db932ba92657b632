//! # Aggregator Module
//!
//! Runs the primary and fallback searches side by side and merges what they
//! return. A branch that errors, times out or panics contributes nothing; the
//! other branch's results still come through.

use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::errors::RecipeError;
use crate::models::{RecipeSummary, SearchHit};
use crate::sources::{normalize_query, SearchSource};

/// Concurrent two-source search
#[derive(Clone)]
pub struct Aggregator {
    primary: Arc<dyn SearchSource>,
    fallback: Arc<dyn SearchSource>,
}

impl Aggregator {
    pub fn new(primary: Arc<dyn SearchSource>, fallback: Arc<dyn SearchSource>) -> Self {
        Self { primary, fallback }
    }

    /// Search both sources concurrently
    ///
    /// Primary hits come first, then fallback hits, truncated to `count`.
    /// There is no deduplication across sources. An empty ingredient list
    /// issues no request at all.
    pub async fn find_by_ingredients<S: AsRef<str>>(
        &self,
        ingredients: &[S],
        count: usize,
    ) -> Vec<SearchHit> {
        let query = normalize_query(ingredients);
        if query.is_empty() || count == 0 {
            return Vec::new();
        }

        let primary = {
            let source = self.primary.clone();
            let query = query.clone();
            tokio::spawn(async move { source.search(&query, count).await })
        };
        let fallback = {
            let source = self.fallback.clone();
            tokio::spawn(async move { source.search(&query, count).await })
        };

        let (primary, fallback) = tokio::join!(primary, fallback);
        let primary = contain(self.primary.as_ref(), primary);
        let fallback = contain(self.fallback.as_ref(), fallback);
        info!(
            "Aggregated search: {} primary, {} fallback hits",
            primary.len(),
            fallback.len()
        );

        let mut merged = primary;
        merged.extend(fallback);
        merged.truncate(count);
        merged
    }

    /// Random recipes, primary first, topped up from the fallback source
    pub async fn random_recipes(&self, count: usize) -> Vec<RecipeSummary> {
        if count == 0 {
            return Vec::new();
        }

        let primary = self.primary.clone();
        let primary = tokio::spawn(async move { primary.random(count).await });
        let mut picked = contain(self.primary.as_ref(), primary.await);

        if picked.len() < count {
            let missing = count - picked.len();
            let fallback = self.fallback.clone();
            let fallback = tokio::spawn(async move { fallback.random(missing).await });
            picked.extend(contain(self.fallback.as_ref(), fallback.await));
        }

        picked.truncate(count);
        picked
    }
}

/// Turn a branch failure of any kind into an empty result
fn contain<T>(
    source: &dyn SearchSource,
    outcome: Result<Result<Vec<T>, RecipeError>, JoinError>,
) -> Vec<T> {
    match outcome {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            warn!("{} search failed, continuing without it: {e}", source.kind());
            Vec::new()
        }
        Err(e) => {
            warn!("{} search task aborted, continuing without it: {e}", source.kind());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecipeDetail, RecipeSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Behavior {
        Hits(usize),
        Fail,
        Panic,
        Slow(Duration, usize),
    }

    struct StubSource {
        kind: RecipeSource,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(kind: RecipeSource, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                kind,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn hits(&self, n: usize) -> Vec<SearchHit> {
            (0..n)
                .map(|i| {
                    let id = format!("{}-{i}", self.kind.label());
                    SearchHit::complete(RecipeDetail::new(id.as_str(), "Dish", self.kind))
                })
                .collect()
        }
    }

    #[async_trait]
    impl SearchSource for StubSource {
        fn kind(&self) -> RecipeSource {
            self.kind
        }

        async fn search(
            &self,
            _ingredients: &[String],
            count: usize,
        ) -> Result<Vec<SearchHit>, RecipeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Hits(n) => Ok(self.hits((*n).min(count))),
                Behavior::Fail => Err(RecipeError::SourceUnavailable("down".into())),
                Behavior::Panic => panic!("source exploded"),
                Behavior::Slow(delay, n) => {
                    tokio::time::sleep(*delay).await;
                    Ok(self.hits((*n).min(count)))
                }
            }
        }

        async fn random(&self, count: usize) -> Result<Vec<RecipeSummary>, RecipeError> {
            let hits = self.search(&[], count).await?;
            Ok(hits.into_iter().map(|h| h.summary).collect())
        }
    }

    fn aggregator(primary: Arc<StubSource>, fallback: Arc<StubSource>) -> Aggregator {
        Aggregator::new(primary, fallback)
    }

    #[tokio::test]
    async fn test_primary_results_come_first_and_are_truncated() {
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Hits(3)),
            StubSource::new(RecipeSource::Fallback, Behavior::Hits(3)),
        );
        let hits = agg.find_by_ingredients(&["egg"], 4).await;
        let sources: Vec<RecipeSource> = hits.iter().map(|h| h.summary.source).collect();
        assert_eq!(
            sources,
            vec![
                RecipeSource::Primary,
                RecipeSource::Primary,
                RecipeSource::Primary,
                RecipeSource::Fallback
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_primary_is_contained() {
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Fail),
            StubSource::new(RecipeSource::Fallback, Behavior::Hits(2)),
        );
        let hits = agg.find_by_ingredients(&["egg"], 10).await;
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.summary.source == RecipeSource::Fallback));
    }

    #[tokio::test]
    async fn test_panicking_fallback_is_contained() {
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Hits(2)),
            StubSource::new(RecipeSource::Fallback, Behavior::Panic),
        );
        let hits = agg.find_by_ingredients(&["egg"], 10).await;
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_both_failing_yields_empty() {
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Fail),
            StubSource::new(RecipeSource::Fallback, Behavior::Fail),
        );
        assert!(agg.find_by_ingredients(&["egg"], 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_branches_run_concurrently() {
        let delay = Duration::from_millis(200);
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Slow(delay, 1)),
            StubSource::new(RecipeSource::Fallback, Behavior::Slow(delay, 1)),
        );
        let started = std::time::Instant::now();
        let hits = agg.find_by_ingredients(&["egg"], 10).await;
        assert_eq!(hits.len(), 2);
        assert!(started.elapsed() < delay * 2);
    }

    #[tokio::test]
    async fn test_fast_fallback_waits_behind_slow_primary() {
        let slow = Duration::from_millis(300);
        let fast = Duration::from_millis(200);
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Slow(slow, 2)),
            StubSource::new(RecipeSource::Fallback, Behavior::Slow(fast, 2)),
        );

        let started = std::time::Instant::now();
        let hits = agg.find_by_ingredients(&["egg"], 10).await;
        let elapsed = started.elapsed();

        // Bounded by the slower branch, not the sum of both
        assert!(elapsed >= slow);
        assert!(elapsed < slow + fast - Duration::from_millis(50), "{elapsed:?}");

        let sources: Vec<RecipeSource> = hits.iter().map(|h| h.summary.source).collect();
        assert_eq!(
            sources,
            vec![
                RecipeSource::Primary,
                RecipeSource::Primary,
                RecipeSource::Fallback,
                RecipeSource::Fallback
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_query_issues_no_request() {
        let primary = StubSource::new(RecipeSource::Primary, Behavior::Hits(2));
        let fallback = StubSource::new(RecipeSource::Fallback, Behavior::Hits(2));
        let agg = aggregator(primary.clone(), fallback.clone());
        assert!(agg.find_by_ingredients(&[" ", ""], 10).await.is_empty());
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_random_tops_up_from_fallback() {
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Hits(1)),
            StubSource::new(RecipeSource::Fallback, Behavior::Hits(5)),
        );
        let picks = agg.random_recipes(3).await;
        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].source, RecipeSource::Primary);
        assert_eq!(picks[2].source, RecipeSource::Fallback);
    }

    #[tokio::test]
    async fn test_random_skips_fallback_when_primary_suffices() {
        let fallback = StubSource::new(RecipeSource::Fallback, Behavior::Hits(5));
        let agg = aggregator(
            StubSource::new(RecipeSource::Primary, Behavior::Hits(4)),
            fallback.clone(),
        );
        assert_eq!(agg.random_recipes(4).await.len(), 4);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }
}
