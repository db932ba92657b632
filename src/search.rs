//! # Search Pipeline Module
//!
//! The end-to-end ingredient search: aggregate candidates from both sources,
//! shuffle them, resolve each candidate's full detail, drop blocklisted
//! provenance, apply the filters and stop once enough recipes matched.
//!
//! The pipeline can run inline ([`SearchPipeline::run`]) or on a background
//! task ([`SearchPipeline::spawn`]) that reports progress as [`SearchEvent`]s
//! so an interactive caller is never blocked while details are fetched.

use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::config::SearchConfig;
use crate::detail::DetailFetcher;
use crate::errors::RecipeError;
use crate::filters::SearchFilters;
use crate::models::{RecipeDetail, RecipeId};
use crate::sources::spoonacular::is_blocklisted;

/// One ingredient search
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub ingredients: Vec<String>,
    pub filters: SearchFilters,
}

impl SearchRequest {
    pub fn new<S: AsRef<str>>(ingredients: &[S]) -> Self {
        Self {
            ingredients: ingredients.iter().map(|i| i.as_ref().to_string()).collect(),
            filters: SearchFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Why a candidate did not make it into the results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unresolvable,
    Blocklisted,
    Filtered,
}

/// Progress report of a running search
#[derive(Debug)]
pub enum SearchEvent {
    /// Candidates returned by the aggregator
    Candidates(usize),
    /// A candidate was dropped
    Skipped { id: RecipeId, reason: SkipReason },
    /// A candidate passed every filter
    Match(Box<RecipeDetail>),
    /// The search ended with this many matches
    Finished { matches: usize },
    /// The search ended without a single match
    Failed(RecipeError),
}

#[derive(Clone)]
pub struct SearchPipeline {
    aggregator: Aggregator,
    details: DetailFetcher,
    config: SearchConfig,
}

impl SearchPipeline {
    pub fn new(aggregator: Aggregator, details: DetailFetcher, config: SearchConfig) -> Self {
        Self {
            aggregator,
            details,
            config,
        }
    }

    /// Run the search and return its matches
    ///
    /// Returns `RecipeError::NoMatches` when no candidate survives.
    pub async fn run(&self, request: &SearchRequest) -> Result<Vec<RecipeDetail>, RecipeError> {
        let matches = self.execute(request, |_| {}).await;
        if matches.is_empty() {
            return Err(RecipeError::NoMatches);
        }
        Ok(matches)
    }

    /// Run the search on a background task, streaming its progress
    ///
    /// The last event is always `Finished` or `Failed`.
    pub fn spawn(&self, request: SearchRequest) -> mpsc::UnboundedReceiver<SearchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let pipeline = self.clone();

        tokio::spawn(async move {
            let progress = tx.clone();
            let matches = pipeline
                .execute(&request, move |event| {
                    // A dropped receiver only means nobody is listening anymore
                    let _ = progress.send(event);
                })
                .await;
            let last = if matches.is_empty() {
                SearchEvent::Failed(RecipeError::NoMatches)
            } else {
                SearchEvent::Finished {
                    matches: matches.len(),
                }
            };
            let _ = tx.send(last);
        });

        rx
    }

    async fn execute<F>(&self, request: &SearchRequest, mut emit: F) -> Vec<RecipeDetail>
    where
        F: FnMut(SearchEvent) + Send,
    {
        let mut candidates = self
            .aggregator
            .find_by_ingredients(&request.ingredients, self.config.candidates)
            .await;
        if self.config.shuffle {
            candidates.shuffle(&mut rand::thread_rng());
        }
        info!(
            "Checking {} candidates for {:?}",
            candidates.len(),
            request.ingredients
        );
        emit(SearchEvent::Candidates(candidates.len()));

        let mut matches = Vec::new();
        for hit in &candidates {
            if matches.len() >= self.config.max_results {
                break;
            }
            let id = hit.summary.id.clone();

            let Some(detail) = self.details.resolve(hit).await else {
                emit(SearchEvent::Skipped {
                    id,
                    reason: SkipReason::Unresolvable,
                });
                continue;
            };
            if is_blocklisted(&detail, &self.config.blocklist) {
                debug!("Skipping {} from a blocklisted contributor", detail.title);
                emit(SearchEvent::Skipped {
                    id,
                    reason: SkipReason::Blocklisted,
                });
                continue;
            }
            if !request.filters.accepts(&detail) {
                emit(SearchEvent::Skipped {
                    id,
                    reason: SkipReason::Filtered,
                });
                continue;
            }

            debug!("Match: {detail}");
            emit(SearchEvent::Match(Box::new(detail.clone())));
            matches.push(detail);
        }

        info!("Search finished with {} matches", matches.len());
        matches
    }
}
