//! # Detail Fetcher Module
//!
//! Turns identifiers and search hits into full [`RecipeDetail`] records.
//! Hits that already carry their detail never cause a request.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::RecipeError;
use crate::models::{RecipeDetail, RecipeId, RecipeSource, SearchHit};
use crate::sources::DetailSource;

#[derive(Clone)]
pub struct DetailFetcher {
    primary: Arc<dyn DetailSource>,
    fallback: Arc<dyn DetailSource>,
}

impl DetailFetcher {
    pub fn new(primary: Arc<dyn DetailSource>, fallback: Arc<dyn DetailSource>) -> Self {
        Self { primary, fallback }
    }

    /// Full detail from the primary source, `None` when it cannot be resolved
    pub async fn get_detail(&self, id: &RecipeId) -> Option<RecipeDetail> {
        self.get_detail_from(RecipeSource::Primary, id).await
    }

    /// Full detail from the given source
    ///
    /// Errors are logged and reported as `None`; callers show the
    /// "recipe unavailable" message for both cases.
    pub async fn get_detail_from(
        &self,
        source: RecipeSource,
        id: &RecipeId,
    ) -> Option<RecipeDetail> {
        match self.try_get_detail(source, id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!("Could not resolve {source} recipe {id}: {e}");
                None
            }
        }
    }

    /// Like [`get_detail_from`](Self::get_detail_from) but keeps the failure reason
    pub async fn try_get_detail(
        &self,
        source: RecipeSource,
        id: &RecipeId,
    ) -> Result<RecipeDetail, RecipeError> {
        let backend = match source {
            RecipeSource::Primary => &self.primary,
            RecipeSource::Fallback => &self.fallback,
        };
        backend
            .fetch_detail(id)
            .await?
            .ok_or_else(|| RecipeError::RecordUnresolvable(format!("{source} has no recipe {id}")))
    }

    /// Detail for a search hit, fetched only when the hit is incomplete
    pub async fn resolve(&self, hit: &SearchHit) -> Option<RecipeDetail> {
        if let Some(detail) = &hit.detail {
            debug!("Hit {} already complete", hit.summary.id);
            return Some(detail.clone());
        }
        self.get_detail_from(hit.summary.source, &hit.summary.id).await
    }
}
