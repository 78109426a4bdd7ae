//! Keyword search over hub datasets.

use std::collections::HashSet;
use std::sync::Arc;

use crate::hub::{DatasetHub, HubError};
use crate::models::DatasetSummary;
use crate::utils::{with_retry, BoundedTimeout, RetrySettings};

/// Default number of results returned by a search
pub const DEFAULT_TOP_K: usize = 5;

/// Dataset search with retry, bounded execution, and client-side filtering.
///
/// The hub ranks candidates by its own relevance; this layer over-fetches,
/// keeps only ids containing the keyword, and deduplicates while
/// preserving the hub's order.
#[derive(Debug, Clone)]
pub struct DatasetSearch {
    hub: Arc<dyn DatasetHub>,
    settings: RetrySettings,
    pool: BoundedTimeout,
}

impl DatasetSearch {
    /// Create a search over the given hub with default retry and timeout
    pub fn new(hub: Arc<dyn DatasetHub>) -> Self {
        Self {
            hub,
            settings: RetrySettings::default(),
            pool: BoundedTimeout::default(),
        }
    }

    /// Create a search with explicit retry settings and worker pool
    pub fn with_settings(
        hub: Arc<dyn DatasetHub>,
        settings: RetrySettings,
        pool: BoundedTimeout,
    ) -> Self {
        Self {
            hub,
            settings,
            pool,
        }
    }

    /// Search the hub and return matching dataset ids, best match first
    pub async fn search(&self, keyword: &str, top_k: usize) -> Result<Vec<String>, HubError> {
        Ok(self
            .search_detailed(keyword, top_k)
            .await?
            .into_iter()
            .map(|summary| summary.id)
            .collect())
    }

    /// Search the hub and return matching dataset summaries, best match first.
    ///
    /// Fetches twice the requested count so that client-side filtering
    /// still has enough candidates, then drops ids that do not contain
    /// the keyword (case-insensitively), deduplicates, and truncates to
    /// `top_k`. Failures are wrapped in [`HubError::Search`] with the
    /// keyword attached.
    pub async fn search_detailed(
        &self,
        keyword: &str,
        top_k: usize,
    ) -> Result<Vec<DatasetSummary>, HubError> {
        let fetch_limit = top_k.saturating_mul(2);

        let hub = Arc::clone(&self.hub);
        let pool = self.pool.clone();
        let keyword_owned = keyword.to_string();

        let candidates = with_retry(self.settings, || {
            let hub = Arc::clone(&hub);
            let pool = pool.clone();
            let keyword = keyword_owned.clone();
            async move {
                pool.run(async move { hub.search(&keyword, fetch_limit).await })
                    .await
            }
        })
        .await
        .map_err(|source| HubError::Search {
            keyword: keyword.to_string(),
            source: Box::new(source),
        })?;

        let needle = keyword.to_lowercase();
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for summary in candidates {
            if matches.len() >= top_k {
                break;
            }
            if !summary.id.to_lowercase().contains(&needle) {
                continue;
            }
            if !seen.insert(summary.id.clone()) {
                continue;
            }
            matches.push(summary);
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::MockHub;
    use std::time::Duration;

    fn fast_settings() -> RetrySettings {
        RetrySettings::default().base_delay(Duration::from_millis(1))
    }

    fn search_over(hub: MockHub) -> DatasetSearch {
        DatasetSearch::with_settings(
            Arc::new(hub),
            fast_settings(),
            BoundedTimeout::new(2, Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_search_filters_ids_by_keyword() {
        let hub = MockHub::new()
            .with_dataset(DatasetSummary::new("rajpurkar/squad"))
            .with_dataset(DatasetSummary::new("stanfordnlp/imdb"))
            .with_dataset(DatasetSummary::new("squad_v2"));

        let results = search_over(hub).search("squad", 5).await.unwrap();

        assert_eq!(results, vec!["rajpurkar/squad", "squad_v2"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let hub = MockHub::new().with_dataset(DatasetSummary::new("nyu-mll/GLUE"));

        let results = search_over(hub).search("glue", 5).await.unwrap();

        assert_eq!(results, vec!["nyu-mll/GLUE"]);
    }

    #[tokio::test]
    async fn test_search_over_fetches_double_top_k() {
        let hub = Arc::new(MockHub::new());
        let search = DatasetSearch::with_settings(
            Arc::clone(&hub) as Arc<dyn DatasetHub>,
            fast_settings(),
            BoundedTimeout::new(2, Duration::from_secs(5)),
        );

        search.search("needle", 3).await.unwrap();

        assert_eq!(hub.search_requests(), vec![("needle".to_string(), 6)]);
    }

    #[tokio::test]
    async fn test_search_deduplicates_preserving_order() {
        let hub = MockHub::new()
            .with_dataset(DatasetSummary::new("org/echo"))
            .with_dataset(DatasetSummary::new("org/echo-two"))
            .with_dataset(DatasetSummary::new("org/echo"));

        let results = search_over(hub).search("echo", 5).await.unwrap();

        assert_eq!(results, vec!["org/echo", "org/echo-two"]);
    }

    #[tokio::test]
    async fn test_search_truncates_to_top_k() {
        let mut hub = MockHub::new();
        for i in 0..5 {
            hub = hub.with_dataset(DatasetSummary::new(format!("org/data-{}", i)));
        }

        let results = search_over(hub).search("data", 2).await.unwrap();

        assert_eq!(results, vec!["org/data-0", "org/data-1"]);
    }

    #[tokio::test]
    async fn test_search_failure_wraps_keyword_and_cause() {
        let hub = MockHub::new();
        hub.always_fail("connection reset");

        let result = search_over(hub).search("squad", 5).await;

        match result {
            Err(HubError::Search { keyword, source }) => {
                assert_eq!(keyword, "squad");
                assert!(matches!(*source, HubError::Network(_)));
            }
            other => panic!("expected Search error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_retries_transient_failures() {
        let hub = Arc::new(MockHub::new().with_dataset(DatasetSummary::new("org/flaky")));
        hub.fail_next(HubError::Network("reset".to_string()));
        hub.fail_next(HubError::Network("reset".to_string()));

        let search = DatasetSearch::with_settings(
            Arc::clone(&hub) as Arc<dyn DatasetHub>,
            fast_settings(),
            BoundedTimeout::new(2, Duration::from_secs(5)),
        );

        let results = search.search("flaky", 5).await.unwrap();

        assert_eq!(results, vec!["org/flaky"]);
        assert_eq!(hub.search_requests().len(), 3);
    }
}
