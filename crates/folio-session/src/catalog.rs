//! Catalog listing state: current page, filters, and known tags.

use crate::error::ApiResult;
use crate::loading::LoadingFlag;
use crate::transport::ApiClient;
use crate::types::{EbookQuery, EbookSummary, Paginated, Tag};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbookFilters {
    pub search: String,
    pub tag: Option<String>,
    pub page: u32,
}

impl Default for EbookFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            tag: None,
            page: 1,
        }
    }
}

impl EbookFilters {
    /// These filters with every field set in `overrides` replaced.
    pub fn merged(&self, overrides: &FilterOverrides) -> Self {
        Self {
            search: overrides.search.clone().unwrap_or_else(|| self.search.clone()),
            tag: overrides.tag.clone().or_else(|| self.tag.clone()),
            page: overrides.page.unwrap_or(self.page),
        }
    }

    fn to_query(&self) -> EbookQuery {
        EbookQuery {
            search: Some(self.search.clone()),
            tag: self.tag.clone(),
            page: Some(self.page),
            limit: None,
        }
    }
}

/// Partial update applied on top of the current filters for one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOverrides {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Default)]
struct CatalogState {
    paginated: Option<Paginated<EbookSummary>>,
    tags: Vec<Tag>,
    filters: EbookFilters,
}

pub struct CatalogStore {
    api: Arc<ApiClient>,
    state: Mutex<CatalogState>,
    loading: LoadingFlag,
}

impl CatalogStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: Mutex::new(CatalogState::default()),
            loading: LoadingFlag::new(),
        }
    }

    pub fn filters(&self) -> EbookFilters {
        self.state.lock().filters.clone()
    }

    pub fn paginated(&self) -> Option<Paginated<EbookSummary>> {
        self.state.lock().paginated.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.lock().tags.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Fetch a page of the catalog using the current filters plus `overrides`.
    ///
    /// The merged filters become current only if the fetch succeeds.
    pub async fn fetch_ebooks(
        &self,
        overrides: FilterOverrides,
    ) -> ApiResult<Paginated<EbookSummary>> {
        let _loading = self.loading.begin();
        let filters = self.filters().merged(&overrides);
        debug!(search = %filters.search, tag = ?filters.tag, page = filters.page, "Fetching catalog");

        let page = self.api.ebooks().list(&filters.to_query()).await?;

        let mut state = self.state.lock();
        state.paginated = Some(page.clone());
        state.filters = filters;
        Ok(page)
    }

    pub async fn fetch_tags(&self) -> ApiResult<Vec<Tag>> {
        let tags = self.api.tags().list().await?;
        self.state.lock().tags = tags.clone();
        Ok(tags)
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("filters", &self.filters())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestStack;
    use serde_json::json;

    fn page_json(page: u32) -> serde_json::Value {
        json!({
            "success": true,
            "data": {
                "items": [{
                    "id": "b1", "title": "Dune", "author": "Frank Herbert",
                    "description": "", "price": 9.5, "isPublished": true,
                    "coverUrl": null, "tags": ["sci-fi"],
                    "createdAt": "2026-02-01T00:00:00Z",
                    "hasPurchased": false, "canDownload": false
                }],
                "meta": {"page": page, "limit": 12, "total": 1}
            }
        })
    }

    #[test]
    fn test_merge_overrides() {
        let current = EbookFilters {
            search: "dune".into(),
            tag: Some("sci-fi".into()),
            page: 3,
        };
        let merged = current.merged(&FilterOverrides {
            page: Some(1),
            ..Default::default()
        });
        assert_eq!(merged.search, "dune");
        assert_eq!(merged.tag.as_deref(), Some("sci-fi"));
        assert_eq!(merged.page, 1);
    }

    #[tokio::test]
    async fn test_fetch_commits_filters_on_success() {
        let stack = TestStack::new();
        stack.transport.push_json(200, page_json(2));
        let catalog = CatalogStore::new(stack.api.clone());

        let page = catalog
            .fetch_ebooks(FilterOverrides {
                search: Some("dune".into()),
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items[0].title, "Dune");
        assert_eq!(catalog.filters().search, "dune");
        assert_eq!(catalog.filters().page, 2);
        assert!(catalog.paginated().is_some());
        assert!(!catalog.is_loading());
        let request = stack.transport.last_request().unwrap();
        assert_eq!(request.url.query(), Some("search=dune&page=2"));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_filters() {
        let stack = TestStack::new();
        stack.transport.push_json(500, json!({"message": "boom"}));
        let catalog = CatalogStore::new(stack.api.clone());

        let result = catalog
            .fetch_ebooks(FilterOverrides {
                tag: Some("poetry".into()),
                ..Default::default()
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(500));
        assert_eq!(catalog.filters(), EbookFilters::default());
        assert!(catalog.paginated().is_none());
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_tags() {
        let stack = TestStack::new();
        stack
            .transport
            .push_json(200, json!([{"id": "t1", "name": "Poetry"}]));
        let catalog = CatalogStore::new(stack.api.clone());

        catalog.fetch_tags().await.unwrap();
        assert_eq!(catalog.tags()[0].name, "Poetry");
    }
}
