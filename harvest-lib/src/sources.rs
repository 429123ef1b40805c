//! Production implementations of the pipeline's input seams.

use std::future::Future;
use std::sync::Arc;

use harvest_catalog::{CatalogError, CatalogQuery, IgdbClient};
use harvest_core::CatalogEntry;

use crate::error::FetchError;
use crate::fetcher::ImageSource;

/// Paged access to the catalog.
pub trait CatalogSource: Send + Sync {
    /// Entries at `offset`, at most `limit` of them. An empty page means the
    /// catalog is exhausted.
    fn fetch_page(
        &self,
        offset: u64,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send;
}

/// The game catalog, filtered and with screenshots capped per entry.
pub struct IgdbCatalog {
    client: Arc<IgdbClient>,
    filter: String,
    max_screenshots: usize,
}

impl IgdbCatalog {
    pub fn new(client: Arc<IgdbClient>, filter: impl Into<String>, max_screenshots: usize) -> Self {
        Self {
            client,
            filter: filter.into(),
            max_screenshots,
        }
    }
}

impl CatalogSource for IgdbCatalog {
    async fn fetch_page(&self, offset: u64, limit: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        let query = CatalogQuery::page(self.filter.clone(), limit, offset);
        let games = self.client.query_games(&query).await?;
        Ok(games
            .into_iter()
            .map(|g| g.into_entry(self.max_screenshots))
            .collect())
    }
}

impl ImageSource for IgdbClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.download_image(url)
            .await
            .map_err(|e| FetchError::DownloadFailed(e.to_string()))
    }
}
