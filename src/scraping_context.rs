use std::sync::Arc;

use anyhow::Context;
use log::{debug, info};
use url::Url;

use crate::{
    cache::{Cache, CacheKey, cached_call},
    config::ScrapingConfig,
    filters::FilterRecord,
    mapper::parse_redirect_url,
    page_url::set_page,
    region::{RegionRecord, parse_autosuggest},
    requests::{RequestClient, Transport},
};

/// Everything a URL build needs: endpoints, a transport and the cache the
/// remote calls are memoized in.
pub struct ScrapingContext<T = RequestClient> {
    pub scraping_config: ScrapingConfig,
    transport: T,
    cache: Arc<dyn Cache>,
}

impl ScrapingContext<RequestClient> {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_config = ScrapingConfig::new()?;
        Self::from_config(scraping_config)
    }

    pub fn from_config(scraping_config: ScrapingConfig) -> anyhow::Result<Self> {
        let request_client = RequestClient::new(&scraping_config)?;
        let cache = scraping_config.open_cache()?;
        Ok(ScrapingContext {
            scraping_config,
            transport: request_client,
            cache,
        })
    }
}

impl<T: Transport> ScrapingContext<T> {
    pub fn with_transport(
        scraping_config: ScrapingConfig,
        transport: T,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            scraping_config,
            transport,
            cache,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Body of the page at `url`, served from the cache after the first fetch.
    pub async fn fetch_page(&self, url: &Url) -> anyhow::Result<String> {
        let key = CacheKey::for_value("page", url.as_str())?;
        cached_call(self.cache.as_ref(), key, || self.transport.get_body(url))
            .await
            .with_context(|| format!("failed to fetch {url}"))
    }

    /// Looks `region_part` up in the autosuggest endpoint and turns the best
    /// match into location filters. An empty hint resolves to nothing without
    /// touching the network.
    pub async fn resolve_region(&self, region_part: &str) -> anyhow::Result<RegionRecord> {
        if region_part.is_empty() {
            return Ok(RegionRecord::default());
        }
        let url = self.scraping_config.autosuggest_url(region_part)?;
        let body = self.fetch_page(&url).await?;
        let region = parse_autosuggest(region_part, &body)?;
        debug!("Region for {region_part:?}: {region:?}");
        Ok(region)
    }

    /// Asks the mapper for the canonical listing URL matching `filters`.
    /// Records that are equal up to key order share one cache entry.
    pub async fn resolve_url(&self, filters: &FilterRecord) -> anyhow::Result<String> {
        let mapper_url = self.scraping_config.mapper_url()?;
        let key = filters.cache_key(&mapper_url)?;
        let fields = filters.flatten();
        cached_call(self.cache.as_ref(), key, || async {
            let body = self.transport.post_form(&mapper_url, &fields).await?;
            Ok::<_, anyhow::Error>(parse_redirect_url(&body)?)
        })
        .await
        .context("failed to resolve listing url")
    }

    /// Builds a ready-to-use listing URL for `page`.
    ///
    /// `region` is only looked up when `filters` do not already name a
    /// location.
    pub async fn build_listing_url(
        &self,
        region: &str,
        page: u32,
        mut filters: FilterRecord,
    ) -> anyhow::Result<String> {
        if !filters.has_location() {
            let region_record = self.resolve_region(region).await?;
            filters.merge_region(&region_record);
        }
        let canonical_url = self.resolve_url(&filters).await?;
        let url = set_page(&canonical_url, page)?;
        info!("Listing url for page {page}: {url}");
        Ok(url)
    }
}
