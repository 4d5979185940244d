mod cache;
mod config;
mod error;
mod filters;
mod mapper;
mod page_url;
mod ratelimit;
mod region;
mod requests;
mod scraping_context;
mod text_manipulators;

pub use cache::{Cache, CacheKey, DiskCache, MemoryCache, cached_call};
pub use config::{LoadFromEnv, ScrapingConfig, ScrapingEnv};
pub use error::ScrapeError;
pub use filters::{FilterRecord, FilterValue, LOCATION_KEYS};
pub use mapper::parse_redirect_url;
pub use page_url::{page_position, set_page};
pub use ratelimit::RateLimiter;
pub use region::{EstateRegionId, RegionRecord, parse_autosuggest};
pub use requests::{RequestClient, Transport};
pub use scraping_context::ScrapingContext;
pub use text_manipulators::{
    decode_entities, normalize, normalize_raw, normalize_text, replace_all, replace_in_sequence,
};
