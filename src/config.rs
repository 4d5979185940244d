use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use url::Url;

use crate::cache::{Cache, DiskCache, MemoryCache};

const DEFAULT_BASE_URL: &str = "http://www.gratka.pl/";
const AUTOSUGGEST_PATH: &str = "b-dom/ajax/podpowiedzi-lokalizacja/";
const MAPPER_PATH: &str = "mapper/";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_req_per_sec() -> u32 {
    5
}

fn default_ms_between_req() -> u64 {
    100
}

/// The env vars read for scraping. All of them are optional.
#[derive(Debug, Deserialize)]
pub struct ScrapingEnv {
    #[serde(default = "default_base_url")]
    gratka_base_url: String,
    #[serde(default)]
    gratka_cache_dir: Option<PathBuf>,
    #[serde(default = "default_req_per_sec")]
    gratka_req_per_sec: u32,
    #[serde(default = "default_ms_between_req")]
    gratka_ms_between_req: u64,
    #[serde(default)]
    gratka_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ScrapingConfig {
    base_url: Url,
    pub cache_dir: Option<PathBuf>,
    pub req_per_sec: NonZeroU32,
    pub ms_between_req: Duration,
    pub timeout: Option<Duration>,
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_env = ScrapingEnv::load_from_env()?;
        Self::from_env(scraping_env)
    }

    pub fn from_env(scraping_env: ScrapingEnv) -> anyhow::Result<Self> {
        let base_url = parse_base_url(&scraping_env.gratka_base_url)?;
        let req_per_sec = NonZeroU32::new(scraping_env.gratka_req_per_sec)
            .context("GRATKA_REQ_PER_SEC must be greater than zero")?;
        Ok(Self {
            base_url,
            cache_dir: scraping_env.gratka_cache_dir,
            req_per_sec,
            ms_between_req: Duration::from_millis(scraping_env.gratka_ms_between_req),
            timeout: scraping_env.gratka_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Same defaults as an empty environment, pointed at `base_url`.
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ..Self::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn autosuggest_url(&self, region_part: &str) -> anyhow::Result<Url> {
        let mut url = self.base_url.join(AUTOSUGGEST_PATH)?;
        url.query_pairs_mut().append_pair("tekst", region_part);
        Ok(url)
    }

    pub fn mapper_url(&self) -> anyhow::Result<Url> {
        Ok(self.base_url.join(MAPPER_PATH)?)
    }

    /// Disk cache when a cache dir is configured, memory cache otherwise.
    pub fn open_cache(&self) -> anyhow::Result<Arc<dyn Cache>> {
        Ok(match &self.cache_dir {
            Some(dir) => Arc::new(DiskCache::open(dir)?),
            None => Arc::new(MemoryCache::new()),
        })
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            cache_dir: None,
            req_per_sec: NonZeroU32::new(default_req_per_sec()).expect("default rate is non-zero"),
            ms_between_req: Duration::from_millis(default_ms_between_req()),
            timeout: None,
        }
    }
}

// `Url::join` drops the last path segment unless the base ends with a slash.
fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).with_context(|| format!("invalid GRATKA_BASE_URL: {raw}"))
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
