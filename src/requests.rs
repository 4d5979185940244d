use log::debug;
use reqwest::{
    Client, ClientBuilder, Response,
    header::CACHE_CONTROL,
    multipart::Form,
};
use url::Url;

use crate::{config::ScrapingConfig, ratelimit::RateLimiter};

/// The two kinds of request the gratka endpoints need.
pub trait Transport: Send + Sync {
    /// GET `url` and return the body.
    fn get_body(&self, url: &Url) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// POST `fields` to `url` as `multipart/form-data`, one text part per
    /// pair, and return the body.
    fn post_form(
        &self,
        url: &Url,
        fields: &[(String, String)],
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

pub struct RequestClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RequestClient {
    pub fn new(config: &ScrapingConfig) -> anyhow::Result<Self> {
        let mut builder = ClientBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let rate_limiter = RateLimiter::from_config(config);
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    pub async fn fetch_url_response(&self, url: &Url) -> anyhow::Result<Response> {
        // Wait (non-blocking) until we're allowed to make a request according
        // to our self-imposed rate-limiting policy.
        self.rate_limiter.wait_until_ready().await;

        debug!("GET {url}");
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        Ok(response)
    }

    pub async fn fetch_url_body(&self, url: &Url) -> anyhow::Result<String> {
        let response = self.fetch_url_response(url).await?;
        let body = response.text().await?;
        Ok(body)
    }

    pub async fn post_multipart(
        &self,
        url: &Url,
        fields: &[(String, String)],
    ) -> anyhow::Result<String> {
        self.rate_limiter.wait_until_ready().await;

        let form = fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });
        debug!("POST {url} with {} form parts", fields.len());
        let response = self
            .client
            .post(url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(body)
    }
}

impl Transport for RequestClient {
    async fn get_body(&self, url: &Url) -> anyhow::Result<String> {
        self.fetch_url_body(url).await
    }

    async fn post_form(&self, url: &Url, fields: &[(String, String)]) -> anyhow::Result<String> {
        self.post_multipart(url, fields).await
    }
}
