use serde::Deserialize;

use crate::error::ScrapeError;

#[derive(Debug, Deserialize)]
struct MapperResponse {
    #[serde(rename = "redirectUrl")]
    redirect_url: Option<String>,
}

/// Pulls the canonical listing URL out of a mapper response body.
pub fn parse_redirect_url(body: &str) -> Result<String, ScrapeError> {
    let response: MapperResponse =
        serde_json::from_str(body).map_err(|source| ScrapeError::MalformedResponse {
            endpoint: "mapper",
            source,
        })?;
    response.redirect_url.ok_or(ScrapeError::MissingRedirectUrl)
}
