use thiserror::Error;

/// Failures coming back from the gratka endpoints or from the URL heuristics.
///
/// Every variant is fatal for the URL build that raised it; nothing here is
/// retried.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("autosuggest returned no region for {0:?}")]
    NoRegionSuggestion(String),

    #[error("mapper response has no redirectUrl field")]
    MissingRedirectUrl,

    #[error("cannot place the page marker in {url:?}")]
    PageSlotOutOfRange { url: String },

    #[error("malformed JSON from the {endpoint} endpoint")]
    MalformedResponse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("the supplied URL is not valid")]
    InvalidUrl(#[from] url::ParseError),

    #[error("filter argument {0:?} is not of the form key=value")]
    InvalidFilterArg(String),
}
