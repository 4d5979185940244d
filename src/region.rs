use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ScrapeError;
use crate::text_manipulators::normalize;

/// Voivodeship id as returned by the autosuggest endpoint. Kept exactly as
/// gratka sent it, it is an id and not text.
#[derive(Debug, Clone, PartialEq)]
pub struct EstateRegionId(Value);

impl EstateRegionId {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for EstateRegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Location filters derived from a free-text region hint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionRecord {
    pub county: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub estate_region: Option<EstateRegionId>,
}

impl RegionRecord {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// `(filter name, value)` pairs for the fields that are set, in the order
    /// the autosuggest fields are read.
    pub fn filter_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("county", self.county.clone()),
            ("city", self.city.clone()),
            ("street", self.street.clone()),
            ("district", self.district.clone()),
            (
                "estate_region",
                self.estate_region.as_ref().map(ToString::to_string),
            ),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AutosuggestEntry {
    powiat: Option<String>,
    miejscowosc: Option<String>,
    ulica: Option<String>,
    dzielnica: Option<String>,
    id_wojewodztwo: Option<Value>,
}

impl From<AutosuggestEntry> for RegionRecord {
    fn from(entry: AutosuggestEntry) -> Self {
        Self {
            county: entry.powiat.as_deref().map(normalize),
            city: entry.miejscowosc.as_deref().map(normalize),
            street: entry.ulica.as_deref().map(normalize),
            district: entry.dzielnica.as_deref().map(normalize),
            estate_region: entry.id_wojewodztwo.map(EstateRegionId::new),
        }
    }
}

/// Reads the best suggestion (element 0) out of an autosuggest response body.
pub fn parse_autosuggest(region_part: &str, body: &str) -> Result<RegionRecord, ScrapeError> {
    let entries: Vec<AutosuggestEntry> =
        serde_json::from_str(body).map_err(|source| ScrapeError::MalformedResponse {
            endpoint: "autosuggest",
            source,
        })?;
    entries
        .into_iter()
        .next()
        .map(RegionRecord::from)
        .ok_or_else(|| ScrapeError::NoRegionSuggestion(region_part.to_string()))
}
