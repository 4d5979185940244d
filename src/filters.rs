use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

use crate::cache::CacheKey;
use crate::error::ScrapeError;
use crate::region::RegionRecord;

/// Filter names that already pin the search to a location. When any of them
/// is present the region hint is not looked up.
pub const LOCATION_KEYS: [&str; 5] = ["estate_region", "city", "street", "district", "county"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(String),
    List(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl<T: ToString> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.iter().map(ToString::to_string).collect())
    }
}

/// Search criteria for the mapper, kept in insertion order since that is the
/// order the form parts are sent in.
#[derive(Debug, Clone, Default)]
pub struct FilterRecord {
    entries: Vec<(String, FilterValue)>,
}

impl FilterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an existing value in place. Returns the old value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Option<FilterValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_location(&self) -> bool {
        LOCATION_KEYS.iter().any(|key| self.contains_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds the set fields of `region`, overriding filters of the same name.
    pub fn merge_region(&mut self, region: &RegionRecord) {
        for (name, value) in region.filter_pairs() {
            self.insert(name, value);
        }
    }

    /// One `(key, value)` pair per scalar; lists repeat their key once per
    /// element, in list order.
    pub fn flatten(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(key, value)| match value {
                FilterValue::Scalar(v) => vec![(key.clone(), v.clone())],
                FilterValue::List(vs) => vs.iter().map(|v| (key.clone(), v.clone())).collect(),
            })
            .collect()
    }

    /// Key for the mapper response to these filters. The mapper URL is part
    /// of the namespace, so a cache shared between hosts keeps them apart.
    pub fn cache_key(&self, mapper_url: &Url) -> anyhow::Result<CacheKey> {
        let sorted: BTreeMap<&str, &FilterValue> = self.iter().collect();
        CacheKey::for_value(&format!("mapper {mapper_url}"), &sorted)
    }

    /// Builds a record from `key=value` arguments. A key given more than once
    /// becomes a list.
    pub fn from_args<I, S>(args: I) -> Result<Self, ScrapeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut record = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, value)) = arg.split_once('=') else {
                return Err(ScrapeError::InvalidFilterArg(arg.to_string()));
            };
            if key.is_empty() {
                return Err(ScrapeError::InvalidFilterArg(arg.to_string()));
            }
            let merged = match record.get(key) {
                None => FilterValue::from(value),
                Some(FilterValue::Scalar(first)) => {
                    FilterValue::List(vec![first.clone(), value.to_string()])
                }
                Some(FilterValue::List(values)) => {
                    let mut values = values.clone();
                    values.push(value.to_string());
                    FilterValue::List(values)
                }
            };
            record.insert(key, merged);
        }
        Ok(record)
    }
}

/// Records are equal when they hold the same filters, whatever the order.
impl PartialEq for FilterRecord {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for FilterRecord {}

impl<K, V> FromIterator<(K, V)> for FilterRecord
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        record.extend(iter);
        record
    }
}

impl<K, V> Extend<(K, V)> for FilterRecord
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
