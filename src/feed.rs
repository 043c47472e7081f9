//! Feed ingestion: raw spreadsheet rows → validated [`ProductRecord`]s
//! grouped by store.
//!
//! The feed is a JSON array of row objects exported from the offers sheet.
//! Column names are accepted in English (`store`, `brand`, `sku`, `title`,
//! `image`) or as the sheet headers (`Tienda`, `Marca`, `SKU`, `Articulo`,
//! `image_link`). Spreadsheet exports turn numeric-looking cells into JSON
//! numbers, so every cell accepts a string, a number or null.
//!
//! Product photos are joined from a separate lookup keyed by the cleaned
//! SKU (see [`clean_sku`]).

use crate::error::FlyerError;
use crate::product::{ProductRecord, StoreGroups};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Exhibition-unit marker (`-EX`, any case); the photo is shared with the
/// regular SKU.
static RE_EXHIBITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)-EX").unwrap());

/// One row of the offers feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedRow {
    #[serde(alias = "Tienda", default, deserialize_with = "cell")]
    pub store: String,
    #[serde(alias = "Marca", default, deserialize_with = "cell")]
    pub brand: String,
    #[serde(alias = "SKU", default, deserialize_with = "cell")]
    pub sku: String,
    #[serde(alias = "Articulo", default, deserialize_with = "cell")]
    pub title: String,
    #[serde(alias = "image_link", default, deserialize_with = "optional_cell")]
    pub image: Option<String>,
}

/// One entry of the image lookup sheet.
#[derive(Debug, Deserialize)]
struct LookupRow {
    #[serde(deserialize_with = "cell")]
    sku: String,
    #[serde(default, deserialize_with = "cell")]
    base_image_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupFile {
    Rows(Vec<LookupRow>),
    Map(HashMap<String, String>),
}

fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(cell_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(cell_text(Value::deserialize(deserializer)?))
}

/// Remove every `-EX` marker (any case) and surrounding whitespace.
///
/// ```rust
/// assert_eq!(lento_flyers::clean_sku(" 10045-ex "), "10045");
/// ```
pub fn clean_sku(sku: &str) -> String {
    RE_EXHIBITION.replace_all(sku, "").trim().to_string()
}

/// Parse feed rows from JSON text.
pub fn parse_feed(json: &str) -> Result<Vec<FeedRow>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse an image lookup from JSON text: either an array of
/// `{ "sku": ..., "base_image_path": ... }` rows or a flat `{ sku: url }`
/// object. Keys are cleaned with [`clean_sku`]; later rows win.
pub fn parse_lookup(json: &str) -> Result<HashMap<String, String>, serde_json::Error> {
    let lookup = match serde_json::from_str::<LookupFile>(json)? {
        LookupFile::Rows(rows) => rows
            .into_iter()
            .map(|r| (clean_sku(&r.sku), r.base_image_path))
            .collect(),
        LookupFile::Map(map) => map.into_iter().map(|(k, v)| (clean_sku(&k), v)).collect(),
    };
    Ok(lookup)
}

fn read(path: &Path) -> Result<String, FlyerError> {
    std::fs::read_to_string(path).map_err(|e| FlyerError::FeedRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load feed rows from a JSON file.
pub fn load_feed(path: &Path) -> Result<Vec<FeedRow>, FlyerError> {
    let rows = parse_feed(&read(path)?).map_err(|e| FlyerError::FeedParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    info!("Loaded {} feed rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Load an image lookup from a JSON file.
pub fn load_lookup(path: &Path) -> Result<HashMap<String, String>, FlyerError> {
    let lookup = parse_lookup(&read(path)?).map_err(|e| FlyerError::FeedParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    info!("Loaded {} image references from {}", lookup.len(), path.display());
    Ok(lookup)
}

impl FeedRow {
    /// Convert to a product record, resolving its image from `lookup` when
    /// the row carries no usable reference of its own.
    pub fn into_product(self, lookup: Option<&HashMap<String, String>>) -> ProductRecord {
        let own = self.image.filter(|s| !s.trim().is_empty());
        let image_ref = own.or_else(|| {
            lookup
                .and_then(|l| l.get(&clean_sku(&self.sku)))
                .filter(|s| !s.trim().is_empty())
                .cloned()
        });
        ProductRecord {
            brand: self.brand,
            sku: self.sku,
            title: self.title,
            image_ref,
        }
    }
}

/// Group rows by trimmed store name.
///
/// Rows with a blank store name are dropped. Groups are ordered by store
/// name; rows keep their feed order inside each group.
pub fn group_by_store(
    rows: Vec<FeedRow>,
    lookup: Option<&HashMap<String, String>>,
) -> StoreGroups {
    let mut groups = StoreGroups::new();
    let mut dropped = 0usize;
    for row in rows {
        let store = row.store.trim().to_string();
        if store.is_empty() {
            dropped += 1;
            continue;
        }
        groups
            .entry(store)
            .or_default()
            .push(row.into_product(lookup));
    }
    if dropped > 0 {
        debug!("Dropped {} rows without a store name", dropped);
    }
    groups
}
