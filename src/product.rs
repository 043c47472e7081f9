//! Typed product records consumed by the composition engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One product line to render on a flyer.
///
/// Records are validated once at the ingestion boundary
/// ([`crate::feed`]) and only ever borrowed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Brand shown above the title. May be empty.
    pub brand: String,
    /// Display identifier printed in the SKU badge.
    pub sku: String,
    /// Article description; wrapped and truncated at render time.
    pub title: String,
    /// URL of the product photo, if the feed had one.
    pub image_ref: Option<String>,
}

impl ProductRecord {
    pub fn new(brand: impl Into<String>, sku: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            sku: sku.into(),
            title: title.into(),
            image_ref: None,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// Products grouped by store name, each group in feed order.
pub type StoreGroups = BTreeMap<String, Vec<ProductRecord>>;
