//! Result types handed back to the driver and on to the sink.

use serde::{Deserialize, Serialize};

/// Links one store to the public location of its flyer document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultEntry {
    pub store_name: String,
    pub document_url: String,
}

impl ResultEntry {
    /// The `(store, url)` row shape the sink expects.
    pub fn into_row(self) -> (String, String) {
        (self.store_name, self.document_url)
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// One entry per store that produced a document, in completion order.
    pub entries: Vec<ResultEntry>,
    pub stats: BatchStats,
}

/// Counters for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Store groups submitted.
    pub total_stores: usize,
    /// Stores whose document was written.
    pub produced_stores: usize,
    /// Stores with no products.
    pub skipped_stores: usize,
    /// Stores dropped by an unexpected failure.
    pub failed_stores: usize,
    /// Flyer pages across all written documents.
    pub total_pages: usize,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_into_row() {
        let entry = ResultEntry {
            store_name: "LC Miraflores".into(),
            document_url: "https://cdn.example/flyers/LENTO_LC%20Miraflores.pdf".into(),
        };
        let (store, url) = entry.into_row();
        assert_eq!(store, "LC Miraflores");
        assert!(url.ends_with("LENTO_LC%20Miraflores.pdf"));
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = BatchStats {
            total_stores: 3,
            produced_stores: 2,
            skipped_stores: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).expect("serialise");
        assert!(json.contains("\"produced_stores\":2"));
    }
}
