use crate::config::MatchConfig;
use crate::model::CatalogProduct;
use crate::similarity::{case_key, length_bound, score_keys};

/// Catalog products with precomputed comparison keys, in ascending id order.
pub struct CatalogIndex<'a> {
    entries: Vec<IndexEntry<'a>>,
}

struct IndexEntry<'a> {
    product: &'a CatalogProduct,
    key: String,
    chars: usize,
}

/// Best catalog candidate for one name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch<'a> {
    pub product: &'a CatalogProduct,
    pub similarity: f64,
}

impl<'a> CatalogIndex<'a> {
    pub fn new(products: &'a [CatalogProduct]) -> Self {
        let mut entries: Vec<IndexEntry<'a>> = products
            .iter()
            .map(|product| {
                let key = case_key(&product.name);
                let chars = key.chars().count();
                IndexEntry { product, key, chars }
            })
            .collect();
        entries.sort_by_key(|e| e.product.id);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-scoring product for `name`; ties go to the lowest id.
    ///
    /// With `length_prefilter` on, products whose length difference alone
    /// keeps them under `low_threshold` are skipped. Such products can never
    /// be a match or a suggestion, so the outcome is unchanged; the result
    /// is `None` when nothing survives the filter.
    pub fn best_match(&self, name: &str, config: &MatchConfig) -> Option<BestMatch<'a>> {
        let key = case_key(name);
        let chars = key.chars().count();
        let mut best: Option<BestMatch<'a>> = None;

        for entry in &self.entries {
            if config.length_prefilter && length_bound(chars, entry.chars) < config.low_threshold {
                continue;
            }
            let similarity = score_keys(&key, &entry.key);
            // Strictly greater: ids ascend, so the first of equal scores stays.
            if best.map_or(true, |b| similarity > b.similarity) {
                best = Some(BestMatch { product: entry.product, similarity });
                if similarity >= 100.0 {
                    break;
                }
            }
        }

        best
    }
}
