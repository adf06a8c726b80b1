use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::Field;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Tuning for mapping, classification and commit.
///
/// Every field has a default, so an empty TOML table is a valid config:
///
/// ```toml
/// high_threshold = 92.0
/// low_threshold = 60.0
/// price_tolerance_cents = 0
///
/// [keywords]
/// sale = ["satış", "sale", "fiyat"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Similarity at or above which a row is treated as the same product.
    pub high_threshold: f64,
    /// Similarity at or above which the best candidate is offered as a
    /// suggestion. Below it the row is NEW.
    pub low_threshold: f64,
    /// Maximum per-price difference still treated as "no change".
    pub price_tolerance_cents: i64,
    /// Skip candidates whose length difference alone rules out reaching
    /// `low_threshold`.
    pub length_prefilter: bool,
    pub keywords: KeywordConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            high_threshold: 92.0,
            low_threshold: 60.0,
            price_tolerance_cents: 0,
            length_prefilter: true,
            keywords: KeywordConfig::default(),
        }
    }
}

impl MatchConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, value) in [("high_threshold", self.high_threshold), ("low_threshold", self.low_threshold)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{label} must be between 0 and 100, got {value}"
                )));
            }
        }
        if self.low_threshold > self.high_threshold {
            return Err(ConfigError::Validation(format!(
                "low_threshold ({}) must not exceed high_threshold ({})",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.price_tolerance_cents < 0 {
            return Err(ConfigError::Validation(
                "price_tolerance_cents must not be negative".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Header keywords
// ---------------------------------------------------------------------------

/// Ranked header keywords per canonical field. Earlier keywords win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub name: Vec<String>,
    pub purchase: Vec<String>,
    pub sale: Vec<String>,
    pub group: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        fn list(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }
        Self {
            name: list(&["ürün adı", "ürün", "urun", "product", "name", "isim", "adı"]),
            purchase: list(&["alış", "alis", "purchase", "cost", "maliyet"]),
            sale: list(&["satış", "sale", "satış fiyatı", "fiyat", "price"]),
            group: list(&["grup", "group", "kategori", "category"]),
        }
    }
}

impl KeywordConfig {
    pub fn for_field(&self, field: Field) -> &[String] {
        match field {
            Field::Name => &self.name,
            Field::Purchase => &self.purchase,
            Field::Sale => &self.sale,
            Field::Group => &self.group,
        }
    }
}
