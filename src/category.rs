//! Data Categories and TTL Policy
//!
//! Every cached payload belongs to one category. The category drives key
//! construction, the `data_type` column in the persistent tier, TTL
//! selection, and statistics grouping.

use serde::{Deserialize, Serialize};

// == Category ==
/// The kind of analysis result a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Full composite analysis aggregating all the others
    CompleteAnalysis,
    /// Product metadata looked up from external catalogs
    ProductInfo,
    /// Generated response to a user question about a product
    AiAnalysis,
    /// Derived safety score (changes least often)
    SafetyScore,
    /// Per-ingredient component analysis
    IngredientAnalysis,
    /// Raw barcode lookup result
    BarcodeLookup,
}

impl Category {
    /// All categories, in statistics-report order.
    pub const ALL: [Category; 6] = [
        Category::CompleteAnalysis,
        Category::ProductInfo,
        Category::AiAnalysis,
        Category::SafetyScore,
        Category::IngredientAnalysis,
        Category::BarcodeLookup,
    ];

    /// Stable string form used in cache keys and the `data_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CompleteAnalysis => "complete_analysis",
            Category::ProductInfo => "product_info",
            Category::AiAnalysis => "ai_analysis",
            Category::SafetyScore => "safety_score",
            Category::IngredientAnalysis => "ingredient_analysis",
            Category::BarcodeLookup => "barcode_lookup",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// == TTL Policy ==
/// Static mapping from category to TTL in hours.
///
/// Relative ordering matters more than the exact numbers: metadata and
/// lookup results cache long (24h), safety scores longest (48h), generated
/// responses and component analyses mid-range (12h), and the composite
/// complete analysis shortest (6h) since it aggregates all the others.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    pub complete_analysis: i64,
    pub product_info: i64,
    pub ai_analysis: i64,
    pub safety_score: i64,
    pub ingredient_analysis: i64,
    pub barcode_lookup: i64,
}

impl TtlPolicy {
    /// Returns the configured TTL in hours for a category.
    ///
    /// The same value is applied to every `set` for that category.
    pub fn ttl_hours(&self, category: Category) -> i64 {
        match category {
            Category::CompleteAnalysis => self.complete_analysis,
            Category::ProductInfo => self.product_info,
            Category::AiAnalysis => self.ai_analysis,
            Category::SafetyScore => self.safety_score,
            Category::IngredientAnalysis => self.ingredient_analysis,
            Category::BarcodeLookup => self.barcode_lookup,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            complete_analysis: 6,
            product_info: 24,
            ai_analysis: 12,
            safety_score: 48,
            ingredient_analysis: 12,
            barcode_lookup: 24,
        }
    }
}
