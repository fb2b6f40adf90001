//! Cache Key Construction
//!
//! Builds the deterministic, order-sensitive keys the persistent tier is
//! indexed by. A key is the concatenation of the category name, the product
//! barcode, an optional `user_{id}` segment, and an optional `q_{hash}`
//! segment derived from a free-text question.
//!
//! Determinism is the only correctness property the scheme needs: identical
//! inputs must yield identical keys, and any differing input part must yield
//! a different key. Key construction never fails for well-formed input;
//! absent owner/question segments are simply omitted.

use sha2::{Digest, Sha256};

use crate::category::Category;

/// Width of the hashed question segment, in hex characters.
const QUESTION_HASH_LEN: usize = 8;

// == Build Key ==
/// Builds a unique cache key for (category, barcode, user, question).
///
/// # Arguments
/// * `category` - Data category, always the leading segment
/// * `barcode` - Product barcode (required)
/// * `user_id` - Optional user dimension for personalized results
/// * `question` - Optional free-text question, stored as a short hash
pub fn build_key(
    category: Category,
    barcode: &str,
    user_id: Option<i64>,
    question: Option<&str>,
) -> String {
    let mut key = format!("{}_{}", category.as_str(), barcode);

    if let Some(user_id) = user_id {
        key.push_str(&format!("_user_{}", user_id));
    }

    if let Some(question) = question {
        key.push_str(&format!("_q_{}", question_hash(question)));
    }

    key
}

// == Product Prefix ==
/// Returns the key prefix shared by every entry for (category, barcode).
///
/// Targeted invalidation deletes by this prefix across all categories.
pub fn product_prefix(category: Category, barcode: &str) -> String {
    format!("{}_{}", category.as_str(), barcode)
}

/// Short deterministic hash of a question, to keep keys bounded.
fn question_hash(question: &str) -> String {
    let digest = Sha256::digest(question.as_bytes());
    hex::encode(&digest)[..QUESTION_HASH_LEN].to_string()
}
