use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::CategoryRegistry;

/// Category id reported for labels the registry does not know.
pub const UNKNOWN_CATEGORY_ID: i64 = -1;
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// One ranked category for a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category_id: i64,
    pub category_name: String,
    pub display_name: String,
    pub score: f32,
}

impl Prediction {
    pub fn is_unknown(&self) -> bool {
        self.category_id == UNKNOWN_CATEGORY_ID
    }
}

/// Joins raw model labels against the category registry.
///
/// Model and taxonomy can drift apart (a retrained checkpoint with a renamed
/// label, say). An unknown label becomes a sentinel prediction and a warning;
/// it never fails the request.
#[derive(Debug, Clone)]
pub struct ResponseMapper {
    registry: Arc<CategoryRegistry>,
}

impl ResponseMapper {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn map(&self, label: &str, score: f32) -> Prediction {
        match self.registry.by_name(label) {
            Some(category) => Prediction {
                category_id: i64::from(category.id),
                category_name: label.to_string(),
                display_name: category.display_name.clone(),
                score,
            },
            None => {
                tracing::warn!(label, "unknown category label from model");
                Prediction {
                    category_id: UNKNOWN_CATEGORY_ID,
                    category_name: label.to_string(),
                    display_name: UNKNOWN_DISPLAY_NAME.to_string(),
                    score,
                }
            }
        }
    }
}
