use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::models::SearchFilters;

#[cfg(test)]
pub mod fake;
mod raw;
mod spoonacular;

pub use raw::{RawIngredient, RawInstructionGroup, RawNutrient, RawNutrition, RawRecipe, RawStep};
pub use spoonacular::SpoonacularClient;

pub const DEFAULT_SEARCH_LIMIT: u32 = 12;
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Unexpected response shape: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub cuisine: Option<String>,
    pub meal_type: Option<String>,
    pub diet: Option<String>,
    pub limit: u32,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            cuisine: None,
            meal_type: None,
            diet: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = non_empty(cuisine.into());
        self
    }

    pub fn meal_type(mut self, meal_type: impl Into<String>) -> Self {
        self.meal_type = non_empty(meal_type.into());
        self
    }

    pub fn diet(mut self, diet: impl Into<String>) -> Self {
        self.diet = non_empty(diet.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self
    }

    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            cuisine: self.cuisine.clone(),
            meal_type: self.meal_type.clone(),
            diet: self.diet.clone(),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A third-party recipe provider. Payloads come back as raw JSON and are
/// only given structure by [`RawRecipe::parse`].
pub trait RecipeSource: Send + Sync {
    fn search(
        &self,
        params: &SearchParams,
    ) -> impl Future<Output = Result<Vec<Value>, SourceError>> + Send;

    fn fetch_details(
        &self,
        external_id: i64,
    ) -> impl Future<Output = Result<Value, SourceError>> + Send;

    fn fetch_instructions(
        &self,
        external_id: i64,
    ) -> impl Future<Output = Result<Value, SourceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_are_dropped() {
        let params = SearchParams::new("pasta")
            .cuisine("  ")
            .meal_type("main course")
            .diet("");
        assert_eq!(
            params.filters(),
            SearchFilters {
                cuisine: None,
                meal_type: Some("main course".to_string()),
                diet: None,
            }
        );
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(SearchParams::new("x").limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(SearchParams::new("x").limit(0).limit, 1);
        assert_eq!(SearchParams::new("x").limit(500).limit, MAX_SEARCH_LIMIT);
    }
}
