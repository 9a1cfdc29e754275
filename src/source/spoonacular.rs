use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};

use super::{RecipeSource, SearchParams, SourceError};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

pub struct SpoonacularClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl SpoonacularClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("recipe-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("invalid base_url {}: {}", config.base_url, e)))?;

        let api_key = config.resolved_api_key();
        if api_key.is_none() {
            tracing::warn!("No Spoonacular API key configured, upstream calls will be rejected");
        }

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Decode(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> std::result::Result<Value, SourceError> {
        let mut request = self.client.get(url.clone()).query(query);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apiKey", key)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            tracing::warn!("Spoonacular request to {} failed: HTTP {}", url.path(), response.status());
            return Err(SourceError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

impl RecipeSource for SpoonacularClient {
    async fn search(&self, params: &SearchParams) -> std::result::Result<Vec<Value>, SourceError> {
        let mut query = vec![
            ("query", params.query.clone()),
            ("number", params.limit.to_string()),
            ("addRecipeInformation", "true".to_string()),
            ("fillIngredients", "true".to_string()),
        ];
        if let Some(cuisine) = &params.cuisine {
            query.push(("cuisine", cuisine.clone()));
        }
        if let Some(meal_type) = &params.meal_type {
            query.push(("type", meal_type.clone()));
        }
        if let Some(diet) = &params.diet {
            query.push(("diet", diet.clone()));
        }

        let url = self.endpoint(&["complexSearch"])?;
        let body = self.get_json(url, &query).await?;
        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;

        tracing::debug!("Search {:?} returned {} results", params.query, response.results.len());
        Ok(response.results)
    }

    async fn fetch_details(&self, external_id: i64) -> std::result::Result<Value, SourceError> {
        let id = external_id.to_string();
        let url = self.endpoint(&[&id, "information"])?;
        self.get_json(url, &[("includeNutrition", "true".to_string())])
            .await
    }

    async fn fetch_instructions(&self, external_id: i64) -> std::result::Result<Value, SourceError> {
        let id = external_id.to_string();
        let url = self.endpoint(&[&id, "analyzedInstructions"])?;
        self.get_json(url, &[]).await
    }
}
