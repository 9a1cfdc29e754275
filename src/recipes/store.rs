use serde_json::Value;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Recipe, RecipeData};
use crate::source::{RecipeSource, SearchParams};

use super::normalizer::{normalize, NormalizeError};

/// Canonical, deduplicated recipe collection backed by a [`RecipeSource`].
pub struct RecipeStore<S> {
    repo: Repository,
    source: S,
}

impl<S: RecipeSource> RecipeStore<S> {
    pub fn new(repo: Repository, source: S) -> Self {
        Self { repo, source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Stored record only; never calls the source.
    pub async fn find(&self, external_id: i64) -> Result<Option<Recipe>> {
        self.repo.find_recipe(external_id).await
    }

    /// Return the canonical record, fetching and persisting it on a miss.
    /// A stored record is never overwritten by newer upstream data.
    pub async fn get_or_fetch(&self, external_id: i64) -> Result<Recipe> {
        if let Some(recipe) = self.repo.find_recipe(external_id).await? {
            return Ok(recipe);
        }

        let data = match self.fetch_normalized(external_id).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Recipe {} could not be fetched: {}", external_id, e);
                return Err(AppError::RecipeNotFound(external_id));
            }
        };

        let (recipe, inserted) = self.repo.insert_recipe_or_get(data).await?;
        if inserted {
            tracing::info!("Stored recipe {} ({})", external_id, recipe.data.title);
        } else {
            tracing::debug!("Recipe {} was stored concurrently, using existing row", external_id);
        }
        Ok(recipe)
    }

    async fn fetch_normalized(&self, external_id: i64) -> Result<RecipeData> {
        let mut payload = self.source.fetch_details(external_id).await?;

        match self.source.fetch_instructions(external_id).await {
            Ok(steps @ Value::Array(_)) => {
                if let Some(fields) = payload.as_object_mut() {
                    fields.insert("analyzedInstructions".to_string(), steps);
                }
            }
            Ok(_) => tracing::debug!("Ignoring non-list instructions for recipe {}", external_id),
            Err(e) => tracing::debug!("No analyzed instructions for recipe {}: {}", external_id, e),
        }

        let data = normalize(payload)?;
        if data.external_id != external_id {
            return Err(NormalizeError::MalformedPayload(format!(
                "requested recipe {} but provider returned {}",
                external_id, data.external_id
            ))
            .into());
        }
        Ok(data)
    }

    /// Search upstream, persisting every hit that normalizes. Bad hits are
    /// skipped; an unavailable source yields no results.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Recipe>> {
        let payloads = match self.source.search(params).await {
            Ok(payloads) => payloads,
            Err(e) => {
                tracing::warn!("Recipe search for {:?} failed: {}", params.query, e);
                return Ok(Vec::new());
            }
        };

        let mut recipes = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match normalize(payload) {
                Ok(data) => {
                    let (recipe, _) = self.repo.insert_recipe_or_get(data).await?;
                    recipes.push(recipe);
                }
                Err(e) => tracing::debug!("Skipping search result: {}", e),
            }
        }
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::source::fake::{recipe_payload, FakeSource};

    async fn store(source: FakeSource) -> (RecipeStore<FakeSource>, Repository) {
        let repo = Repository::open_in_memory().await.unwrap();
        (RecipeStore::new(repo.clone(), source), repo)
    }

    #[tokio::test]
    async fn miss_fetches_and_persists_once() {
        let source = FakeSource::new().with_recipe(
            42,
            recipe_payload(42, "Risotto", 4, &[("rice", 300.0, "g")]),
        );
        let (store, repo) = store(source).await;

        let first = assert_ok!(store.get_or_fetch(42).await);
        let second = assert_ok!(store.get_or_fetch(42).await);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.data.title, "Risotto");
        assert_eq!(first.data.dietary_info, vec!["vegetarian", "dairy-free"]);
        assert_eq!(store.source().detail_calls(), 1);
        assert_eq!(repo.recipe_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stored_record_wins_over_changed_upstream() {
        let source = FakeSource::new().with_recipe(1, recipe_payload(1, "Before", 2, &[]));
        let (store, _) = store(source).await;

        let before = store.get_or_fetch(1).await.unwrap();
        store
            .source()
            .set_details(1, recipe_payload(1, "After", 6, &[]));
        let after = store.get_or_fetch(1).await.unwrap();

        assert_eq!(after, before);
        assert_eq!(after.data.title, "Before");
    }

    #[tokio::test]
    async fn unavailable_source_is_not_found_and_persists_nothing() {
        let source = FakeSource::new().with_recipe(3, recipe_payload(3, "Soup", 2, &[]));
        source.set_unavailable(true);
        let (store, repo) = store(source).await;

        let err = assert_err!(store.get_or_fetch(3).await);
        assert!(matches!(err, AppError::RecipeNotFound(3)));
        assert_eq!(repo.recipe_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_payload_is_not_found() {
        let source = FakeSource::new()
            .with_recipe(4, json!({"title": "No id"}))
            .with_recipe(5, json!({"id": 5, "extendedIngredients": {"oops": true}}))
            .with_recipe(6, recipe_payload(60, "Wrong id", 2, &[]));
        let (store, repo) = store(source).await;

        for id in [4, 5, 6, 404] {
            let err = assert_err!(store.get_or_fetch(id).await);
            assert!(matches!(err, AppError::RecipeNotFound(n) if n == id));
        }
        assert_eq!(repo.recipe_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn analyzed_instructions_fill_missing_text() {
        let mut payload = recipe_payload(8, "Bread", 1, &[]);
        payload["instructions"] = Value::Null;
        let source = FakeSource::new().with_recipe(8, payload);
        source.set_instructions(
            8,
            json!([{"name": "", "steps": [
                {"number": 1, "step": "Knead."},
                {"number": 2, "step": "Bake."}
            ]}]),
        );
        let (store, _) = store(source).await;

        let recipe = store.get_or_fetch(8).await.unwrap();
        assert_eq!(recipe.data.instructions, "1. Knead.\n2. Bake.");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_create_one_row() {
        let source = FakeSource::new().with_recipe(
            99,
            recipe_payload(99, "Curry", 4, &[("rice", 1.0, "cup")]),
        );
        let (store, repo) = store(source).await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.get_or_fetch(99).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert!(results.iter().all(|r| *r == results[0]));
        assert_eq!(repo.recipe_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_skips_bad_hits_and_persists_good_ones() {
        let source = FakeSource::new();
        source.set_search_results(vec![
            recipe_payload(10, "Tacos", 2, &[]),
            json!({"title": "Missing id"}),
            json!({"id": 11, "cuisines": "Mexican"}),
            recipe_payload(12, "Burrito", 2, &[]),
        ]);
        let (store, repo) = store(source).await;

        let recipes = store.search(&SearchParams::new("mexican")).await.unwrap();
        let ids: Vec<i64> = recipes.iter().map(|r| r.external_id()).collect();
        assert_eq!(ids, vec![10, 12]);
        assert_eq!(repo.recipe_count().await.unwrap(), 2);

        // Later lookups are served from the store.
        assert_eq!(store.get_or_fetch(12).await.unwrap(), recipes[1]);
        assert_eq!(store.source().detail_calls(), 0);
    }

    #[tokio::test]
    async fn search_with_unavailable_source_is_empty() {
        let source = FakeSource::new();
        source.set_search_results(vec![recipe_payload(10, "Tacos", 2, &[])]);
        source.set_unavailable(true);
        let (store, repo) = store(source).await;

        let recipes = store.search(&SearchParams::new("tacos")).await.unwrap();
        assert!(recipes.is_empty());
        assert_eq!(repo.recipe_count().await.unwrap(), 0);
    }
}
