use std::sync::Arc;

use crate::accounts::Accounts;
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{Recipe, UserId};
use crate::recipes::RecipeStore;
use crate::source::{RecipeSource, SearchParams, SpoonacularClient};

/// Everything the routing layer talks to, wired against one database.
pub struct App<S = SpoonacularClient> {
    pub repository: Repository,
    pub store: Arc<RecipeStore<S>>,
    pub ledger: Ledger<S>,
    pub accounts: Accounts,
    default_max_results: u32,
}

impl App<SpoonacularClient> {
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let repository = Repository::new(&config.db_path).await?;
        let source = SpoonacularClient::new(config)?;
        Ok(Self::with_source(repository, source, config.default_max_results))
    }
}

impl<S: RecipeSource> App<S> {
    pub fn with_source(repository: Repository, source: S, default_max_results: u32) -> Self {
        let store = Arc::new(RecipeStore::new(repository.clone(), source));
        let ledger = Ledger::new(repository.clone(), Arc::clone(&store));
        let accounts = Accounts::new(repository.clone());

        Self {
            repository,
            store,
            ledger,
            accounts,
            default_max_results,
        }
    }

    pub fn search_params(&self, query: impl Into<String>) -> SearchParams {
        SearchParams::new(query).limit(self.default_max_results)
    }

    /// Record the search for a signed-in user, then query upstream.
    pub async fn search_recipes(
        &self,
        user: Option<UserId>,
        params: &SearchParams,
    ) -> Result<Vec<Recipe>> {
        self.ledger
            .record_search(user, &params.query, &params.filters())
            .await?;
        self.store.search(params).await
    }

    /// Canonical recipe, rescaled when a different positive serving count
    /// is requested. Scaling never touches the stored record.
    pub async fn recipe_details(&self, external_id: i64, servings: Option<u32>) -> Result<Recipe> {
        let recipe = self.store.get_or_fetch(external_id).await?;
        match servings {
            Some(n) if n > 0 && n != recipe.data.servings => Ok(recipe.scaled(n)),
            _ => Ok(recipe),
        }
    }
}
