use crate::error::{AppError, Result};
use crate::models::{Recipe, UserId};
use crate::source::RecipeSource;

use super::{require_user, Ledger};

impl<S: RecipeSource> Ledger<S> {
    pub async fn add_favorite(&self, user: Option<UserId>, external_id: i64) -> Result<Recipe> {
        let user_id = require_user(user)?;
        let recipe = self.store.get_or_fetch(external_id).await?;

        if !self.repo.insert_favorite(user_id, recipe.id).await? {
            return Err(AppError::AlreadyFavorited(external_id));
        }
        tracing::debug!("User {} favorited recipe {}", user_id, external_id);
        Ok(recipe)
    }

    pub async fn remove_favorite(&self, user: Option<UserId>, external_id: i64) -> Result<()> {
        let user_id = require_user(user)?;
        let Some(recipe) = self.store.find(external_id).await? else {
            return Err(AppError::NotFavorited(external_id));
        };

        if !self.repo.delete_favorite(user_id, recipe.id).await? {
            return Err(AppError::NotFavorited(external_id));
        }
        Ok(())
    }

    pub async fn favorites(&self, user: Option<UserId>) -> Result<Vec<Recipe>> {
        let user_id = require_user(user)?;
        self.repo.favorite_recipes(user_id).await
    }
}
