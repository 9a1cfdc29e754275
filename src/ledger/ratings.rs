use crate::db::average;
use crate::error::{AppError, Result};
use crate::models::{Rating, Recipe, RecipeRatings, UserId};
use crate::source::RecipeSource;

use super::{require_user, Ledger};

impl<S: RecipeSource> Ledger<S> {
    /// Rate a recipe from 1 to 5. Re-rating replaces the user's earlier
    /// value and review.
    pub async fn rate(
        &self,
        user: Option<UserId>,
        external_id: i64,
        value: i64,
        review: Option<String>,
    ) -> Result<Rating> {
        let user_id = require_user(user)?;
        if !(1..=5).contains(&value) {
            return Err(AppError::InvalidRating(value));
        }

        let recipe = self.store.get_or_fetch(external_id).await?;
        let review = review
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let rating = self
            .repo
            .upsert_rating(user_id, recipe.id, value, review)
            .await?;
        tracing::debug!("User {} rated recipe {} as {}", user_id, external_id, value);
        Ok(rating)
    }

    /// Mean of every rating on `recipe`, 0 when there are none.
    pub async fn average_rating(&self, recipe: &Recipe) -> Result<f64> {
        let (count, sum) = self.repo.rating_totals(recipe.id).await?;
        Ok(average(count, sum))
    }

    pub async fn ratings(&self, external_id: i64) -> Result<RecipeRatings> {
        let Some(recipe) = self.store.find(external_id).await? else {
            return Ok(RecipeRatings {
                ratings: Vec::new(),
                average: 0.0,
            });
        };

        let ratings = self.repo.ratings_for_recipe(recipe.id).await?;
        let average = self.average_rating(&recipe).await?;
        Ok(RecipeRatings { ratings, average })
    }
}
