use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{ShoppingItem, ShoppingList, UserId};
use crate::source::RecipeSource;

use super::{require_user, Ledger};

pub const DEFAULT_SHOPPING_LIST_NAME: &str = "My Shopping List";

// Upstream lookups in flight while resolving one list.
const RESOLVE_CONCURRENCY: usize = 4;

impl<S: RecipeSource> Ledger<S> {
    /// Snapshot the ingredients of `external_ids`, in input order, into a
    /// named list. Ids that cannot be resolved are skipped.
    pub async fn create_shopping_list(
        &self,
        user: Option<UserId>,
        name: &str,
        external_ids: &[i64],
    ) -> Result<ShoppingList> {
        let user_id = require_user(user)?;
        let name = match name.trim() {
            "" => DEFAULT_SHOPPING_LIST_NAME,
            trimmed => trimmed,
        };

        let resolved: Vec<_> = stream::iter(external_ids.iter().copied())
            .map(|id| self.store.get_or_fetch(id))
            .buffered(RESOLVE_CONCURRENCY)
            .collect()
            .await;

        let mut items = Vec::new();
        for (external_id, result) in external_ids.iter().zip(resolved) {
            match result {
                Ok(recipe) => items.extend(recipe.data.ingredients.into_iter().map(|i| {
                    ShoppingItem {
                        recipe_external_id: *external_id,
                        name: i.name,
                        amount: i.amount,
                        unit: i.unit,
                        original_text: i.original_text,
                    }
                })),
                Err(AppError::RecipeNotFound(_)) => {
                    tracing::debug!("Skipping unresolvable recipe {} in shopping list", external_id);
                }
                Err(e) => return Err(e),
            }
        }

        self.repo
            .insert_shopping_list(user_id, name.to_string(), items)
            .await
    }

    pub async fn shopping_lists(&self, user: Option<UserId>) -> Result<Vec<ShoppingList>> {
        let user_id = require_user(user)?;
        self.repo.shopping_lists(user_id).await
    }

    pub async fn shopping_list(&self, user: Option<UserId>, id: i64) -> Result<ShoppingList> {
        let user_id = require_user(user)?;
        self.repo
            .shopping_list(user_id, id)
            .await?
            .ok_or(AppError::ShoppingListNotFound(id))
    }

    pub async fn delete_shopping_list(&self, user: Option<UserId>, id: i64) -> Result<()> {
        let user_id = require_user(user)?;
        if !self.repo.delete_shopping_list(user_id, id).await? {
            return Err(AppError::ShoppingListNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_err;

    use super::*;
    use crate::ledger::test_support::Fixture;
    use crate::source::fake::{recipe_payload, FakeSource};

    fn source() -> FakeSource {
        FakeSource::new()
            .with_recipe(
                1,
                recipe_payload(1, "Pancakes", 2, &[("flour", 200.0, "g"), ("milk", 300.0, "ml")]),
            )
            .with_recipe(2, recipe_payload(2, "Omelette", 1, &[("eggs", 3.0, "")]))
    }

    #[tokio::test]
    async fn unresolvable_ids_are_skipped_in_order() {
        let fx = Fixture::new(source()).await;
        let alice = fx.user("alice").await;

        let list = fx
            .ledger
            .create_shopping_list(Some(alice), "Brunch", &[1, 999, 2])
            .await
            .unwrap();

        assert_eq!(list.name, "Brunch");
        let names: Vec<&str> = list.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["flour", "milk", "eggs"]);
        let sources: Vec<i64> = list.items.iter().map(|i| i.recipe_external_id).collect();
        assert_eq!(sources, vec![1, 1, 2]);
    }

    #[tokio::test]
    async fn snapshot_is_stable() {
        let fx = Fixture::new(source()).await;
        let alice = fx.user("alice").await;

        let created = fx
            .ledger
            .create_shopping_list(Some(alice), "", &[2])
            .await
            .unwrap();
        assert_eq!(created.name, DEFAULT_SHOPPING_LIST_NAME);

        fx.store
            .source()
            .set_details(2, recipe_payload(2, "Omelette", 1, &[("egg whites", 6.0, "")]));

        let fetched = fx.ledger.shopping_list(Some(alice), created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.items[0].name, "eggs");
    }

    #[tokio::test]
    async fn lists_are_owned_by_their_user() {
        let fx = Fixture::new(source()).await;
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;

        let list = fx
            .ledger
            .create_shopping_list(Some(alice), "Week", &[1])
            .await
            .unwrap();

        let err = assert_err!(fx.ledger.shopping_list(Some(bob), list.id).await);
        assert!(matches!(err, AppError::ShoppingListNotFound(_)));
        let err = assert_err!(fx.ledger.delete_shopping_list(Some(bob), list.id).await);
        assert!(matches!(err, AppError::ShoppingListNotFound(_)));

        assert_eq!(fx.ledger.shopping_lists(Some(alice)).await.unwrap().len(), 1);
        fx.ledger
            .delete_shopping_list(Some(alice), list.id)
            .await
            .unwrap();
        assert!(fx.ledger.shopping_lists(Some(alice)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_create_lists() {
        let fx = Fixture::new(source()).await;
        let err = assert_err!(fx.ledger.create_shopping_list(None, "x", &[1]).await);
        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(fx.store.source().detail_calls(), 0);
    }
}
