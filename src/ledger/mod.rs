//! Per-user data that references canonical recipes: favorites, ratings,
//! search history and shopping lists. Uniqueness is enforced by the schema,
//! not by the checks in here.

use std::sync::Arc;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::UserId;
use crate::recipes::RecipeStore;
use crate::source::RecipeSource;

mod favorites;
mod history;
mod ratings;
mod shopping;

pub use history::SEARCH_HISTORY_LIMIT;
pub use shopping::DEFAULT_SHOPPING_LIST_NAME;

pub struct Ledger<S> {
    repo: Repository,
    store: Arc<RecipeStore<S>>,
}

impl<S: RecipeSource> Ledger<S> {
    pub fn new(repo: Repository, store: Arc<RecipeStore<S>>) -> Self {
        Self { repo, store }
    }
}

fn require_user(user: Option<UserId>) -> Result<UserId> {
    user.ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod test_support {
    use super::*;
    use crate::models::NewUser;
    use crate::source::fake::FakeSource;

    pub struct Fixture {
        pub ledger: Ledger<FakeSource>,
        pub store: Arc<RecipeStore<FakeSource>>,
        pub repo: Repository,
    }

    impl Fixture {
        pub async fn new(source: FakeSource) -> Self {
            let repo = Repository::open_in_memory().await.unwrap();
            let store = Arc::new(RecipeStore::new(repo.clone(), source));
            let ledger = Ledger::new(repo.clone(), Arc::clone(&store));
            Self {
                ledger,
                store,
                repo,
            }
        }

        pub async fn user(&self, name: &str) -> UserId {
            self.repo
                .insert_user(NewUser {
                    username: name.to_string(),
                    email: format!("{name}@example.com"),
                    password_hash: "$argon2id$stub".to_string(),
                })
                .await
                .unwrap()
                .id
        }
    }
}
