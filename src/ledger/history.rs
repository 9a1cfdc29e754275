use crate::error::Result;
use crate::models::{SearchFilters, SearchHistoryEntry, UserId};
use crate::source::RecipeSource;

use super::{require_user, Ledger};

pub const SEARCH_HISTORY_LIMIT: usize = 20;

impl<S: RecipeSource> Ledger<S> {
    /// Append a search for a signed-in user, keeping only their newest
    /// entries. Anonymous or empty searches are not recorded.
    pub async fn record_search(
        &self,
        user: Option<UserId>,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Option<SearchHistoryEntry>> {
        let Some(user_id) = user else {
            return Ok(None);
        };
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let entry = self
            .repo
            .append_search(user_id, query.to_string(), filters.clone(), SEARCH_HISTORY_LIMIT)
            .await?;
        Ok(Some(entry))
    }

    /// Retained searches, oldest first.
    pub async fn history(&self, user: Option<UserId>) -> Result<Vec<SearchHistoryEntry>> {
        let user_id = require_user(user)?;
        self.repo.search_history(user_id).await
    }
}
