use rusqlite::{params, OptionalExtension, Row};

use crate::error::{AppError, Result};
use crate::models::{
    Rating, Recipe, SearchFilters, SearchHistoryEntry, ShoppingItem, ShoppingList, UserId,
};

use super::repository::{datetime_column, json_column, recipe_from_row, RECIPE_SELECT};
use super::Repository;

const RATING_SELECT: &str =
    "SELECT id, user_id, recipe_id, value, review, created_at, updated_at FROM ratings";
const HISTORY_SELECT: &str =
    "SELECT id, user_id, query, cuisine_filter, meal_type_filter, dietary_filter, created_at FROM search_history";
const SHOPPING_SELECT: &str = "SELECT id, user_id, name, items, created_at FROM shopping_lists";

impl Repository {
    // Favorite operations

    /// Returns false when the pair already exists.
    pub async fn insert_favorite(&self, user_id: UserId, recipe_id: i64) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "INSERT OR IGNORE INTO favorites (user_id, recipe_id) VALUES (?1, ?2)",
                    params![user_id, recipe_id],
                )?;
                Ok(n > 0)
            })
            .await
            .map_err(unknown_user)?;
        Ok(inserted)
    }

    pub async fn delete_favorite(&self, user_id: UserId, recipe_id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM favorites WHERE user_id = ?1 AND recipe_id = ?2",
                    params![user_id, recipe_id],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn favorite_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>> {
        let recipes = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{RECIPE_SELECT} JOIN favorites f ON f.recipe_id = r.id WHERE f.user_id = ?1 ORDER BY f.id"
                ))?;
                let recipes = stmt
                    .query_map(params![user_id], recipe_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(recipes)
            })
            .await?;
        Ok(recipes)
    }

    // Rating operations

    pub async fn upsert_rating(
        &self,
        user_id: UserId,
        recipe_id: i64,
        value: i64,
        review: Option<String>,
    ) -> Result<Rating> {
        let rating = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO ratings (user_id, recipe_id, value, review)
                       VALUES (?1, ?2, ?3, ?4)
                       ON CONFLICT(user_id, recipe_id) DO UPDATE SET
                           value = excluded.value,
                           review = excluded.review,
                           updated_at = datetime('now')"#,
                    params![user_id, recipe_id, value, review],
                )?;
                let rating = conn.query_row(
                    &format!("{RATING_SELECT} WHERE user_id = ?1 AND recipe_id = ?2"),
                    params![user_id, recipe_id],
                    rating_from_row,
                )?;
                Ok(rating)
            })
            .await
            .map_err(unknown_user)?;
        Ok(rating)
    }

    pub async fn ratings_for_recipe(&self, recipe_id: i64) -> Result<Vec<Rating>> {
        let ratings = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("{RATING_SELECT} WHERE recipe_id = ?1 ORDER BY id"))?;
                let ratings = stmt
                    .query_map(params![recipe_id], rating_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(ratings)
            })
            .await?;
        Ok(ratings)
    }

    /// (count, sum) of rating values for one recipe.
    pub async fn rating_totals(&self, recipe_id: i64) -> Result<(i64, i64)> {
        let totals = self
            .conn
            .call(move |conn| {
                let totals = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(value), 0) FROM ratings WHERE recipe_id = ?1",
                    params![recipe_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(totals)
            })
            .await?;
        Ok(totals)
    }

    // Search history

    /// Append an entry and evict everything but the newest `keep` rows for
    /// the user. Eviction follows insertion order, never timestamps.
    pub async fn append_search(
        &self,
        user_id: UserId,
        query: String,
        filters: SearchFilters,
        keep: usize,
    ) -> Result<SearchHistoryEntry> {
        let entry = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    r#"INSERT INTO search_history (user_id, query, cuisine_filter, meal_type_filter, dietary_filter)
                       VALUES (?1, ?2, ?3, ?4, ?5)"#,
                    params![user_id, query, filters.cuisine, filters.meal_type, filters.diet],
                )?;
                let id = tx.last_insert_rowid();
                tx.execute(
                    r#"DELETE FROM search_history
                       WHERE user_id = ?1 AND id NOT IN (
                           SELECT id FROM search_history WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2
                       )"#,
                    params![user_id, keep as i64],
                )?;
                let entry = tx.query_row(
                    &format!("{HISTORY_SELECT} WHERE id = ?1"),
                    params![id],
                    history_from_row,
                )?;
                tx.commit()?;
                Ok(entry)
            })
            .await
            .map_err(unknown_user)?;
        Ok(entry)
    }

    pub async fn search_history(&self, user_id: UserId) -> Result<Vec<SearchHistoryEntry>> {
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("{HISTORY_SELECT} WHERE user_id = ?1 ORDER BY id"))?;
                let entries = stmt
                    .query_map(params![user_id], history_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    // Shopping lists

    pub async fn insert_shopping_list(
        &self,
        user_id: UserId,
        name: String,
        items: Vec<ShoppingItem>,
    ) -> Result<ShoppingList> {
        let items_json = serde_json::to_string(&items)?;
        let list = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO shopping_lists (user_id, name, items) VALUES (?1, ?2, ?3)",
                    params![user_id, name, items_json],
                )?;
                let id = conn.last_insert_rowid();
                let list = conn.query_row(
                    &format!("{SHOPPING_SELECT} WHERE id = ?1"),
                    params![id],
                    shopping_list_from_row,
                )?;
                Ok(list)
            })
            .await
            .map_err(unknown_user)?;
        Ok(list)
    }

    pub async fn shopping_lists(&self, user_id: UserId) -> Result<Vec<ShoppingList>> {
        let lists = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("{SHOPPING_SELECT} WHERE user_id = ?1 ORDER BY id"))?;
                let lists = stmt
                    .query_map(params![user_id], shopping_list_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(lists)
            })
            .await?;
        Ok(lists)
    }

    pub async fn shopping_list(&self, user_id: UserId, id: i64) -> Result<Option<ShoppingList>> {
        let list = self
            .conn
            .call(move |conn| {
                let list = conn
                    .query_row(
                        &format!("{SHOPPING_SELECT} WHERE id = ?1 AND user_id = ?2"),
                        params![id, user_id],
                        shopping_list_from_row,
                    )
                    .optional()?;
                Ok(list)
            })
            .await?;
        Ok(list)
    }

    pub async fn delete_shopping_list(&self, user_id: UserId, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM shopping_lists WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(deleted)
    }
}

/// A foreign-key failure on a user-owned insert means the user row is gone,
/// which callers treat the same as a missing session.
fn unknown_user(err: tokio_rusqlite::Error) -> AppError {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            AppError::Unauthorized
        }
        other => AppError::Database(other),
    }
}

fn rating_from_row(row: &Row) -> rusqlite::Result<Rating> {
    Ok(Rating {
        id: row.get(0)?,
        user_id: row.get(1)?,
        recipe_id: row.get(2)?,
        value: row.get(3)?,
        review: row.get(4)?,
        created_at: datetime_column(row, 5)?,
        updated_at: datetime_column(row, 6)?,
    })
}

fn history_from_row(row: &Row) -> rusqlite::Result<SearchHistoryEntry> {
    Ok(SearchHistoryEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        query: row.get(2)?,
        filters: SearchFilters {
            cuisine: row.get(3)?,
            meal_type: row.get(4)?,
            diet: row.get(5)?,
        },
        created_at: datetime_column(row, 6)?,
    })
}

fn shopping_list_from_row(row: &Row) -> rusqlite::Result<ShoppingList> {
    Ok(ShoppingList {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        items: json_column(row, 3)?,
        created_at: datetime_column(row, 4)?,
    })
}
