use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{Difficulty, NewUser, Nutrition, Recipe, RecipeData, User, UserId};

use super::schema::SCHEMA;

/// Recipe columns plus the rating count and sum used for `average_rating`.
pub(super) const RECIPE_SELECT: &str = r#"
    SELECT r.id, r.external_id, r.title, r.image_url, r.ready_in_minutes, r.servings,
           r.summary, r.instructions, r.ingredients, r.cuisine_types, r.meal_types,
           r.dietary_info, r.calories, r.protein, r.carbs, r.fat, r.difficulty,
           r.created_at, r.updated_at,
           (SELECT COUNT(*) FROM ratings WHERE recipe_id = r.id),
           (SELECT COALESCE(SUM(value), 0) FROM ratings WHERE recipe_id = r.id)
    FROM recipes r"#;

const USER_SELECT: &str = "SELECT id, username, email, created_at FROM users";

enum UserInsert {
    Created(User),
    UsernameTaken,
    EmailTaken,
}

#[derive(Clone)]
pub struct Repository {
    pub(super) conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Recipe operations

    pub async fn find_recipe(&self, external_id: i64) -> Result<Option<Recipe>> {
        let recipe = self
            .conn
            .call(move |conn| {
                let recipe = conn
                    .query_row(
                        &format!("{RECIPE_SELECT} WHERE r.external_id = ?1"),
                        params![external_id],
                        recipe_from_row,
                    )
                    .optional()?;
                Ok(recipe)
            })
            .await?;
        Ok(recipe)
    }

    /// Insert `recipe` unless its external id is already stored, then return
    /// whichever row is canonical. Runs as one call on the connection thread,
    /// so concurrent callers for the same id all observe the same row.
    pub async fn insert_recipe_or_get(&self, recipe: RecipeData) -> Result<(Recipe, bool)> {
        let ingredients = serde_json::to_string(&recipe.ingredients)?;
        let cuisine_types = serde_json::to_string(&recipe.cuisine_types)?;
        let meal_types = serde_json::to_string(&recipe.meal_types)?;
        let dietary_info = serde_json::to_string(&recipe.dietary_info)?;

        let result = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO recipes (external_id, title, image_url, ready_in_minutes, servings,
                                            summary, instructions, ingredients, cuisine_types, meal_types,
                                            dietary_info, calories, protein, carbs, fat, difficulty)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                       ON CONFLICT(external_id) DO NOTHING"#,
                    params![
                        recipe.external_id,
                        recipe.title,
                        recipe.image_url,
                        recipe.ready_in_minutes,
                        recipe.servings.max(1),
                        recipe.summary,
                        recipe.instructions,
                        ingredients,
                        cuisine_types,
                        meal_types,
                        dietary_info,
                        recipe.nutrition.calories,
                        recipe.nutrition.protein,
                        recipe.nutrition.carbs,
                        recipe.nutrition.fat,
                        recipe.difficulty.as_str(),
                    ],
                )?;
                let inserted = conn.changes() > 0;

                let stored = conn.query_row(
                    &format!("{RECIPE_SELECT} WHERE r.external_id = ?1"),
                    params![recipe.external_id],
                    recipe_from_row,
                )?;
                Ok((stored, inserted))
            })
            .await?;
        Ok(result)
    }

    pub async fn recipe_count(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    // User operations

    pub async fn insert_user(&self, user: NewUser) -> Result<User> {
        let outcome = self
            .conn
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                    params![user.username, user.email, user.password_hash],
                );
                match inserted {
                    Ok(_) => {}
                    Err(rusqlite::Error::SqliteFailure(err, Some(msg)))
                        if err.code == ErrorCode::ConstraintViolation =>
                    {
                        return Ok(if msg.contains("users.email") {
                            UserInsert::EmailTaken
                        } else {
                            UserInsert::UsernameTaken
                        });
                    }
                    Err(e) => return Err(e.into()),
                }

                let id = conn.last_insert_rowid();
                let created = conn.query_row(
                    &format!("{USER_SELECT} WHERE id = ?1"),
                    params![id],
                    user_from_row,
                )?;
                Ok(UserInsert::Created(created))
            })
            .await?;

        match outcome {
            UserInsert::Created(user) => Ok(user),
            UserInsert::UsernameTaken => Err(AppError::UsernameTaken),
            UserInsert::EmailTaken => Err(AppError::EmailTaken),
        }
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        &format!("{USER_SELECT} WHERE id = ?1"),
                        params![id],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    /// The user together with their stored password hash.
    pub async fn find_credentials(&self, username: String) -> Result<Option<(User, String)>> {
        let found = self
            .conn
            .call(move |conn| {
                let found = conn
                    .query_row(
                        "SELECT id, username, email, created_at, password_hash FROM users WHERE username = ?1",
                        params![username],
                        |row| Ok((user_from_row(row)?, row.get::<_, String>(4)?)),
                    )
                    .optional()?;
                Ok(found)
            })
            .await?;
        Ok(found)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
                Ok(n > 0)
            })
            .await?;
        Ok(deleted)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

pub(super) fn datetime_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_datetime(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("bad timestamp {text:?}").into())
    })
}

pub(super) fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn average(count: i64, sum: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

pub(super) fn recipe_from_row(row: &Row) -> rusqlite::Result<Recipe> {
    let ready_in_minutes: u32 = row.get(4)?;
    let difficulty = row
        .get::<_, String>(16)
        .ok()
        .and_then(|s| Difficulty::parse(&s))
        .unwrap_or_else(|| Difficulty::from_ready_minutes(ready_in_minutes));

    Ok(Recipe {
        id: row.get(0)?,
        data: RecipeData {
            external_id: row.get(1)?,
            title: row.get(2)?,
            image_url: row.get(3)?,
            ready_in_minutes,
            servings: row.get(5)?,
            summary: row.get(6)?,
            instructions: row.get(7)?,
            ingredients: json_column(row, 8)?,
            cuisine_types: json_column(row, 9)?,
            meal_types: json_column(row, 10)?,
            dietary_info: json_column(row, 11)?,
            nutrition: Nutrition {
                calories: row.get(12)?,
                protein: row.get(13)?,
                carbs: row.get(14)?,
                fat: row.get(15)?,
            },
            difficulty,
            average_rating: average(row.get(19)?, row.get(20)?),
        },
        created_at: datetime_column(row, 17)?,
        updated_at: datetime_column(row, 18)?,
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        created_at: datetime_column(row, 3)?,
    })
}
