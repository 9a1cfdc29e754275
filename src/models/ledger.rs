use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub user_id: UserId,
    pub recipe_id: i64,
    pub value: i64,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRatings {
    pub ratings: Vec<Rating>,
    pub average: f64,
}

/// Filter snapshot stored alongside a search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub cuisine: Option<String>,
    pub meal_type: Option<String>,
    pub diet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub user_id: UserId,
    pub query: String,
    pub filters: SearchFilters,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub recipe_external_id: i64,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub original_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub items: Vec<ShoppingItem>,
    pub created_at: DateTime<Utc>,
}
