use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ready time assumed when the provider omits `readyInMinutes`.
pub const DEFAULT_READY_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_ready_minutes(minutes: u32) -> Self {
        if minutes <= 20 {
            Difficulty::Easy
        } else if minutes <= 45 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub original_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Normalized recipe content, independent of whether it has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeData {
    pub external_id: i64,
    pub title: String,
    pub image_url: String,
    pub ready_in_minutes: u32,
    pub servings: u32,
    pub summary: String,
    pub instructions: String,
    pub ingredients: Vec<Ingredient>,
    pub cuisine_types: Vec<String>,
    pub meal_types: Vec<String>,
    pub dietary_info: Vec<String>,
    pub nutrition: Nutrition,
    pub difficulty: Difficulty,
    pub average_rating: f64,
}

/// The canonical stored record for one external id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    #[serde(flatten)]
    pub data: RecipeData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn external_id(&self) -> i64 {
        self.data.external_id
    }
}
