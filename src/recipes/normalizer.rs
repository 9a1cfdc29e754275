use serde_json::Value;
use thiserror::Error;

use crate::models::{Difficulty, Ingredient, Nutrition, RecipeData, DEFAULT_READY_MINUTES};
use crate::source::{RawIngredient, RawInstructionGroup, RawNutrient, RawRecipe};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Normalization failed: {0}")]
    NormalizationFailed(String),
}

/// Turn one provider payload into canonical recipe content.
pub fn normalize(payload: Value) -> Result<RecipeData, NormalizeError> {
    RawRecipe::parse(payload).map(normalize_raw)
}

pub fn normalize_raw(raw: RawRecipe) -> RecipeData {
    let ready_in_minutes = raw
        .ready_in_minutes
        .map(|m| m.clamp(0, u32::MAX as i64) as u32)
        .unwrap_or(DEFAULT_READY_MINUTES);

    let servings = raw
        .servings
        .map(|s| s.clamp(1, u32::MAX as i64) as u32)
        .unwrap_or(1);

    let dietary_info = dietary_tags(&raw);

    RecipeData {
        external_id: raw.id,
        title: raw.title.unwrap_or_default(),
        image_url: raw.image.unwrap_or_default(),
        ready_in_minutes,
        servings,
        summary: raw.summary.unwrap_or_default(),
        instructions: instructions(raw.instructions, raw.analyzed_instructions.as_deref()),
        ingredients: raw
            .extended_ingredients
            .unwrap_or_default()
            .into_iter()
            .map(ingredient)
            .collect(),
        cuisine_types: raw.cuisines.unwrap_or_default(),
        meal_types: raw.dish_types.unwrap_or_default(),
        dietary_info,
        nutrition: nutrition(raw.nutrition.and_then(|n| n.nutrients).as_deref()),
        difficulty: Difficulty::from_ready_minutes(ready_in_minutes),
        average_rating: 0.0,
    }
}

fn dietary_tags(raw: &RawRecipe) -> Vec<String> {
    [
        (raw.vegetarian, "vegetarian"),
        (raw.vegan, "vegan"),
        (raw.gluten_free, "gluten-free"),
        (raw.dairy_free, "dairy-free"),
    ]
    .into_iter()
    .filter(|(flag, _)| flag.unwrap_or(false))
    .map(|(_, tag)| tag.to_string())
    .collect()
}

fn ingredient(raw: RawIngredient) -> Ingredient {
    let amount = raw.amount.filter(|a| a.is_finite()).unwrap_or(0.0).max(0.0);
    Ingredient {
        name: raw.name.unwrap_or_default(),
        amount,
        unit: raw.unit.unwrap_or_default(),
        original_text: raw.original.unwrap_or_default(),
    }
}

fn instructions(flat: Option<String>, groups: Option<&[RawInstructionGroup]>) -> String {
    if let Some(text) = flat.filter(|t| !t.is_empty()) {
        return text;
    }

    groups
        .unwrap_or_default()
        .iter()
        .flat_map(|group| group.steps.as_deref().unwrap_or_default())
        .map(|step| format!("{}. {}", step.number, step.step))
        .collect::<Vec<_>>()
        .join("\n")
}

// Exact, case-sensitive names as the provider reports them.
fn nutrition(nutrients: Option<&[RawNutrient]>) -> Nutrition {
    let nutrients = nutrients.unwrap_or_default();
    let find = |name: &str| {
        nutrients
            .iter()
            .find(|n| n.name.as_deref() == Some(name))
            .map(|n| n.amount.max(0.0))
            .unwrap_or(0.0)
    };

    Nutrition {
        calories: find("Calories"),
        protein: find("Protein"),
        carbs: find("Carbohydrates"),
        fat: find("Fat"),
    }
}
