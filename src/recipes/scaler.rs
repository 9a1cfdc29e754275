use crate::models::{Recipe, RecipeData};

/// Serving-adjusted copy of `recipe`. A zero-serving source counts as one.
pub fn scale(recipe: &RecipeData, target_servings: u32) -> RecipeData {
    let multiplier = f64::from(target_servings) / f64::from(recipe.servings.max(1));

    let mut scaled = recipe.clone();
    for ingredient in &mut scaled.ingredients {
        ingredient.amount = round2(ingredient.amount * multiplier);
    }
    scaled.servings = target_servings;
    scaled
}

impl Recipe {
    pub fn scaled(&self, target_servings: u32) -> Recipe {
        Recipe {
            data: scale(&self.data, target_servings),
            ..self.clone()
        }
    }
}

/// Two decimal places, ties to even (0.125 becomes 0.12).
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
