mod ledger;
mod recipe;
mod user;

pub use ledger::{
    Rating, RecipeRatings, SearchFilters, SearchHistoryEntry, ShoppingItem, ShoppingList,
};
pub use recipe::{Difficulty, Ingredient, Nutrition, Recipe, RecipeData, DEFAULT_READY_MINUTES};
pub use user::{NewUser, User, UserId};
