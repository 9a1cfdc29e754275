use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Value};

use super::{RecipeSource, SearchParams, SourceError};

/// In-memory provider for tests.
#[derive(Default)]
pub struct FakeSource {
    details: Mutex<HashMap<i64, Value>>,
    instructions: Mutex<HashMap<i64, Value>>,
    search_results: Mutex<Vec<Value>>,
    unavailable: AtomicBool,
    detail_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipe(self, external_id: i64, payload: Value) -> Self {
        self.set_details(external_id, payload);
        self
    }

    pub fn set_details(&self, external_id: i64, payload: Value) {
        self.details.lock().unwrap().insert(external_id, payload);
    }

    pub fn set_instructions(&self, external_id: i64, payload: Value) {
        self.instructions.lock().unwrap().insert(external_id, payload);
    }

    pub fn set_search_results(&self, results: Vec<Value>) {
        *self.search_results.lock().unwrap() = results;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), SourceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(SourceError::Status(503))
        } else {
            Ok(())
        }
    }
}

impl RecipeSource for FakeSource {
    async fn search(&self, _params: &SearchParams) -> Result<Vec<Value>, SourceError> {
        tokio::task::yield_now().await;
        self.check_available()?;
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn fetch_details(&self, external_id: i64) -> Result<Value, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_available()?;
        self.details
            .lock()
            .unwrap()
            .get(&external_id)
            .cloned()
            .ok_or(SourceError::Status(404))
    }

    async fn fetch_instructions(&self, external_id: i64) -> Result<Value, SourceError> {
        self.check_available()?;
        self.instructions
            .lock()
            .unwrap()
            .get(&external_id)
            .cloned()
            .ok_or(SourceError::Status(404))
    }
}

/// A detail payload shaped like the provider's `/information` response.
pub fn recipe_payload(
    external_id: i64,
    title: &str,
    servings: u32,
    ingredients: &[(&str, f64, &str)],
) -> Value {
    let ingredients: Vec<Value> = ingredients
        .iter()
        .map(|(name, amount, unit)| {
            json!({
                "name": name,
                "amount": amount,
                "unit": unit,
                "original": format!("{amount} {unit} {name}"),
            })
        })
        .collect();

    json!({
        "id": external_id,
        "title": title,
        "image": format!("https://img.example/{external_id}.jpg"),
        "readyInMinutes": 25,
        "servings": servings,
        "summary": format!("A <b>{title}</b>."),
        "instructions": "Cook it.",
        "extendedIngredients": ingredients,
        "cuisines": ["Italian"],
        "dishTypes": ["main course"],
        "vegetarian": true,
        "vegan": false,
        "glutenFree": false,
        "dairyFree": true,
        "nutrition": {
            "nutrients": [
                {"name": "Calories", "amount": 420.5, "unit": "kcal"},
                {"name": "Fat", "amount": 12.0, "unit": "g"},
                {"name": "Protein", "amount": 18.25, "unit": "g"}
            ]
        }
    })
}
