use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::recipes::NormalizeError;

/// Structured view of a provider payload. Every field is optional because the
/// provider omits whatever it likes; only the id is checked up front.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecipe {
    #[serde(skip)]
    pub id: i64,
    pub title: Option<String>,
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub ready_in_minutes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub servings: Option<i64>,
    pub summary: Option<String>,
    pub instructions: Option<String>,
    pub extended_ingredients: Option<Vec<RawIngredient>>,
    pub cuisines: Option<Vec<String>>,
    pub dish_types: Option<Vec<String>>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub gluten_free: Option<bool>,
    pub dairy_free: Option<bool>,
    pub nutrition: Option<RawNutrition>,
    pub analyzed_instructions: Option<Vec<RawInstructionGroup>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIngredient {
    pub name: Option<String>,
    /// Free-text amounts like "a pinch" read as absent.
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNutrition {
    pub nutrients: Option<Vec<RawNutrient>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNutrient {
    pub name: Option<String>,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInstructionGroup {
    pub steps: Option<Vec<RawStep>>,
}

/// Both fields are mandatory; a step without them is a structural error.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    pub number: i64,
    pub step: String,
}

impl RawRecipe {
    pub fn parse(value: Value) -> Result<Self, NormalizeError> {
        let id = value
            .get("id")
            .and_then(integer_like)
            .ok_or_else(|| match value.get("id") {
                None | Some(Value::Null) => {
                    NormalizeError::MalformedPayload("missing id".to_string())
                }
                Some(other) => NormalizeError::MalformedPayload(format!("id {other} is not an integer")),
            })?;

        let mut raw: RawRecipe = serde_json::from_value(value)
            .map_err(|e| NormalizeError::NormalizationFailed(e.to_string()))?;
        raw.id = id;
        Ok(raw)
    }
}

fn integer_like(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(integer_like))
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_like))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_or_null_id_is_malformed() {
        for payload in [json!({"title": "Soup"}), json!({"id": null}), json!([1, 2])] {
            let err = RawRecipe::parse(payload).unwrap_err();
            assert!(matches!(err, NormalizeError::MalformedPayload(_)), "{err:?}");
        }
    }

    #[test]
    fn non_integer_id_is_malformed() {
        for payload in [json!({"id": "abc"}), json!({"id": 1.5}), json!({"id": true})] {
            let err = RawRecipe::parse(payload).unwrap_err();
            assert!(matches!(err, NormalizeError::MalformedPayload(_)), "{err:?}");
        }
    }

    #[test]
    fn integer_like_ids_are_accepted() {
        assert_eq!(RawRecipe::parse(json!({"id": 42})).unwrap().id, 42);
        assert_eq!(RawRecipe::parse(json!({"id": 42.0})).unwrap().id, 42);
        assert_eq!(RawRecipe::parse(json!({"id": " 42 "})).unwrap().id, 42);
    }

    #[test]
    fn wrong_field_type_fails_normalization() {
        let err = RawRecipe::parse(json!({"id": 1, "extendedIngredients": "flour"})).unwrap_err();
        assert!(matches!(err, NormalizeError::NormalizationFailed(_)));

        let err = RawRecipe::parse(json!({
            "id": 1,
            "analyzedInstructions": [{"steps": [{"number": 1}]}]
        }))
        .unwrap_err();
        assert!(matches!(err, NormalizeError::NormalizationFailed(_)));
    }

    #[test]
    fn provider_field_names_are_mapped() {
        let raw = RawRecipe::parse(json!({
            "id": 7,
            "readyInMinutes": 15,
            "glutenFree": true,
            "dishTypes": ["lunch"],
            "extendedIngredients": [{"name": "egg", "amount": 2}]
        }))
        .unwrap();
        assert_eq!(raw.ready_in_minutes, Some(15));
        assert_eq!(raw.gluten_free, Some(true));
        assert_eq!(raw.dish_types, Some(vec!["lunch".to_string()]));
        assert_eq!(raw.extended_ingredients.unwrap()[0].amount, Some(2.0));
    }

    #[test]
    fn loose_numeric_fields_are_read_leniently() {
        let raw = RawRecipe::parse(json!({
            "id": 8,
            "readyInMinutes": 25.0,
            "servings": "4",
            "extendedIngredients": [
                {"name": "salt", "amount": "a pinch"},
                {"name": "milk", "amount": " 0.5 "},
                {"name": "pepper", "amount": null}
            ]
        }))
        .unwrap();
        assert_eq!(raw.ready_in_minutes, Some(25));
        assert_eq!(raw.servings, Some(4));
        let amounts: Vec<Option<f64>> = raw
            .extended_ingredients
            .unwrap()
            .iter()
            .map(|i| i.amount)
            .collect();
        assert_eq!(amounts, vec![None, Some(0.5), None]);
    }

    #[test]
    fn fractional_ready_time_reads_as_absent() {
        let raw = RawRecipe::parse(json!({"id": 9, "readyInMinutes": 12.5})).unwrap();
        assert_eq!(raw.ready_in_minutes, None);
    }
}
