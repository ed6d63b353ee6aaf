use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub meal_plan_id: String,
    #[serde(default)]
    pub recipe: Option<Recipe>,
}

/// Display data. Scalar fields are kept as the text the server sent, so one
/// odd record never rejects the whole list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipe {
    #[serde(deserialize_with = "display_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "display_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "display_text")]
    pub image_path: Option<String>,
    pub ingredients: Ingredients,
    #[serde(deserialize_with = "display_text")]
    pub prep_time: Option<String>,
    #[serde(deserialize_with = "display_text")]
    pub nutrition_info: Option<String>,
    #[serde(deserialize_with = "display_text")]
    pub cuisine_type: Option<String>,
    #[serde(deserialize_with = "display_text")]
    pub meal_type: Option<String>,
    #[serde(deserialize_with = "display_text")]
    pub ratings_average: Option<String>,
}

fn display_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Ordered ingredient entries, parsed once from the comma separated wire value.
/// Every segment is kept, empty ones included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingredients(Vec<String>);

impl Ingredients {
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|entry| entry.trim().to_owned())
                .collect(),
        )
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ingredients {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for Ingredients {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = display_text(deserializer)?;

        Ok(raw.as_deref().map(Ingredients::parse).unwrap_or_default())
    }
}
