//! Menu items and their wire representations.
//!
//! A drink's recipe is stored as an encoded JSON string and exposed in two
//! forms: the short form hides ingredient names, the long form shows them.

use serde::{Deserialize, Serialize};

/// One ingredient of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePart {
    pub name: String,
    pub color: String,
    pub parts: i64,
}

/// A stored drink, serialized in its long form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<RecipePart>,
}

/// A drink to be inserted, or the new contents of an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<RecipePart>,
}

/// Ingredient as shown to anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortPart {
    pub color: String,
    pub parts: i64,
}

/// A drink as shown to anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortPart>,
}

impl MenuItem {
    /// The short form of this drink.
    #[must_use]
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|part| ShortPart {
                    color: part.color.clone(),
                    parts: part.parts,
                })
                .collect(),
        }
    }
}

/// Error returned when a stored recipe cannot be encoded or decoded.
#[derive(Debug)]
pub struct RecipeError(serde_json::Error);

impl std::fmt::Display for RecipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid recipe encoding: {}", self.0)
    }
}

impl std::error::Error for RecipeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Encode a recipe for storage.
///
/// # Errors
/// Returns `RecipeError` if serialization fails.
pub fn encode_recipe(recipe: &[RecipePart]) -> Result<String, RecipeError> {
    serde_json::to_string(recipe).map_err(RecipeError)
}

/// Decode a stored recipe.
///
/// # Errors
/// Returns `RecipeError` if the text is not an encoded recipe.
pub fn decode_recipe(encoded: &str) -> Result<Vec<RecipePart>, RecipeError> {
    serde_json::from_str(encoded).map_err(RecipeError)
}

/// Recipe as accepted in a request body: one part or a list of parts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<RecipePart>),
    One(RecipePart),
}

impl From<RecipeInput> for Vec<RecipePart> {
    fn from(input: RecipeInput) -> Self {
        match input {
            RecipeInput::Many(parts) => parts,
            RecipeInput::One(part) => vec![part],
        }
    }
}

/// Body of a create or update request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrinkPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

impl DrinkPayload {
    /// Turn the payload into a drink, if both fields are present.
    ///
    /// Returns `None` when the title is missing or empty, or the recipe is
    /// missing. A whitespace-only title is still a title.
    #[must_use]
    pub fn into_new_drink(self) -> Option<NewDrink> {
        let title = self.title.filter(|title| !title.is_empty())?;
        let recipe = self.recipe?.into();
        Some(NewDrink { title, recipe })
    }
}
