//! # Payloads
//!
//! Requests/responses between the frontend and the backend. JSON unless noted.
//!
//! ## Verification
//! Headers
//! - Authorization: `Token <key>`, key issued by the auth provider
//!
//! Missing header means an anonymous request. A header with an unknown key is rejected
//! with 401 even on public endpoints, so a stale frontend token is noticed early.
//!
//! ## Recipes
//! To backend
//! - name, text, cooking_time (minutes, at least 1)
//! - ingredients: list of `{id, amount}`, amount at least 1, ids must not repeat
//! - tags: list of tag ids, must not repeat
//!
//! From backend
//! - Full recipe with nested author, tags and ingredient lines
//! - `is_favorited`, `is_in_shopping_cart` relative to the requesting user, false if anonymous
//!
//! ## Shopping list
//! From backend
//! - `text/plain` attachment named `shopping-list.txt`
//!
//! ## Short links
//! - `get-link` returns `{"short-link": "<public url>/s/<token>"}`
//! - `/s/<token>` answers with `302 Found` to the recipe page
use serde::{Deserialize, Serialize};

use entity::{ingredient, recipe, tag, user};

use crate::{error::AppError, utils::parse_flag};

#[derive(Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCreated {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for UserCreated {
    fn from(user: user::Model) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: user::Model, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Deserialize)]
pub struct PasswordChange {
    pub new_password: String,
    pub current_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: u64,
}

#[derive(Deserialize, Default)]
pub struct SubscriptionsQuery {
    pub recipes_limit: Option<u64>,
}

#[derive(Deserialize, Default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

#[derive(Deserialize)]
pub struct RecipeCreate {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Partial update. Tags and ingredients are replaced wholesale and stay required.
#[derive(Deserialize)]
pub struct RecipeUpdate {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeIngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl RecipeIngredientView {
    pub fn new(ingredient: ingredient::Model, amount: i32) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeView {
    pub id: i32,
    pub tags: Vec<tag::Model>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeShort {
    pub id: i32,
    pub name: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for RecipeShort {
    fn from(recipe: recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortLink {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

/// Filters accepted by the recipe list, parsed from repeated query pairs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeFilter {
    /// Unknown keys are ignored, `tags` may repeat.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut filter = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "author" => {
                    let author = value
                        .parse()
                        .map_err(|_| AppError::malformed("author must be a user id"))?;
                    filter.author = Some(author);
                }
                "tags" => filter.tags.push(value),
                "is_favorited" => filter.is_favorited = Some(flag(&key, &value)?),
                "is_in_shopping_cart" => filter.is_in_shopping_cart = Some(flag(&key, &value)?),
                _ => {}
            }
        }

        Ok(filter)
    }
}

fn flag(key: &str, value: &str) -> Result<bool, AppError> {
    parse_flag(value)
        .ok_or_else(|| AppError::malformed(format!("{key} must be 0, 1, true or false")))
}
