//! # Entities
//!
//! Relational schema of the recipe platform.
//!
//! ## Tables
//!
//! - `users`, `auth_tokens`, `follows`: accounts, externally issued tokens, subscriptions
//! - `tags`, `ingredients`: read-only catalogues loaded by the `loader` CLI
//! - `recipes`, `recipe_tags`, `recipe_ingredients`: recipes and their lines
//! - `favorites`, `shopping_carts`: per-user recipe memberships
//!
//! Join tables use composite primary keys so the (left, right) pair is unique at the
//! storage layer. Every foreign key cascades on delete.
//!
//! ## Short links
//!
//! `recipes.short_link` carries a unique constraint. It is the backstop for concurrent
//! assignment, the application-level exists check alone is not enough.

pub mod auth_token;
pub mod favorite;
pub mod follow;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod schema;
pub mod shopping_cart;
pub mod tag;
pub mod user;

pub use schema::setup_schema;
