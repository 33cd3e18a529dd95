use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

pub mod ingredients;
pub mod links;
pub mod recipes;
pub mod shopping;
pub mod tags;
pub mod users;

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/", get(users::list_users).post(users::create_user))
        .route("/api/users/me/", get(users::me))
        .route("/api/users/set_password/", post(users::set_password))
        .route("/api/users/subscriptions/", get(users::subscriptions))
        .route("/api/users/{id}/", get(users::get_user))
        .route(
            "/api/users/{id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/api/tags/", get(tags::list_tags))
        .route("/api/tags/{id}/", get(tags::get_tag))
        .route("/api/ingredients/", get(ingredients::list_ingredients))
        .route("/api/ingredients/{id}/", get(ingredients::get_ingredient))
        .route(
            "/api/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/api/recipes/download_shopping_cart/",
            get(shopping::download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route("/api/recipes/{id}/get-link/", get(links::get_link))
        .route(
            "/api/recipes/{id}/favorite/",
            post(recipes::favorite).delete(recipes::unfavorite),
        )
        .route(
            "/api/recipes/{id}/shopping_cart/",
            post(shopping::add_to_cart).delete(shopping::remove_from_cart),
        )
        .route("/s/{token}", get(links::redirect))
}
