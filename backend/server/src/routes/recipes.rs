use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use entity::{recipe, user};

use crate::{
    auth::{CurrentUser, MaybeUser},
    error::AppError,
    payloads::{RecipeCreate, RecipeFilter, RecipeShort, RecipeUpdate},
    state::AppState,
    store::{self, RecipeList},
};

fn ensure_author(user: &user::Model, recipe: &recipe::Model) -> Result<(), AppError> {
    if recipe.author_id != user.id {
        return Err(AppError::Forbidden);
    }

    Ok(())
}

pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = RecipeFilter::from_pairs(pairs)?;
    let recipes = store::filter_recipes(&state.db, viewer.as_ref(), &filter).await?;

    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(store::recipe_view(&state.db, viewer.as_ref(), recipe).await?);
    }

    Ok(Json(views))
}

pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RecipeCreate>,
) -> Result<impl IntoResponse, AppError> {
    let recipe =
        store::create_recipe(&state.db, &user, payload, state.config.short_link_length).await?;
    let view = store::recipe_view(&state.db, Some(&user), recipe).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = store::find_recipe(&state.db, id).await?;

    Ok(Json(
        store::recipe_view(&state.db, viewer.as_ref(), recipe).await?,
    ))
}

pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<RecipeUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = store::find_recipe(&state.db, id).await?;
    ensure_author(&user, &recipe)?;

    let recipe = store::update_recipe(&state.db, recipe, payload).await?;

    Ok(Json(
        store::recipe_view(&state.db, Some(&user), recipe).await?,
    ))
}

pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = store::find_recipe(&state.db, id).await?;
    ensure_author(&user, &recipe)?;

    store::delete_recipe(&state.db, recipe.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Shared by the favorite and shopping cart endpoints.
pub(crate) async fn add_to_list(
    state: &AppState,
    list: RecipeList,
    user: &user::Model,
    recipe_id: i32,
) -> Result<(StatusCode, Json<RecipeShort>), AppError> {
    let recipe = store::find_recipe(&state.db, recipe_id).await?;
    list.add(&state.db, user.id, recipe.id).await?;

    Ok((StatusCode::CREATED, Json(RecipeShort::from(recipe))))
}

pub(crate) async fn remove_from_list(
    state: &AppState,
    list: RecipeList,
    user: &user::Model,
    recipe_id: i32,
) -> Result<StatusCode, AppError> {
    let recipe = store::find_recipe(&state.db, recipe_id).await?;
    list.remove(&state.db, user.id, recipe.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    add_to_list(&state, RecipeList::Favorites, &user, id).await
}

pub async fn unfavorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    remove_from_list(&state, RecipeList::Favorites, &user, id).await
}
