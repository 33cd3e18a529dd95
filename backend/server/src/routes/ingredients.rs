use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use entity::ingredient;
use sea_orm::EntityTrait;

use crate::{error::AppError, payloads::IngredientQuery, state::AppState, store};

/// `?name=` narrows the list to names starting with the given prefix, ignoring case.
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ingredients = store::search_ingredients(&state.db, query.name.as_deref()).await?;

    Ok(Json(ingredients))
}

pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let ingredient = ingredient::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(ingredient))
}
