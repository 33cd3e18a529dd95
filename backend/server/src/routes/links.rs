use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use sea_orm::TransactionTrait;

use crate::{
    error::AppError,
    payloads::ShortLink,
    short_link::{ensure_short_link, generate_token},
    state::AppState,
    store,
};

pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = store::find_recipe(&state.db, id).await?;

    let token = match recipe.short_link {
        Some(token) => token,
        None => {
            let length = state.config.short_link_length;
            let txn = state.db.begin().await?;
            let recipe = ensure_short_link(&txn, recipe, || generate_token(length)).await?;
            txn.commit().await?;

            recipe.short_link.ok_or(AppError::ShortLinkExhausted)?
        }
    };

    Ok(Json(ShortLink {
        short_link: state.short_link_url(&token),
    }))
}

pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = store::find_recipe_by_short_link(&state.db, &token).await?;

    Ok((StatusCode::FOUND, [(LOCATION, state.recipe_url(recipe.id))]))
}
