use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use tracing::debug;

use super::recipes::{add_to_list, remove_from_list};
use crate::{
    auth::CurrentUser,
    error::AppError,
    shopping::{FILENAME, shopping_list},
    state::AppState,
    store::RecipeList,
};

pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    add_to_list(&state, RecipeList::ShoppingCart, &user, id).await
}

pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    remove_from_list(&state, RecipeList::ShoppingCart, &user, id).await
}

pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let report = shopping_list(&state.db, user.id).await?;

    debug!("Shopping list for user {} has {} lines", user.id, report.lines().count());

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename={FILENAME}")),
        ],
        report,
    ))
}
