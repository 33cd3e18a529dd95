use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use entity::tag;
use sea_orm::{EntityTrait, QueryOrder};

use crate::{error::AppError, state::AppState};

pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let tag = tag::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(tag))
}
