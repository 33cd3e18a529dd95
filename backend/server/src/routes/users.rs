use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    auth::{CurrentUser, MaybeUser},
    error::AppError,
    payloads::{PasswordChange, SubscriptionsQuery, UserCreate, UserCreated, UserView},
    state::AppState,
    store,
};

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let users = store::list_users(&state.db, viewer.as_ref()).await?;

    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserCreate>,
) -> Result<impl IntoResponse, AppError> {
    let user = store::create_user(&state.db, payload).await?;

    Ok((StatusCode::CREATED, Json(UserCreated::from(user))))
}

pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(UserView::new(user, false))
}

pub async fn set_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PasswordChange>,
) -> Result<impl IntoResponse, AppError> {
    store::change_password(&state.db, user, payload).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SubscriptionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subscriptions = store::subscriptions(&state.db, &user, query.recipes_limit).await?;

    Ok(Json(subscriptions))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let user = store::find_user(&state.db, id).await?;

    Ok(Json(store::user_view(&state.db, viewer.as_ref(), user).await?))
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Query(query): Query<SubscriptionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let author = store::find_user(&state.db, id).await?;
    store::follow(&state.db, &user, &author).await?;

    let subscription = store::subscription(&state.db, author, query.recipes_limit).await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let author = store::find_user(&state.db, id).await?;
    store::unfollow(&state.db, &user, &author).await?;

    Ok(StatusCode::NO_CONTENT)
}
