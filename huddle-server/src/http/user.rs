use crate::AppState;
use crate::http::{ApiResult, Caller};
use axum::{Json, extract::State};
use huddle_core::{ProfileUpdate, UserRecord};

pub async fn register(State(state): State<AppState>) -> ApiResult<Json<UserRecord>> {
    Ok(Json(state.directory.register_user().await?))
}

pub async fn me(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<UserRecord>> {
    Ok(Json(state.directory.user(&caller).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<UserRecord>> {
    Ok(Json(state.directory.update_profile(&caller, &update).await?))
}
