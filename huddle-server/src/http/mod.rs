mod caller;
mod error;
mod host;
mod rooms;
mod user;

pub use caller::Caller;
pub use error::{ApiError, ApiResult};

use crate::AppState;
use axum::{Json, Router, extract::State, routing::get, routing::post};
use huddle_core::IceServerConfig;

async fn ice_servers(State(state): State<AppState>) -> Json<Vec<IceServerConfig>> {
    Json(state.ice_servers.as_ref().clone())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/user",
            get(user::me).post(user::register).put(user::update),
        )
        .route("/api/ice", get(ice_servers))
        .route(
            "/api/game/host",
            get(host::host_stream)
                .post(host::send_answer)
                .put(host::attach)
                .delete(host::detach),
        )
        .route("/api/game/host/reject", post(host::reject))
        .route("/api/game/messages", post(host::post_message))
        .route("/api/game/rooms", get(rooms::list).post(rooms::join))
        .with_state(state)
}
