use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::sessions::SessionUser,
    error::ApiError,
    recordings::{dto::RecordingSchema, repo::Recording},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/get_list", get(get_list))
}

/// Recordings owned by the current session's user, newest first.
/// Soft-deleted recordings never show up here.
#[instrument(skip(state, user))]
async fn get_list(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Json<Vec<RecordingSchema>>, ApiError> {
    let recordings = Recording::list_active_by_user(&state.db, user.id).await?;
    Ok(Json(
        recordings.into_iter().map(RecordingSchema::from).collect(),
    ))
}
