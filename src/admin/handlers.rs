use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{repo::User, sessions::StaffUser},
    error::ApiError,
    recordings::{
        repo::{AdminRecordingRow, Recording},
        services::{self, NewRecording},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/recordings", get(list_recordings).post(create_recording))
        .route("/recordings/purge", post(purge_recordings))
        .route("/recordings/restore_deleted", post(restore_deleted))
        .route("/recordings/:id", delete(soft_delete_recording))
        .route("/recordings/:id/hard", delete(hard_delete_recording))
        .route("/recordings/:id/restore", post(restore_recording))
        .layer(DefaultBodyLimit::max(200 * 1024 * 1024))
}

#[derive(Debug, Serialize)]
struct AdminUser {
    id: Uuid,
    email: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<User> for AdminUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            is_active: u.is_active,
            is_staff: u.is_staff,
            is_superuser: u.is_superuser,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct AdminRecording {
    id: Uuid,
    name: String,
    user_id: Uuid,
    user_email: String,
    file: String,
    duration_secs: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    start_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    deleted_at: Option<OffsetDateTime>,
}

impl From<AdminRecordingRow> for AdminRecording {
    fn from(r: AdminRecordingRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            user_id: r.user_id,
            user_email: r.user_email,
            file: r.file,
            duration_secs: r.duration_secs,
            start_time: r.start_time,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

impl AdminRecording {
    fn from_parts(rec: Recording, user_email: String) -> Self {
        Self {
            id: rec.id,
            name: rec.name,
            user_id: rec.user_id,
            user_email,
            file: rec.file,
            duration_secs: rec.duration_secs,
            start_time: rec.start_time,
            created_at: rec.created_at,
            updated_at: rec.updated_at,
            deleted_at: rec.deleted_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordingFilter {
    user_id: Option<Uuid>,
    #[serde(default)]
    include_deleted: bool,
}

#[derive(Debug, Serialize)]
struct BulkResult {
    affected: u64,
}

#[instrument(skip_all)]
async fn list_users(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> Result<Json<Vec<AdminUser>>, ApiError> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(AdminUser::from).collect()))
}

#[instrument(skip(state, _staff))]
async fn list_recordings(
    State(state): State<AppState>,
    _staff: StaffUser,
    Query(filter): Query<RecordingFilter>,
) -> Result<Json<Vec<AdminRecording>>, ApiError> {
    let rows =
        Recording::list_admin(&state.db, filter.user_id, filter.include_deleted).await?;
    Ok(Json(rows.into_iter().map(AdminRecording::from).collect()))
}

fn bad_field<E: std::fmt::Display>(e: E) -> ApiError {
    ApiError::Validation(format!("Malformed multipart field: {e}"))
}

/// Multipart upload: `user_id`, `duration_secs` and `file` are
/// required; `name` and an RFC 3339 `start_time` are optional.
#[instrument(skip(state, staff, mp))]
async fn create_recording(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<AdminRecording>), ApiError> {
    let mut user_id: Option<Uuid> = None;
    let mut name = String::new();
    let mut duration_secs: Option<i64> = None;
    let mut start_time: Option<OffsetDateTime> = None;
    let mut body: Option<Bytes> = None;

    while let Ok(Some(field)) = mp.next_field().await {
        match field.name().map(|s| s.to_string()).as_deref() {
            Some("user_id") => {
                let text = field.text().await.map_err(bad_field)?;
                user_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| ApiError::Validation("Invalid user_id".into()))?,
                );
            }
            Some("name") => name = field.text().await.map_err(bad_field)?,
            Some("duration_secs") => {
                let text = field.text().await.map_err(bad_field)?;
                duration_secs = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| ApiError::Validation("Invalid duration_secs".into()))?,
                );
            }
            Some("start_time") => {
                let text = field.text().await.map_err(bad_field)?;
                start_time = Some(
                    OffsetDateTime::parse(text.trim(), &Rfc3339)
                        .map_err(|_| ApiError::Validation("Invalid start_time".into()))?,
                );
            }
            Some("file") => body = Some(field.bytes().await.map_err(bad_field)?),
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| ApiError::Validation("user_id is required".into()))?;
    let duration_secs =
        duration_secs.ok_or_else(|| ApiError::Validation("duration_secs is required".into()))?;
    if duration_secs <= 0 {
        return Err(ApiError::Validation("duration_secs must be positive".into()));
    }
    let body = body.ok_or_else(|| ApiError::Validation("file is required".into()))?;

    let Some(owner) = User::find_by_id(&state.db, user_id).await? else {
        return Err(ApiError::NotFound("User not found".into()));
    };

    let rec = services::create_recording(
        &state,
        NewRecording {
            user_id: owner.id,
            name,
            duration_secs,
            start_time,
            body,
        },
    )
    .await?;
    info!(staff_id = %staff.id, recording_id = %rec.id, user_id = %rec.user_id, "recording created");

    Ok((
        StatusCode::CREATED,
        Json(AdminRecording::from_parts(rec, owner.email)),
    ))
}

#[instrument(skip(state, staff))]
async fn soft_delete_recording(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match Recording::soft_delete(&state.db, id).await? {
        Some(rec) => {
            info!(staff_id = %staff.id, recording_id = %rec.id, "recording soft-deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("Recording not found".into())),
    }
}

#[instrument(skip(state, staff))]
async fn restore_recording(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match Recording::restore(&state.db, id).await? {
        Some(rec) => {
            info!(staff_id = %staff.id, recording_id = %rec.id, "recording restored");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("Recording not found".into())),
    }
}

#[instrument(skip(state, staff))]
async fn hard_delete_recording(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match services::hard_delete_recording(&state, id).await? {
        Some(rec) => {
            info!(staff_id = %staff.id, recording_id = %rec.id, "recording hard-deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound("Recording not found".into())),
    }
}

#[instrument(skip(state, staff))]
async fn purge_recordings(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Json<BulkResult>, ApiError> {
    let affected = services::purge_deleted(&state).await?;
    info!(staff_id = %staff.id, affected, "purged soft-deleted recordings");
    Ok(Json(BulkResult { affected }))
}

#[instrument(skip(state, staff))]
async fn restore_deleted(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Json<BulkResult>, ApiError> {
    let affected = Recording::restore_deleted(&state.db).await?;
    info!(staff_id = %staff.id, affected, "restored soft-deleted recordings");
    Ok(Json(BulkResult { affected }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_exclude_deleted() {
        let filter: RecordingFilter = serde_json::from_str("{}").unwrap();
        assert!(filter.user_id.is_none());
        assert!(!filter.include_deleted);
    }

    #[test]
    fn admin_recording_serializes_deleted_flag() {
        use time::macros::datetime;

        let row = AdminRecording {
            id: Uuid::new_v4(),
            name: String::new(),
            user_id: Uuid::new_v4(),
            user_email: "owner@example.com".into(),
            file: "u/r".into(),
            duration_secs: 60,
            start_time: None,
            created_at: datetime!(2024-05-01 12:00:00 UTC),
            updated_at: datetime!(2024-05-01 12:00:00 UTC),
            deleted_at: Some(datetime!(2024-05-02 09:30:00 UTC)),
        };

        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["deleted_at"], "2024-05-02T09:30:00Z");
        assert_eq!(json["user_email"], "owner@example.com");
    }
}
