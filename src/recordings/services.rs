use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recordings::repo::{self, Recording};
use crate::state::AppState;

pub struct NewRecording {
    pub user_id: Uuid,
    pub name: String,
    pub duration_secs: i64,
    pub start_time: Option<OffsetDateTime>,
    pub body: Bytes,
}

/// Store the media file, then insert the row. The id is generated
/// up front because the media key embeds it.
pub async fn create_recording(st: &AppState, new: NewRecording) -> anyhow::Result<Recording> {
    let id = Uuid::new_v4();
    let key = repo::media_key(new.user_id, id);

    st.storage
        .put_object(&key, new.body)
        .await
        .with_context(|| format!("store media {}", key))?;

    Recording::insert(
        &st.db,
        id,
        new.user_id,
        &new.name,
        new.duration_secs,
        new.start_time,
        &key,
    )
    .await
}

/// Hard delete removes the row and its media file.
pub async fn hard_delete_recording(st: &AppState, id: Uuid) -> anyhow::Result<Option<Recording>> {
    let Some(rec) = Recording::hard_delete(&st.db, id).await? else {
        return Ok(None);
    };
    st.storage
        .delete_object(&rec.file)
        .await
        .with_context(|| format!("remove media {}", rec.file))?;
    Ok(Some(rec))
}

/// Bulk hard delete of every soft-deleted recording, media included.
pub async fn purge_deleted(st: &AppState) -> anyhow::Result<u64> {
    let doomed = Recording::list_deleted(&st.db).await?;
    let mut purged = 0;
    for rec in doomed {
        if Recording::hard_delete(&st.db, rec.id).await?.is_some() {
            st.storage
                .delete_object(&rec.file)
                .await
                .with_context(|| format!("remove media {}", rec.file))?;
            purged += 1;
        }
    }
    Ok(purged)
}
