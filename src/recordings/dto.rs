use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recordings::repo::Recording;

/// Wire form of a recording, as returned by `get_list`.
#[derive(Debug, Serialize)]
pub struct RecordingSchema {
    pub id: Uuid,
    pub name: String,
    pub file: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    pub duration_secs: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Recording> for RecordingSchema {
    fn from(r: Recording) -> Self {
        Self {
            id: r.id,
            name: r.name,
            file: r.file,
            start_time: r.start_time,
            duration_secs: r.duration_secs,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> RecordingSchema {
        RecordingSchema {
            id: Uuid::new_v4(),
            name: "morning walk".into(),
            file: "u/r".into(),
            start_time: Some(datetime!(2024-05-01 11:00:00 UTC)),
            duration_secs: 3600,
            created_at: datetime!(2024-05-01 12:00:00 UTC),
            updated_at: datetime!(2024-05-01 12:00:00 UTC),
        }
    }

    #[test]
    fn timestamps_serialize_as_rfc3339() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");
        assert_eq!(json["start_time"], "2024-05-01T11:00:00Z");
        assert_eq!(json["duration_secs"], 3600);
    }

    #[test]
    fn missing_start_time_serializes_as_null() {
        let mut schema = sample();
        schema.start_time = None;
        let json = serde_json::to_value(schema).unwrap();
        assert!(json["start_time"].is_null());
    }

    #[test]
    fn deleted_flag_is_not_exposed() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("deleted_at").is_none());
    }
}
