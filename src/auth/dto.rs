use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;

/// Request body shared by registration and login.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserSchema {
    pub id: Uuid,
    pub email: String,
}

impl From<User> for UserSchema {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_schema_exposes_only_id_and_email() {
        let schema = UserSchema {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }
}
