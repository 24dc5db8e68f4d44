/// User data model and DTOs
///
/// `user_data` rows hold an opaque JSON payload. There is no ownership or
/// lifecycle logic beyond generic CRUD.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_data (
///     id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     user_data JSONB
/// );
/// ```

use super::{Record, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::{Validate, ValidationError};

/// User data row as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    /// Server-assigned id
    pub id: i64,

    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,

    /// Opaque payload
    #[serde(default)]
    pub user_data: JsonValue,
}

impl Record for UserData {
    const TABLE: Table = Table::UserData;
    type New = NewUserData;
    type Changes = UserDataChanges;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Insert payload for user data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewUserData {
    /// Payload to store
    pub user_data: JsonValue,
}

/// Update payload for user data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_has_changes"))]
pub struct UserDataChanges {
    /// Replacement payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<JsonValue>,
}

fn validate_has_changes(changes: &UserDataChanges) -> Result<(), ValidationError> {
    if changes.user_data.is_none() {
        let mut err = ValidationError::new("empty_changes");
        err.message = Some("At least one field must change".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_data_deserializes_backend_row() {
        let row = json!({
            "id": 3,
            "created_at": "2024-06-01T08:00:00+00:00",
            "user_data": { "theme": "dark", "tags": ["a", "b"] }
        });

        let data: UserData = serde_json::from_value(row).unwrap();
        assert_eq!(data.id(), 3);
        assert_eq!(data.user_data["theme"], "dark");
    }

    #[test]
    fn test_changes_require_payload() {
        assert!(UserDataChanges::default().validate().is_err());

        let changes = UserDataChanges {
            user_data: Some(json!({ "theme": "light" })),
        };
        assert!(changes.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({ "user_data": { "theme": "light" } })
        );
    }
}
