//! User domain model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bluebell_core::{Email, UserId};

/// A registered user: customer or admin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_shape() {
        let user = User {
            id: UserId::new(1),
            email: Email::parse("jane@example.com").unwrap(),
            display_name: "Jane".to_string(),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["displayName"], "Jane");
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["email"], "jane@example.com");
    }
}
