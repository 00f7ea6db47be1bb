use uuid::Uuid;

use crate::{Error, Time, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

/// Denormalized author snapshot, taken at fetch or creation time. Later
/// profile edits are not propagated into already-fetched comments.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(id: UserId, name: String, email: String) -> NewUser {
        NewUser { id, name, email }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.name)?;
        crate::validate_email(&self.email)?;
        Ok(())
    }
}
