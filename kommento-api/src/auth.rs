use uuid::Uuid;

use crate::{Error, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(STUB_UUID)
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewSession {
    pub email: String,
    pub password: String,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_email(&self.email)?;
        crate::validate_string(&self.password)?;
        Ok(())
    }
}
