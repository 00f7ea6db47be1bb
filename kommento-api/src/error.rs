use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Comment not found {0}")]
    NotFound(Uuid),

    #[error("Comment text is empty")]
    EmptyContent,

    #[error("Comment text is too long ({len} > {max})")]
    ContentTooLong { len: usize, max: usize },

    #[error("Invalid email address {0:?}")]
    InvalidEmail(String),

    #[error("Email already used {0}")]
    EmailAlreadyUsed(String),

    #[error("Cannot reply to reply {0}")]
    NestedReply(Uuid),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::ContentTooLong { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            Error::EmailAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::NestedReply(_) => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound(id) => json!({
                "message": "comment not found",
                "type": "not-found",
                "id": id,
            }),
            Error::EmptyContent => json!({
                "message": "comment text is empty",
                "type": "empty-content",
            }),
            Error::ContentTooLong { len, max } => json!({
                "message": "comment text is too long",
                "type": "content-too-long",
                "len": len,
                "max": max,
            }),
            Error::InvalidEmail(email) => json!({
                "message": "invalid email address",
                "type": "invalid-email",
                "email": email,
            }),
            Error::EmailAlreadyUsed(email) => json!({
                "message": "email already used",
                "type": "conflict-email",
                "email": email,
            }),
            Error::NestedReply(id) => json!({
                "message": "replies cannot be nested",
                "type": "nested-reply",
                "id": id,
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let get_str = |key: &str| -> Option<&str> { data.get(key).and_then(|v| v.as_str()) };
        let get_uuid = |key: &str| -> anyhow::Result<Uuid> {
            get_str(key)
                .and_then(|id| Uuid::from_str(id).ok())
                .ok_or_else(|| anyhow!("error contents has no valid {key:?} uuid"))
        };
        Ok(
            match get_str("type").ok_or_else(|| anyhow!("error type is not a string"))? {
                "unknown" => Error::Unknown(String::from(get_str("message").unwrap_or(""))),
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound(get_uuid("id")?),
                "empty-content" => Error::EmptyContent,
                "content-too-long" => {
                    let get_num = |key: &str| -> anyhow::Result<usize> {
                        data.get(key)
                            .and_then(|v| v.as_u64())
                            .map(|v| v as usize)
                            .ok_or_else(|| anyhow!("error contents has no {key:?} number"))
                    };
                    Error::ContentTooLong {
                        len: get_num("len")?,
                        max: get_num("max")?,
                    }
                }
                "invalid-email" => Error::InvalidEmail(String::from(
                    get_str("email").ok_or_else(|| anyhow!("invalid-email without an email"))?,
                )),
                "conflict-email" => Error::EmailAlreadyUsed(String::from(
                    get_str("email").ok_or_else(|| anyhow!("conflict-email without an email"))?,
                )),
                "nested-reply" => Error::NestedReply(get_uuid("id")?),
                "null-byte" => Error::NullByteInString(String::from(
                    get_str("string").ok_or_else(|| anyhow!("null-byte without a string"))?,
                )),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_round_trip_through_contents() {
        let errors = vec![
            Error::Unknown(String::from("boom")),
            Error::PermissionDenied,
            Error::NotFound(Uuid::new_v4()),
            Error::EmptyContent,
            Error::ContentTooLong { len: 3000, max: 2000 },
            Error::InvalidEmail(String::from("nope")),
            Error::EmailAlreadyUsed(String::from("ada@example.com")),
            Error::NestedReply(Uuid::new_v4()),
            Error::NullByteInString(String::from("a\0b")),
        ];
        for e in errors {
            let parsed = Error::parse(&e.contents()).expect("parsing serialized error");
            assert_eq!(parsed, e);
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Error::parse(b"not json").is_err());
        assert!(Error::parse(br#"{"type": "no-such-type"}"#).is_err());
        assert!(Error::parse(br#"{"message": "typeless"}"#).is_err());
    }
}
