use crate::CommentId;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteKind::Like => "like",
            VoteKind::Dislike => "dislike",
        }
    }
}

/// Authoritative tallies returned by the server after a vote. `user_vote` is
/// meaningful only to the user who cast the vote; when a receipt is relayed
/// to other clients it carries `None` there.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteReceipt {
    pub id: CommentId,
    pub likes: u64,
    pub dislikes: u64,
    pub user_vote: Option<VoteKind>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteRequest {
    pub kind: VoteKind,
}
