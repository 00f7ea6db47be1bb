use uuid::Uuid;

use crate::{Time, User, UserId, VoteKind, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn stub() -> PageId {
        PageId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: User,
    pub page_id: PageId,

    /// Present for replies; a reply never has replies of its own.
    pub parent_id: Option<CommentId>,

    pub likes: u64,
    pub dislikes: u64,

    /// The requesting user's own vote; other users' perspectives are not
    /// represented here.
    pub user_vote: Option<VoteKind>,

    pub created_at: Time,
    pub updated_at: Time,
}

impl Comment {
    pub fn author_id(&self) -> UserId {
        self.author.id
    }

    pub fn is_edited(&self) -> bool {
        self.created_at != self.updated_at
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub content: String,
    pub page_id: PageId,
    pub parent_id: Option<CommentId>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditComment {
    pub content: String,
}
