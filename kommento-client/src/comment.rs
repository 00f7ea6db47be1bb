use crate::api::{self, CommentId, PageId, Time, User, UserId, VoteKind};

/// A comment as held by the client store: the wire fields plus the transient
/// `is_editing` UI flag, which is never persisted or sent anywhere.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: User,
    pub page_id: PageId,
    pub parent_id: Option<CommentId>,

    pub likes: u64,
    pub dislikes: u64,
    pub user_vote: Option<VoteKind>,

    pub created_at: Time,
    pub updated_at: Time,

    pub is_editing: bool,
}

impl From<api::Comment> for Comment {
    fn from(c: api::Comment) -> Comment {
        Comment {
            id: c.id,
            content: c.content,
            author: c.author,
            page_id: c.page_id,
            parent_id: c.parent_id,
            likes: c.likes,
            dislikes: c.dislikes,
            user_vote: c.user_vote,
            created_at: c.created_at,
            updated_at: c.updated_at,
            is_editing: false,
        }
    }
}

impl Comment {
    pub fn author_id(&self) -> UserId {
        self.author.id
    }

    pub fn is_edited(&self) -> bool {
        self.created_at != self.updated_at
    }
}
