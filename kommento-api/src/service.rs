use async_trait::async_trait;

use crate::{
    Comment, CommentId, CommentPage, EditComment, Error, NewComment, PageId, SortBy, VoteKind,
    VoteReceipt,
};

/// The network boundary of the comment widget. Implementations are selected
/// at construction time: an HTTP-backed client or the in-memory demo server.
#[async_trait]
pub trait CommentService {
    async fn fetch_comments(
        &self,
        page_id: PageId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error>;

    async fn create_comment(&self, new: NewComment) -> Result<Comment, Error>;

    async fn update_comment(&self, id: CommentId, edit: EditComment) -> Result<Comment, Error>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error>;

    async fn vote(&self, id: CommentId, kind: VoteKind) -> Result<VoteReceipt, Error>;

    async fn fetch_replies(
        &self,
        parent: CommentId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error>;
}
