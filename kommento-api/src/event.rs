use crate::{Comment, CommentId, VoteReceipt};

/// Remote change feed for a page's comments. The transport carrying these is
/// not part of this crate; the mock server relays them in-process.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub enum CommentEvent {
    Added(Comment),
    Updated(Comment),
    Deleted(CommentId),
    Voted(VoteReceipt),
}
