mod comment;
pub use comment::Comment;

mod http;
pub use http::HttpService;

mod pager;
pub use pager::{page_window, PageToken, Pager};

mod replies;
pub use replies::{ReplyLoader, ReplyThread, REPLY_PAGE_SIZE, REPLY_SORT};

mod session;
pub use session::CommentSession;

mod store;
pub use store::{CommentStore, VoteSnapshot};

pub mod api {
    pub use kommento_api::*;
}
