use std::collections::HashMap;

use crate::{
    api::{CommentId, CommentPage, SortBy},
    Comment,
};

/// Replies are fetched with a fixed window: page 1, 50 entries, newest first.
/// The one-level nesting limit keeps threads small enough that deeper
/// pagination has never been needed.
pub const REPLY_PAGE_SIZE: u32 = 50;
pub const REPLY_SORT: SortBy = SortBy::Newest;

/// One parent comment's cached reply thread.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyThread {
    pub replies: Vec<Comment>,
    /// Server-side reply count; can exceed `replies.len()`.
    pub total_count: u64,
    pub expanded: bool,
    pub loaded: bool,
}

impl Default for ReplyThread {
    fn default() -> ReplyThread {
        ReplyThread {
            replies: Vec::new(),
            total_count: 0,
            expanded: false,
            loaded: false,
        }
    }
}

/// Per-parent reply cache, independent of the top-level pagination. A thread
/// is fetched once on first expand and reused until invalidated by a local
/// reply creation, which forces a full re-fetch to absorb concurrent replies
/// from other users.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplyLoader {
    threads: HashMap<CommentId, ReplyThread>,
}

impl ReplyLoader {
    pub fn thread(&self, parent: CommentId) -> Option<&ReplyThread> {
        self.threads.get(&parent)
    }

    pub fn is_loaded(&self, parent: CommentId) -> bool {
        self.threads.get(&parent).map_or(false, |t| t.loaded)
    }

    /// Replaces the cached thread for `parent` with a freshly fetched page,
    /// preserving the expansion state.
    pub fn store_page(&mut self, parent: CommentId, page: CommentPage) {
        let thread = self.threads.entry(parent).or_default();
        thread.replies = page.comments.into_iter().map(Comment::from).collect();
        thread.total_count = page.pagination.total_items;
        thread.loaded = true;
    }

    /// Marks the thread stale so the next load re-fetches it. Cached entries
    /// stay visible until then.
    pub fn invalidate(&mut self, parent: CommentId) {
        if let Some(thread) = self.threads.get_mut(&parent) {
            thread.loaded = false;
        }
    }

    /// Flips expand/collapse and returns the new state.
    pub fn toggle(&mut self, parent: CommentId) -> bool {
        let thread = self.threads.entry(parent).or_default();
        thread.expanded = !thread.expanded;
        thread.expanded
    }

    /// Finds a cached reply across all threads, for ownership checks.
    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        self.threads
            .values()
            .flat_map(|t| t.replies.iter())
            .find(|c| c.id == id)
    }

    pub fn remove_reply(&mut self, id: CommentId) {
        for thread in self.threads.values_mut() {
            let before = thread.replies.len();
            thread.replies.retain(|c| c.id != id);
            if thread.replies.len() != before {
                thread.total_count = thread.total_count.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{self, PageId, Pagination, Time, User, UserId, Uuid, VoteKind};
    use chrono::TimeZone;

    fn time(secs: i64) -> Time {
        chrono::Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn reply(parent: CommentId) -> api::Comment {
        api::Comment {
            id: CommentId(Uuid::new_v4()),
            content: String::from("me too"),
            author: User {
                id: UserId::stub(),
                name: String::from("ada"),
                email: String::from("ada@example.com"),
                avatar_url: None,
                created_at: time(0),
            },
            page_id: PageId::stub(),
            parent_id: Some(parent),
            likes: 0,
            dislikes: 0,
            user_vote: None::<VoteKind>,
            created_at: time(1),
            updated_at: time(1),
        }
    }

    #[test]
    fn store_page_marks_loaded_and_counts() {
        let parent = CommentId(Uuid::new_v4());
        let mut loader = ReplyLoader::default();
        assert!(!loader.is_loaded(parent));

        loader.store_page(
            parent,
            CommentPage {
                comments: vec![reply(parent), reply(parent)],
                pagination: Pagination::compute(1, REPLY_PAGE_SIZE, 7),
            },
        );
        assert!(loader.is_loaded(parent));
        let thread = loader.thread(parent).unwrap();
        assert_eq!(thread.replies.len(), 2);
        assert_eq!(thread.total_count, 7);
    }

    #[test]
    fn invalidate_keeps_entries_visible() {
        let parent = CommentId(Uuid::new_v4());
        let mut loader = ReplyLoader::default();
        loader.store_page(
            parent,
            CommentPage {
                comments: vec![reply(parent)],
                pagination: Pagination::compute(1, REPLY_PAGE_SIZE, 1),
            },
        );

        loader.invalidate(parent);
        assert!(!loader.is_loaded(parent));
        assert_eq!(loader.thread(parent).unwrap().replies.len(), 1);
    }

    #[test]
    fn toggle_survives_reload() {
        let parent = CommentId(Uuid::new_v4());
        let mut loader = ReplyLoader::default();
        assert!(loader.toggle(parent));
        loader.store_page(
            parent,
            CommentPage {
                comments: vec![reply(parent)],
                pagination: Pagination::compute(1, REPLY_PAGE_SIZE, 1),
            },
        );
        assert!(loader.thread(parent).unwrap().expanded);
        assert!(!loader.toggle(parent));
    }

    #[test]
    fn remove_reply_updates_count() {
        let parent = CommentId(Uuid::new_v4());
        let mut loader = ReplyLoader::default();
        let kept = reply(parent);
        let gone = reply(parent);
        let gone_id = gone.id;
        loader.store_page(
            parent,
            CommentPage {
                comments: vec![kept, gone],
                pagination: Pagination::compute(1, REPLY_PAGE_SIZE, 2),
            },
        );

        loader.remove_reply(gone_id);
        let thread = loader.thread(parent).unwrap();
        assert_eq!(thread.replies.len(), 1);
        assert_eq!(thread.total_count, 1);
        assert!(loader.find(gone_id).is_none());
    }
}
