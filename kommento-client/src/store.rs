use std::collections::{hash_map, HashMap};

use crate::{
    api::{self, CommentEvent, CommentId, CommentPage, Pagination, VoteKind, VoteReceipt},
    Comment,
};

/// Pre-vote baseline for one in-flight optimistic vote. At most one snapshot
/// exists per comment id; a second vote while the first is pending keeps the
/// original baseline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VoteSnapshot {
    pub likes: u64,
    pub dislikes: u64,
    pub user_vote: Option<VoteKind>,
}

/// Normalized store for the currently displayed page of comments: a flat
/// id-keyed map plus an ordered id sequence defining display order. Only this
/// type's own operations mutate the maps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentStore {
    comments: HashMap<CommentId, Comment>,
    comment_ids: Vec<CommentId>,
    pagination: Pagination,
    optimistic_updates: HashMap<CommentId, VoteSnapshot>,
}

impl CommentStore {
    pub fn new(page_size: u32) -> CommentStore {
        CommentStore {
            comments: HashMap::new(),
            comment_ids: Vec::new(),
            pagination: Pagination::empty(page_size),
            optimistic_updates: HashMap::new(),
        }
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.get(&id)
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Ids in display order. Every id here has a resident comment.
    pub fn comment_ids(&self) -> &[CommentId] {
        &self.comment_ids
    }

    /// Comments of the current page, in display order.
    pub fn iter_page(&self) -> impl Iterator<Item = &Comment> {
        self.comment_ids
            .iter()
            .filter_map(move |id| self.comments.get(id))
    }

    /// True while an optimistic vote on this comment awaits its confirmation
    /// or rollback.
    pub fn vote_pending(&self, id: CommentId) -> bool {
        self.optimistic_updates.contains_key(&id)
    }

    /// Atomically replaces map, id sequence and pagination with a freshly
    /// fetched page. No id from the previous page survives in the sequence.
    pub fn replace_all(&mut self, page: CommentPage) {
        self.comment_ids = page.comments.iter().map(|c| c.id).collect();
        self.comments = page
            .comments
            .into_iter()
            .map(|c| (c.id, Comment::from(c)))
            .collect();
        self.pagination = page.pagination;
    }

    /// Inserts a newly created top-level comment (prepended to the display
    /// order) or merges a server-confirmed update into a resident one,
    /// clearing its editing flag. A non-resident reply is ignored: replies
    /// live in the per-parent thread cache, not here.
    pub fn upsert_one(&mut self, c: api::Comment) {
        match self.comments.entry(c.id) {
            hash_map::Entry::Occupied(mut entry) => {
                *entry.get_mut() = Comment::from(c);
            }
            hash_map::Entry::Vacant(entry) => {
                if c.parent_id.is_some() {
                    tracing::debug!(id = ?c.id, "ignoring upsert of non-resident reply");
                    return;
                }
                let id = c.id;
                entry.insert(Comment::from(c));
                self.comment_ids.insert(0, id);
                self.pagination.total_items += 1;
            }
        }
    }

    /// Removes a comment from map and sequence. Returns false (and changes
    /// nothing) if the id is not resident.
    pub fn remove_one(&mut self, id: CommentId) -> bool {
        if self.comments.remove(&id).is_none() {
            return false;
        }
        self.comment_ids.retain(|i| *i != id);
        self.pagination.total_items = self.pagination.total_items.saturating_sub(1);
        true
    }

    /// UI-only toggle; does not touch content. No-op for unknown ids.
    pub fn set_editing(&mut self, id: CommentId, is_editing: bool) {
        if let Some(c) = self.comments.get_mut(&id) {
            c.is_editing = is_editing;
        }
    }

    /// Applies the toggle-or-switch vote transition to the resident comment
    /// and records the pre-vote baseline, unless one is already pending for
    /// this id. Returns false if the comment is not resident.
    pub fn apply_optimistic_vote(&mut self, id: CommentId, kind: VoteKind) -> bool {
        let Some(c) = self.comments.get_mut(&id) else {
            return false;
        };
        self.optimistic_updates
            .entry(id)
            .or_insert_with(|| VoteSnapshot {
                likes: c.likes,
                dislikes: c.dislikes,
                user_vote: c.user_vote,
            });
        if c.user_vote == Some(kind) {
            // Voting the same way twice retracts the vote
            match kind {
                VoteKind::Like => c.likes = c.likes.saturating_sub(1),
                VoteKind::Dislike => c.dislikes = c.dislikes.saturating_sub(1),
            }
            c.user_vote = None;
        } else {
            match c.user_vote {
                Some(VoteKind::Like) => c.likes = c.likes.saturating_sub(1),
                Some(VoteKind::Dislike) => c.dislikes = c.dislikes.saturating_sub(1),
                None => (),
            }
            match kind {
                VoteKind::Like => c.likes += 1,
                VoteKind::Dislike => c.dislikes += 1,
            }
            c.user_vote = Some(kind);
        }
        true
    }

    /// Replaces the optimistic guess with the server's authoritative tallies
    /// and drops the snapshot. A confirmation landing after the comment left
    /// the store (page change) still drops the snapshot and is otherwise a
    /// no-op.
    pub fn confirm_vote(&mut self, receipt: &VoteReceipt) {
        self.optimistic_updates.remove(&receipt.id);
        match self.comments.get_mut(&receipt.id) {
            Some(c) => {
                c.likes = receipt.likes;
                c.dislikes = receipt.dislikes;
                c.user_vote = receipt.user_vote;
            }
            None => tracing::debug!(id = ?receipt.id, "vote confirmed for comment no longer resident"),
        }
    }

    /// Restores the pre-vote baseline and drops the snapshot. Safe no-op when
    /// no snapshot exists (e.g. a rollback racing a confirmation that already
    /// ran).
    pub fn rollback_vote(&mut self, id: CommentId) {
        let Some(snapshot) = self.optimistic_updates.remove(&id) else {
            return;
        };
        match self.comments.get_mut(&id) {
            Some(c) => {
                c.likes = snapshot.likes;
                c.dislikes = snapshot.dislikes;
                c.user_vote = snapshot.user_vote;
            }
            None => tracing::debug!(id = ?id, "vote rolled back for comment no longer resident"),
        }
    }

    /// Applies a remote change relayed by the server. `Voted` patches tallies
    /// only: the receipt's `user_vote` belongs to whoever cast the vote, not
    /// to this store's user.
    pub fn apply_event(&mut self, event: CommentEvent) {
        match event {
            CommentEvent::Added(c) => self.upsert_one(c),
            CommentEvent::Updated(c) => {
                if let Some(resident) = self.comments.get_mut(&c.id) {
                    // the relayed payload has no viewer context; keep our vote
                    let user_vote = resident.user_vote;
                    *resident = Comment::from(c);
                    resident.user_vote = user_vote;
                }
            }
            CommentEvent::Deleted(id) => {
                self.remove_one(id);
            }
            CommentEvent::Voted(receipt) => {
                if let Some(c) = self.comments.get_mut(&receipt.id) {
                    c.likes = receipt.likes;
                    c.dislikes = receipt.dislikes;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PageId, Time, User, UserId, Uuid};
    use chrono::TimeZone;

    fn time(secs: i64) -> Time {
        chrono::Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn author() -> User {
        User {
            id: UserId::stub(),
            name: String::from("ada"),
            email: String::from("ada@example.com"),
            avatar_url: None,
            created_at: time(0),
        }
    }

    fn comment(likes: u64, dislikes: u64, user_vote: Option<VoteKind>) -> api::Comment {
        api::Comment {
            id: CommentId(Uuid::new_v4()),
            content: String::from("first!"),
            author: author(),
            page_id: PageId::stub(),
            parent_id: None,
            likes,
            dislikes,
            user_vote,
            created_at: time(1),
            updated_at: time(1),
        }
    }

    fn store_with(comments: Vec<api::Comment>) -> CommentStore {
        let mut store = CommentStore::new(10);
        let total = comments.len() as u64;
        store.replace_all(CommentPage {
            comments,
            pagination: Pagination::compute(1, 10, total),
        });
        store
    }

    fn tallies(store: &CommentStore, id: CommentId) -> (u64, u64, Option<VoteKind>) {
        let c = store.get(id).unwrap();
        (c.likes, c.dislikes, c.user_vote)
    }

    #[test]
    fn voting_twice_toggles_back() {
        let c = comment(5, 2, None);
        let id = c.id;
        let mut store = store_with(vec![c]);

        assert!(store.apply_optimistic_vote(id, VoteKind::Like));
        assert_eq!(tallies(&store, id), (6, 2, Some(VoteKind::Like)));
        assert!(store.apply_optimistic_vote(id, VoteKind::Like));
        assert_eq!(tallies(&store, id), (5, 2, None));
    }

    #[test]
    fn switching_vote_moves_both_counters() {
        let c = comment(5, 2, Some(VoteKind::Like));
        let id = c.id;
        let mut store = store_with(vec![c]);

        store.apply_optimistic_vote(id, VoteKind::Dislike);
        assert_eq!(tallies(&store, id), (4, 3, Some(VoteKind::Dislike)));
    }

    #[test]
    fn rollback_without_snapshot_is_noop() {
        let c = comment(5, 2, Some(VoteKind::Like));
        let id = c.id;
        let mut store = store_with(vec![c]);
        let before = store.clone();

        store.rollback_vote(id);
        assert_eq!(store, before);
    }

    #[test]
    fn second_vote_keeps_first_snapshot() {
        let c = comment(5, 2, None);
        let id = c.id;
        let mut store = store_with(vec![c]);

        store.apply_optimistic_vote(id, VoteKind::Like);
        store.apply_optimistic_vote(id, VoteKind::Dislike);
        assert_eq!(tallies(&store, id), (5, 3, Some(VoteKind::Dislike)));

        // A rollback now must land on the state before the *first* vote
        store.rollback_vote(id);
        assert_eq!(tallies(&store, id), (5, 2, None));
        assert!(!store.vote_pending(id));
    }

    #[test]
    fn confirm_overrides_optimistic_guess() {
        let c = comment(5, 2, None);
        let id = c.id;
        let mut store = store_with(vec![c]);

        store.apply_optimistic_vote(id, VoteKind::Like);
        // Another user liked concurrently: the server tally is one higher
        store.confirm_vote(&VoteReceipt {
            id,
            likes: 7,
            dislikes: 2,
            user_vote: Some(VoteKind::Like),
        });
        assert_eq!(tallies(&store, id), (7, 2, Some(VoteKind::Like)));
        assert!(!store.vote_pending(id));
    }

    #[test]
    fn replace_all_drops_previous_page_ids() {
        let old = comment(0, 0, None);
        let old_id = old.id;
        let mut store = store_with(vec![old]);

        let fresh = comment(1, 0, None);
        let fresh_id = fresh.id;
        store.replace_all(CommentPage {
            comments: vec![fresh],
            pagination: Pagination::compute(2, 10, 11),
        });

        assert_eq!(store.comment_ids(), &[fresh_id]);
        assert!(store.get(old_id).is_none());
        assert_eq!(store.pagination().page, 2);
    }

    #[test]
    fn confirm_after_page_change_still_drops_snapshot() {
        let c = comment(5, 2, None);
        let id = c.id;
        let mut store = store_with(vec![c]);

        store.apply_optimistic_vote(id, VoteKind::Like);
        store.replace_all(CommentPage {
            comments: vec![comment(0, 0, None)],
            pagination: Pagination::compute(2, 10, 11),
        });
        assert!(store.vote_pending(id));

        store.confirm_vote(&VoteReceipt {
            id,
            likes: 6,
            dislikes: 2,
            user_vote: Some(VoteKind::Like),
        });
        assert!(!store.vote_pending(id));
        assert!(store.get(id).is_none());
    }

    #[test]
    fn rollback_after_page_change_still_drops_snapshot() {
        let c = comment(5, 2, None);
        let id = c.id;
        let mut store = store_with(vec![c]);

        store.apply_optimistic_vote(id, VoteKind::Like);
        store.replace_all(CommentPage {
            comments: vec![],
            pagination: Pagination::empty(10),
        });

        store.rollback_vote(id);
        assert!(!store.vote_pending(id));
    }

    #[test]
    fn upsert_prepends_new_comment() {
        let first = comment(0, 0, None);
        let first_id = first.id;
        let mut store = store_with(vec![first]);

        let fresh = comment(0, 0, None);
        let fresh_id = fresh.id;
        store.upsert_one(fresh);

        assert_eq!(store.comment_ids(), &[fresh_id, first_id]);
        assert_eq!(store.pagination().total_items, 2);
    }

    #[test]
    fn upsert_merges_and_clears_editing() {
        let c = comment(3, 1, None);
        let id = c.id;
        let mut store = store_with(vec![c.clone()]);
        store.set_editing(id, true);

        let mut edited = c;
        edited.content = String::from("edited");
        edited.updated_at = time(2);
        store.upsert_one(edited);

        let got = store.get(id).unwrap();
        assert_eq!(got.content, "edited");
        assert!(!got.is_editing);
        assert!(got.is_edited());
        // merging must not double-count the comment
        assert_eq!(store.pagination().total_items, 1);
    }

    #[test]
    fn upsert_ignores_non_resident_reply() {
        let top = comment(0, 0, None);
        let mut store = store_with(vec![top.clone()]);

        let mut reply = comment(0, 0, None);
        reply.parent_id = Some(top.id);
        let reply_id = reply.id;
        store.upsert_one(reply);

        assert!(store.get(reply_id).is_none());
        assert_eq!(store.comment_ids().len(), 1);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let c = comment(0, 0, None);
        let mut store = store_with(vec![c]);
        let before = store.clone();

        assert!(!store.remove_one(CommentId(Uuid::new_v4())));
        assert_eq!(store, before);
    }

    #[test]
    fn remote_vote_event_patches_tallies_only() {
        let c = comment(5, 2, Some(VoteKind::Like));
        let id = c.id;
        let mut store = store_with(vec![c]);

        store.apply_event(CommentEvent::Voted(VoteReceipt {
            id,
            likes: 6,
            dislikes: 2,
            user_vote: None,
        }));
        assert_eq!(tallies(&store, id), (6, 2, Some(VoteKind::Like)));
    }

    #[test]
    fn remote_update_event_preserves_own_vote() {
        let c = comment(5, 2, Some(VoteKind::Like));
        let id = c.id;
        let mut store = store_with(vec![c.clone()]);

        let mut remote = c;
        remote.content = String::from("edited elsewhere");
        remote.user_vote = None;
        remote.updated_at = time(3);
        store.apply_event(CommentEvent::Updated(remote));

        let got = store.get(id).unwrap();
        assert_eq!(got.content, "edited elsewhere");
        assert_eq!(got.user_vote, Some(VoteKind::Like));
        assert!(got.is_edited());
    }

    #[test]
    fn vote_sequences_keep_tallies_consistent() {
        // From a zero-tally comment with no prior vote, any sequence of
        // confirmed single-user votes leaves the counters agreeing with the
        // tri-state vote and never underflows.
        bolero::check!()
            .with_type::<Vec<VoteKind>>()
            .cloned()
            .for_each(|seq: Vec<VoteKind>| {
                let c = comment(0, 0, None);
                let id = c.id;
                let mut store = store_with(vec![c]);
                for kind in seq {
                    assert!(store.apply_optimistic_vote(id, kind));
                    let (likes, dislikes, user_vote) = tallies(&store, id);
                    store.confirm_vote(&VoteReceipt {
                        id,
                        likes,
                        dislikes,
                        user_vote,
                    });
                }
                let (likes, dislikes, user_vote) = tallies(&store, id);
                assert_eq!(likes, u64::from(user_vote == Some(VoteKind::Like)));
                assert_eq!(dislikes, u64::from(user_vote == Some(VoteKind::Dislike)));
            });
    }
}
