use crate::{
    api::{
        validate_content, CommentEvent, CommentId, CommentService, EditComment, Error, NewComment,
        PageId, SortBy, User, UserId, VoteKind,
    },
    Comment, CommentStore, Pager, ReplyLoader, REPLY_PAGE_SIZE, REPLY_SORT,
};

/// Orchestrates one page's comment widget: owns the store, the pagination
/// controller and the reply cache, gates operations on the externally-managed
/// auth state, and reconciles the store against service responses.
///
/// All methods take `&mut self`, so operations of one session never observe
/// each other's partial state; suspension happens only at service-call
/// boundaries.
pub struct CommentSession<S> {
    service: S,
    page_id: PageId,
    current_user: Option<User>,
    store: CommentStore,
    pager: Pager,
    replies: ReplyLoader,
}

impl<S> CommentSession<S>
where
    S: CommentService + Send + Sync,
{
    pub fn new(service: S, page_id: PageId, current_user: Option<User>) -> CommentSession<S> {
        let pager = Pager::default();
        CommentSession {
            service,
            page_id,
            current_user,
            store: CommentStore::new(pager.page_size()),
            pager,
            replies: ReplyLoader::default(),
        }
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn replies(&self) -> &ReplyLoader {
        &self.replies
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// The auth collaborator pushes login/logout here; the session never
    /// manages tokens itself.
    pub fn set_current_user(&mut self, user: Option<User>) {
        self.current_user = user;
    }

    pub fn can_modify(&self, author: UserId) -> bool {
        self.current_user.as_ref().map_or(false, |u| u.id == author)
    }

    /// Re-fetches the current page per the pager state and atomically
    /// replaces the store contents.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let page = self
            .service
            .fetch_comments(
                self.page_id,
                self.pager.page(),
                self.pager.page_size(),
                self.pager.sort_by(),
            )
            .await?;
        self.store.replace_all(page);
        Ok(())
    }

    pub async fn set_sort_by(&mut self, sort_by: SortBy) -> Result<(), Error> {
        self.pager.set_sort_by(sort_by);
        self.refresh().await
    }

    pub async fn set_page(&mut self, page: u32) -> Result<(), Error> {
        self.pager.set_page(page);
        self.refresh().await
    }

    pub async fn set_page_size(&mut self, page_size: u32) -> Result<(), Error> {
        self.pager.set_page_size(page_size);
        self.refresh().await
    }

    /// Creates a top-level comment. Not optimistic: the store is only touched
    /// once the server confirms, so a failure leaves it unmodified.
    pub async fn add_comment(&mut self, content: &str) -> Result<CommentId, Error> {
        let content = content.trim();
        validate_content(content)?;
        if !self.is_authenticated() {
            return Err(Error::PermissionDenied);
        }
        let created = self
            .service
            .create_comment(NewComment {
                content: content.to_string(),
                page_id: self.page_id,
                parent_id: None,
            })
            .await?;
        let id = created.id;
        self.store.upsert_one(created);
        Ok(id)
    }

    /// Edits an owned comment. Ownership is checked before any network call;
    /// the server re-checks on its side regardless.
    pub async fn edit_comment(&mut self, id: CommentId, content: &str) -> Result<(), Error> {
        let content = content.trim();
        validate_content(content)?;
        let author = self.author_of(id).ok_or(Error::NotFound(id.0))?;
        if !self.can_modify(author) {
            return Err(Error::PermissionDenied);
        }
        let updated = self
            .service
            .update_comment(
                id,
                EditComment {
                    content: content.to_string(),
                },
            )
            .await?;
        if let Some(parent) = updated.parent_id {
            // an edited reply is picked up on the next thread load
            self.replies.invalidate(parent);
        }
        self.store.upsert_one(updated);
        Ok(())
    }

    /// Deletes an owned comment. Not speculative: the comment leaves the
    /// store only after the server confirms.
    pub async fn delete_comment(&mut self, id: CommentId) -> Result<(), Error> {
        let author = self.author_of(id).ok_or(Error::NotFound(id.0))?;
        if !self.can_modify(author) {
            return Err(Error::PermissionDenied);
        }
        self.service.delete_comment(id).await?;
        if !self.store.remove_one(id) {
            self.replies.remove_reply(id);
        }
        Ok(())
    }

    /// Casts, switches or retracts a vote, optimistically. Unauthenticated
    /// callers are a no-op at this boundary: nothing reaches the store or the
    /// network. On a server error the pre-vote tallies are restored and the
    /// error surfaced.
    pub async fn vote(&mut self, id: CommentId, kind: VoteKind) -> Result<(), Error> {
        if !self.is_authenticated() {
            return Ok(());
        }
        if !self.store.apply_optimistic_vote(id, kind) {
            tracing::debug!(id = ?id, "vote on a comment that is not resident");
            return Ok(());
        }
        match self.service.vote(id, kind).await {
            Ok(receipt) => {
                self.store.confirm_vote(&receipt);
                Ok(())
            }
            Err(e) => {
                self.store.rollback_vote(id);
                Err(e)
            }
        }
    }

    pub fn set_editing(&mut self, id: CommentId, is_editing: bool) {
        self.store.set_editing(id, is_editing);
    }

    /// Fetches a parent's reply thread on first use, reusing the cache on
    /// later calls. Returns the thread's server-side reply count.
    pub async fn load_replies(&mut self, parent: CommentId) -> Result<u64, Error> {
        if !self.replies.is_loaded(parent) {
            let page = self
                .service
                .fetch_replies(parent, 1, REPLY_PAGE_SIZE, REPLY_SORT)
                .await?;
            self.replies.store_page(parent, page);
        }
        Ok(self
            .replies
            .thread(parent)
            .map(|t| t.total_count)
            .unwrap_or(0))
    }

    /// Creates a reply, then re-fetches the whole thread rather than patching
    /// it, absorbing any replies other users added in the meantime. Returns
    /// the new reply count.
    pub async fn add_reply(&mut self, parent: CommentId, content: &str) -> Result<u64, Error> {
        let content = content.trim();
        validate_content(content)?;
        if !self.is_authenticated() {
            return Err(Error::PermissionDenied);
        }
        self.service
            .create_comment(NewComment {
                content: content.to_string(),
                page_id: self.page_id,
                parent_id: Some(parent),
            })
            .await?;
        self.replies.invalidate(parent);
        self.load_replies(parent).await
    }

    pub fn toggle_replies(&mut self, parent: CommentId) -> bool {
        self.replies.toggle(parent)
    }

    /// Applies a remote change from the server's event feed.
    pub fn apply_event(&mut self, event: CommentEvent) {
        self.store.apply_event(event);
    }

    fn find_comment(&self, id: CommentId) -> Option<&Comment> {
        self.store.get(id).or_else(|| self.replies.find(id))
    }

    fn author_of(&self, id: CommentId) -> Option<UserId> {
        self.find_comment(id).map(|c| c.author_id())
    }
}
