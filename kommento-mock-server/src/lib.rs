use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use kommento_api::{
    AuthToken, Comment, CommentEvent, CommentId, CommentPage, CommentService, EditComment, Error,
    NewComment, NewSession, NewUser, PageId, Pagination, SortBy, Time, User, UserId, Uuid,
    VoteKind, VoteReceipt,
};
use tokio::sync::{mpsc, Mutex};

/// In-memory comment backend: the demo-mode implementation of
/// [`CommentService`] and the fixture the integration tests run against.
/// Votes are per-user id sets, so tallies are always the set sizes.
pub struct MockServer {
    users: HashMap<UserId, MockUser>,
    sessions: HashMap<AuthToken, UserId>,
    comments: HashMap<CommentId, StoredComment>,
    feeds: Vec<mpsc::UnboundedSender<CommentEvent>>,
    clock: Time,
}

#[derive(Debug)]
struct MockUser {
    user: User,
    password: String,
}

#[derive(Debug)]
struct StoredComment {
    id: CommentId,
    author: UserId,
    page_id: PageId,
    parent_id: Option<CommentId>,
    content: String,
    likes: HashSet<UserId>,
    dislikes: HashSet<UserId>,
    created_at: Time,
    updated_at: Time,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            users: HashMap::new(),
            sessions: HashMap::new(),
            comments: HashMap::new(),
            feeds: Vec::new(),
            clock: Utc::now(),
        }
    }

    /// Current number of stored comments, replies included.
    pub fn test_num_comments(&self) -> usize {
        self.comments.len()
    }

    // Timestamps are forced strictly increasing so that sort order is stable
    // even when calls land within one clock tick.
    fn now(&mut self) -> Time {
        let next = Utc::now().max(self.clock + Duration::milliseconds(1));
        self.clock = next;
        next
    }

    pub fn admin_create_user(&mut self, u: NewUser, password: String) -> Result<(), Error> {
        u.validate()?;
        if self.users.values().any(|m| m.user.email == u.email) {
            return Err(Error::EmailAlreadyUsed(u.email));
        }
        let created_at = self.now();
        self.users.insert(
            u.id,
            MockUser {
                user: User {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                    avatar_url: None,
                    created_at,
                },
                password,
            },
        );
        Ok(())
    }

    pub fn auth(&mut self, s: NewSession) -> Result<AuthToken, Error> {
        s.validate()?;
        for u in self.users.values() {
            if u.user.email == s.email {
                if u.password != s.password {
                    return Err(Error::PermissionDenied);
                }
                let token = AuthToken(Uuid::new_v4());
                self.sessions.insert(token, u.user.id);
                return Ok(token);
            }
        }
        Err(Error::PermissionDenied)
    }

    pub fn unauth(&mut self, token: AuthToken) -> Result<(), Error> {
        match self.sessions.remove(&token) {
            Some(_) => Ok(()),
            None => Err(Error::PermissionDenied),
        }
    }

    /// Subscribes to the in-process change feed. Senders for dropped
    /// receivers are pruned on the next relay.
    pub fn event_feed(&mut self) -> mpsc::UnboundedReceiver<CommentEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.feeds.push(sender);
        receiver
    }

    fn relay_event(&mut self, e: CommentEvent) {
        self.feeds.retain_mut(|f| f.send(e.clone()).is_ok());
    }

    // Reading is open to anonymous viewers; a presented token must still be a
    // live session.
    fn viewer(&self, token: Option<AuthToken>) -> Result<Option<UserId>, Error> {
        match token {
            None => Ok(None),
            Some(token) => match self.sessions.get(&token) {
                Some(uid) => Ok(Some(*uid)),
                None => Err(Error::PermissionDenied),
            },
        }
    }

    fn require(&self, token: Option<AuthToken>) -> Result<UserId, Error> {
        self.viewer(token)?.ok_or(Error::PermissionDenied)
    }

    fn view(&self, c: &StoredComment, viewer: Option<UserId>) -> Comment {
        let user_vote = viewer.and_then(|uid| {
            if c.likes.contains(&uid) {
                Some(VoteKind::Like)
            } else if c.dislikes.contains(&uid) {
                Some(VoteKind::Dislike)
            } else {
                None
            }
        });
        Comment {
            id: c.id,
            content: c.content.clone(),
            author: self
                .users
                .get(&c.author)
                .expect("comment author missing from users table")
                .user
                .clone(),
            page_id: c.page_id,
            parent_id: c.parent_id,
            likes: c.likes.len() as u64,
            dislikes: c.dislikes.len() as u64,
            user_vote,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }

    fn receipt(c: &StoredComment, viewer: UserId) -> VoteReceipt {
        let user_vote = if c.likes.contains(&viewer) {
            Some(VoteKind::Like)
        } else if c.dislikes.contains(&viewer) {
            Some(VoteKind::Dislike)
        } else {
            None
        };
        VoteReceipt {
            id: c.id,
            likes: c.likes.len() as u64,
            dislikes: c.dislikes.len() as u64,
            user_vote,
        }
    }

    fn page_of(
        &self,
        mut matching: Vec<&StoredComment>,
        page: u32,
        limit: u32,
        sort: SortBy,
        viewer: Option<UserId>,
    ) -> CommentPage {
        match sort {
            SortBy::Newest => matching.sort_unstable_by_key(|c| (Reverse(c.created_at), c.id)),
            SortBy::Oldest => matching.sort_unstable_by_key(|c| (c.created_at, c.id)),
            SortBy::MostLiked => matching
                .sort_unstable_by_key(|c| (Reverse(c.likes.len()), Reverse(c.created_at), c.id)),
            SortBy::MostDisliked => matching
                .sort_unstable_by_key(|c| (Reverse(c.dislikes.len()), Reverse(c.created_at), c.id)),
        }
        let total = matching.len() as u64;
        let start = (page.max(1) as usize - 1).saturating_mul(limit as usize);
        let comments = matching
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .map(|c| self.view(c, viewer))
            .collect();
        CommentPage {
            comments,
            pagination: Pagination::compute(page, limit, total),
        }
    }

    pub fn fetch_comments(
        &self,
        token: Option<AuthToken>,
        page_id: PageId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error> {
        let viewer = self.viewer(token)?;
        let matching = self
            .comments
            .values()
            .filter(|c| c.page_id == page_id && c.parent_id.is_none())
            .collect();
        Ok(self.page_of(matching, page, limit, sort, viewer))
    }

    pub fn fetch_replies(
        &self,
        token: Option<AuthToken>,
        parent: CommentId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error> {
        let viewer = self.viewer(token)?;
        if !self.comments.contains_key(&parent) {
            return Err(Error::NotFound(parent.0));
        }
        let matching = self
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent))
            .collect();
        Ok(self.page_of(matching, page, limit, sort, viewer))
    }

    pub fn create_comment(
        &mut self,
        token: Option<AuthToken>,
        new: NewComment,
    ) -> Result<Comment, Error> {
        let author = self.require(token)?;
        kommento_api::validate_content(&new.content)?;
        if let Some(parent) = new.parent_id {
            let parent = self
                .comments
                .get(&parent)
                .ok_or(Error::NotFound(parent.0))?;
            if parent.parent_id.is_some() {
                return Err(Error::NestedReply(parent.id.0));
            }
        }
        let now = self.now();
        let stored = StoredComment {
            id: CommentId(Uuid::new_v4()),
            author,
            page_id: new.page_id,
            parent_id: new.parent_id,
            content: new.content,
            likes: HashSet::new(),
            dislikes: HashSet::new(),
            created_at: now,
            updated_at: now,
        };
        let id = stored.id;
        self.comments.insert(id, stored);
        let relayed = self.view(&self.comments[&id], None);
        self.relay_event(CommentEvent::Added(relayed));
        Ok(self.view(&self.comments[&id], Some(author)))
    }

    pub fn update_comment(
        &mut self,
        token: Option<AuthToken>,
        id: CommentId,
        edit: EditComment,
    ) -> Result<Comment, Error> {
        let editor = self.require(token)?;
        kommento_api::validate_content(&edit.content)?;
        let now = self.now();
        let c = self.comments.get_mut(&id).ok_or(Error::NotFound(id.0))?;
        if c.author != editor {
            return Err(Error::PermissionDenied);
        }
        c.content = edit.content;
        c.updated_at = now;
        let relayed = self.view(&self.comments[&id], None);
        self.relay_event(CommentEvent::Updated(relayed));
        Ok(self.view(&self.comments[&id], Some(editor)))
    }

    /// Deleting a comment also deletes its replies.
    pub fn delete_comment(&mut self, token: Option<AuthToken>, id: CommentId) -> Result<(), Error> {
        let editor = self.require(token)?;
        let c = self.comments.get(&id).ok_or(Error::NotFound(id.0))?;
        if c.author != editor {
            return Err(Error::PermissionDenied);
        }
        let mut gone = vec![id];
        gone.extend(
            self.comments
                .values()
                .filter(|c| c.parent_id == Some(id))
                .map(|c| c.id),
        );
        for id in gone {
            self.comments.remove(&id);
            self.relay_event(CommentEvent::Deleted(id));
        }
        Ok(())
    }

    /// Toggle-or-switch semantics, mirrored by the client's optimistic
    /// arithmetic: voting the same way twice retracts, voting the other way
    /// moves the user between the two sets.
    pub fn vote(
        &mut self,
        token: Option<AuthToken>,
        id: CommentId,
        kind: VoteKind,
    ) -> Result<VoteReceipt, Error> {
        let voter = self.require(token)?;
        let c = self.comments.get_mut(&id).ok_or(Error::NotFound(id.0))?;
        let (chosen, other) = match kind {
            VoteKind::Like => (&mut c.likes, &mut c.dislikes),
            VoteKind::Dislike => (&mut c.dislikes, &mut c.likes),
        };
        if !chosen.remove(&voter) {
            other.remove(&voter);
            chosen.insert(voter);
        }
        let receipt = Self::receipt(c, voter);
        let mut relayed = receipt.clone();
        relayed.user_vote = None;
        self.relay_event(CommentEvent::Voted(relayed));
        Ok(receipt)
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

/// Demo-mode [`CommentService`]: the same interface as the HTTP client,
/// backed by a shared in-memory [`MockServer`]. Constructed with whatever
/// token the external auth collaborator holds (or none for read-only use).
#[derive(Clone)]
pub struct DemoService {
    server: Arc<Mutex<MockServer>>,
    token: Option<AuthToken>,
}

impl DemoService {
    pub fn new(server: Arc<Mutex<MockServer>>, token: Option<AuthToken>) -> DemoService {
        DemoService { server, token }
    }
}

#[async_trait]
impl CommentService for DemoService {
    async fn fetch_comments(
        &self,
        page_id: PageId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error> {
        self.server
            .lock()
            .await
            .fetch_comments(self.token, page_id, page, limit, sort)
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment, Error> {
        self.server.lock().await.create_comment(self.token, new)
    }

    async fn update_comment(&self, id: CommentId, edit: EditComment) -> Result<Comment, Error> {
        self.server.lock().await.update_comment(self.token, id, edit)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        self.server.lock().await.delete_comment(self.token, id)
    }

    async fn vote(&self, id: CommentId, kind: VoteKind) -> Result<VoteReceipt, Error> {
        self.server.lock().await.vote(self.token, id, kind)
    }

    async fn fetch_replies(
        &self,
        parent: CommentId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error> {
        self.server
            .lock()
            .await
            .fetch_replies(self.token, parent, page, limit, sort)
    }
}
