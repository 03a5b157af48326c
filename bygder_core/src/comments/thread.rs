use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use super::{
    build_tree, collect_descendant_ids, count_roots, find_root, tree::index_by_id, Comment,
    CommentLike, NewComment, PagerControls, RootNode, RootPager,
};
use crate::{
    actions::{ActionState, ActionTracker},
    error::{BygderError, StoreError},
    fetch::{LatestOnly, Ticket},
    ids::{CommentId, PostId, UserId},
    roles::{authorize_delete, Actor},
    store::{CommentLikeStore, CommentStore, ProfileLookup},
};

/// Everything a discussion needs from the outside world.
pub trait DiscussionStore: CommentStore + CommentLikeStore + ProfileLookup {}

impl<T: CommentStore + CommentLikeStore + ProfileLookup> DiscussionStore for T {}

const FALLBACK_NAME: &str = "user";

/// Immutable view of one post's discussion. Replaced as a whole after every
/// action, so comments, like counts and action states never disagree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadSnapshot {
    pub comments: Vec<Comment>,
    pub like_counts: HashMap<CommentId, usize>,
    pub liked_by_me: HashSet<CommentId>,
    pub actions: ActionTracker<CommentId>,
}

impl ThreadSnapshot {
    pub fn tree(&self) -> Vec<RootNode> {
        build_tree(&self.comments)
    }

    pub fn root_count(&self) -> usize {
        count_roots(&self.comments)
    }

    /// Roots as shown by [`Self::tree`], cycle representatives included.
    /// Pagination runs on this count so every shown root is reachable.
    pub fn tree_root_count(&self) -> usize {
        self.tree().len()
    }

    /// Roots and replies together.
    pub fn total_comments(&self) -> usize {
        self.comments.len()
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn like_count(&self, id: CommentId) -> usize {
        self.like_counts.get(&id).copied().unwrap_or(0)
    }

    pub fn is_liked(&self, id: CommentId) -> bool {
        self.liked_by_me.contains(&id)
    }

    pub fn action(&self, id: CommentId) -> ActionState {
        self.actions.state(id)
    }

    fn set_likes(&mut self, likes: &[CommentLike], viewer: UserId) {
        let present: HashSet<CommentId> = self.comments.iter().map(|c| c.id).collect();
        self.like_counts = self.comments.iter().map(|c| (c.id, 0)).collect();
        self.liked_by_me.clear();
        for like in likes.iter().filter(|l| present.contains(&l.comment_id)) {
            *self.like_counts.entry(like.comment_id).or_default() += 1;
            if like.user_id == viewer {
                self.liked_by_me.insert(like.comment_id);
            }
        }
    }
}

/// Where a new comment will be attached: always the root of the thread the
/// user is answering, so replies stay one level deep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyTarget {
    pub root_id: CommentId,
    /// Name of the author of the comment actually being answered.
    pub name: String,
}

impl ReplyTarget {
    pub fn for_comment(comment: &Comment, comments: &[Comment]) -> Self {
        let index = index_by_id(comments);
        let root = find_root(comment, &index);
        Self {
            root_id: root.id,
            name: comment.display_name().unwrap_or(FALLBACK_NAME).to_string(),
        }
    }

    /// Puts `@name ` in front of `draft`, replacing any mention already
    /// leading it.
    pub fn mention_prefix(&self, draft: &str) -> String {
        let mention = format!("@{}", self.name);
        if draft.starts_with(&format!("{mention} ")) {
            return draft.to_string();
        }
        let rest = strip_leading_mention(draft);
        format!("{} ", format!("{mention} {rest}").trim())
    }
}

fn strip_leading_mention(draft: &str) -> &str {
    match draft.strip_prefix('@') {
        Some(tail) => match tail.find(char::is_whitespace).unwrap_or(tail.len()) {
            0 => draft,
            end => tail[end..].trim_start(),
        },
        None => draft,
    }
}

/// Comments fetched for one post, before they are applied.
#[derive(Clone, Debug)]
pub struct LoadedThread {
    comments: Vec<Comment>,
    likes: Option<Vec<CommentLike>>,
}

/// Reads comments, decorates them with profiles and fetches their likes.
/// Only the comment read itself can fail; the other two degrade.
pub async fn fetch_thread<S>(store: &S, post: PostId) -> Result<LoadedThread, StoreError>
where
    S: DiscussionStore + ?Sized,
{
    let mut comments = store.list_comments(post).await?;
    decorate(store, &mut comments).await;

    let ids: Vec<CommentId> = comments.iter().map(|c| c.id).collect();
    let likes = match store.list_likes(&ids).await {
        Ok(likes) => Some(likes),
        Err(err) => {
            tracing::warn!(?err, %post, "could not fetch comment likes");
            None
        }
    };

    tracing::debug!(%post, comments = comments.len(), "thread fetched");
    Ok(LoadedThread { comments, likes })
}

async fn decorate<S>(store: &S, comments: &mut [Comment])
where
    S: ProfileLookup + ?Sized,
{
    let mut authors: Vec<UserId> = comments.iter().map(|c| c.author_id).collect();
    authors.sort();
    authors.dedup();
    if authors.is_empty() {
        return;
    }
    match store.get_profiles(&authors).await {
        Ok(profiles) => {
            for comment in comments.iter_mut() {
                comment.profile = profiles.get(&comment.author_id).cloned();
            }
        }
        Err(err) => tracing::warn!(?err, "could not fetch comment profiles"),
    }
}

/// One post's discussion as seen by one viewer.
pub struct CommentThread<S> {
    store: S,
    viewer: Actor,
    post: PostId,
    snapshot: Arc<ThreadSnapshot>,
    pager: RootPager,
    reply_target: Option<ReplyTarget>,
    fetches: LatestOnly<PostId>,
}

impl<S: DiscussionStore> CommentThread<S> {
    /// `viewer.role` must come from [`crate::roles::resolve_role`].
    pub fn new(store: S, viewer: Actor, post: PostId, visible_roots: usize) -> Self {
        Self {
            store,
            viewer,
            post,
            snapshot: Arc::default(),
            pager: RootPager::new(visible_roots),
            reply_target: None,
            fetches: LatestOnly::default(),
        }
    }

    pub fn post(&self) -> PostId {
        self.post
    }

    pub fn snapshot(&self) -> Arc<ThreadSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn pager(&self) -> &RootPager {
        &self.pager
    }

    pub fn reply_target(&self) -> Option<&ReplyTarget> {
        self.reply_target.as_ref()
    }

    fn patch(&mut self, change: impl FnOnce(&mut ThreadSnapshot)) {
        let mut next = (*self.snapshot).clone();
        change(&mut next);
        self.snapshot = Arc::new(next);
    }

    /// Shows another post: empty discussion, default page, no reply target.
    pub fn switch_post(&mut self, post: PostId) {
        self.post = post;
        self.snapshot = Arc::default();
        self.pager.reset();
        self.reply_target = None;
    }

    pub fn begin_load(&mut self) -> Ticket<PostId> {
        self.fetches.start(self.post)
    }

    /// Applies a fetch result unless a newer fetch was started or the
    /// thread moved on to another post. Returns whether it was applied.
    pub fn apply_load(&mut self, ticket: &Ticket<PostId>, loaded: LoadedThread) -> bool {
        if ticket.key() != self.post {
            tracing::warn!(post = %ticket.key(), "discarding fetch for a post no longer shown");
            return false;
        }
        let Some(loaded) = self.fetches.accept(ticket, loaded) else {
            return false;
        };

        let viewer = self.viewer.user;
        self.patch(|snap| {
            snap.comments = loaded.comments;
            let live: HashSet<CommentId> = snap.comments.iter().map(|c| c.id).collect();
            match &loaded.likes {
                Some(likes) => snap.set_likes(likes, viewer),
                None => {
                    snap.like_counts.retain(|id, _| live.contains(id));
                    snap.liked_by_me.retain(|id| live.contains(id));
                }
            }
        });
        true
    }

    /// Fetches and applies the current post's discussion.
    pub async fn load(&mut self) -> Result<(), BygderError> {
        let ticket = self.begin_load();
        let loaded = fetch_thread(&self.store, ticket.key())
            .await
            .inspect_err(|err| tracing::error!(?err, post = %ticket.key(), "failed to load comments"))?;
        self.apply_load(&ticket, loaded);
        Ok(())
    }

    async fn refresh_likes(&mut self) -> Result<(), StoreError> {
        let ids: Vec<CommentId> = self.snapshot.comments.iter().map(|c| c.id).collect();
        let likes = self.store.list_likes(&ids).await?;
        let viewer = self.viewer.user;
        self.patch(|snap| snap.set_likes(&likes, viewer));
        Ok(())
    }

    /// Targets the thread of `comment` for the next [`Self::submit`].
    pub fn reply_to(&mut self, comment: CommentId) -> Result<&ReplyTarget, BygderError> {
        let snapshot = &self.snapshot;
        let comment = snapshot.get(comment).ok_or(BygderError::NotFound("comment"))?;
        let target = ReplyTarget::for_comment(comment, &snapshot.comments);
        Ok(self.reply_target.insert(target))
    }

    pub fn cancel_reply(&mut self) {
        self.reply_target = None;
    }

    /// Posts `content` as a new root, or as a reply to the current target.
    pub async fn submit(&mut self, content: &str) -> Result<Comment, BygderError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(BygderError::EmptyContent);
        }

        let new = NewComment {
            post_id: self.post,
            author_id: self.viewer.user,
            content: content.to_string(),
            parent_id: self.reply_target.as_ref().map(|t| t.root_id),
        };
        let is_root = new.parent_id.is_none();

        let mut created = self
            .store
            .create_comment(new)
            .await
            .inspect_err(|err| tracing::error!(?err, "failed to create comment"))?;

        match self.store.get_profiles(&[created.author_id]).await {
            Ok(mut profiles) => created.profile = profiles.remove(&created.author_id),
            Err(err) => tracing::warn!(?err, "could not load profile for new comment"),
        }

        let comment = created.clone();
        self.patch(|snap| {
            snap.like_counts.insert(comment.id, 0);
            snap.liked_by_me.remove(&comment.id);
            snap.comments.push(comment);
        });
        if is_root {
            let roots = self.snapshot.tree_root_count();
            self.pager.root_added(roots);
        }
        self.reply_target = None;

        Ok(created)
    }

    pub fn can_delete(&self, comment: &Comment) -> bool {
        authorize_delete(&self.viewer, comment.author_id).is_ok()
    }

    /// Likes or unlikes `comment` for the viewer, then re-reads like counts.
    pub async fn toggle_like(&mut self, comment: CommentId) -> Result<(), BygderError> {
        if self.snapshot.get(comment).is_none() {
            return Err(BygderError::NotFound("comment"));
        }
        let mut actions = self.snapshot.actions.clone();
        actions.begin(comment)?;
        self.patch(|snap| snap.actions = actions);

        let liked = self.snapshot.is_liked(comment);
        let user = self.viewer.user;
        let outcome = if liked {
            self.store.remove_like(comment, user).await
        } else {
            self.store.add_like(comment, user).await
        };
        let outcome = match outcome {
            Ok(()) => self.refresh_likes().await,
            Err(err) => Err(err),
        };
        let outcome = outcome
            .map_err(BygderError::from)
            .inspect_err(|err| tracing::error!(?err, %comment, "failed to toggle like"));

        self.finish(comment, outcome)
    }

    /// Deletes `comment` and every reply below it.
    pub async fn delete(&mut self, comment: CommentId) -> Result<(), BygderError> {
        let author = self
            .snapshot
            .get(comment)
            .map(|c| c.author_id)
            .ok_or(BygderError::NotFound("comment"))?;
        authorize_delete(&self.viewer, author)?;

        let mut actions = self.snapshot.actions.clone();
        actions.begin(comment)?;
        self.patch(|snap| snap.actions = actions);

        if let Err(err) = self.store.delete_comment(comment).await {
            tracing::error!(?err, %comment, "failed to delete comment");
            return self.finish(comment, Err(err.into()));
        }

        let removed = collect_descendant_ids(comment, &self.snapshot.comments);
        self.patch(|snap| {
            snap.comments.retain(|c| !removed.contains(&c.id));
            for id in &removed {
                snap.like_counts.remove(id);
                snap.liked_by_me.remove(id);
                if *id != comment {
                    snap.actions.forget(*id);
                }
            }
        });
        let roots = self.snapshot.tree_root_count();
        self.pager.comments_removed(&removed, roots);
        if self
            .reply_target
            .as_ref()
            .is_some_and(|t| removed.contains(&t.root_id))
        {
            self.reply_target = None;
        }

        if let Err(err) = self.refresh_likes().await {
            tracing::warn!(?err, "could not refresh likes after delete");
        }
        tracing::debug!(%comment, removed = removed.len(), "comment removed from thread");
        self.finish(comment, Ok(()))
    }

    fn finish<T>(&mut self, comment: CommentId, outcome: Result<T, BygderError>) -> Result<T, BygderError> {
        let mut actions = self.snapshot.actions.clone();
        let outcome = actions.finish(comment, outcome);
        self.patch(|snap| snap.actions = actions);
        outcome
    }

    pub fn tree(&self) -> Vec<RootNode> {
        self.snapshot.tree()
    }

    /// The roots currently on the page.
    pub fn visible_roots(&self) -> Vec<RootNode> {
        let tree = self.tree();
        self.pager.visible_roots(&tree).to_vec()
    }

    pub fn controls(&self) -> PagerControls {
        self.pager.controls(self.snapshot.tree_root_count())
    }

    pub fn show_more(&mut self) {
        let roots = self.snapshot.tree_root_count();
        self.pager.show_more(roots);
    }

    pub fn show_less(&mut self) {
        self.pager.show_less();
    }

    pub fn toggle_replies(&mut self, root: CommentId) {
        self.pager.toggle_replies(root);
    }

    pub fn replies_shown(&self, root: CommentId) -> bool {
        self.pager.replies_shown(root, self.snapshot.tree_root_count())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        comments::Profile,
        error::Denied,
        roles::Role,
        store::{sea::test_support::setup_test_store, SeaStore},
    };

    /// Delegates to a real store until told to fail.
    #[derive(Clone)]
    struct FlakyStore {
        inner: SeaStore,
        failing: Arc<AtomicBool>,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::NotFound("backend"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CommentStore for FlakyStore {
        async fn list_comments(&self, post: PostId) -> Result<Vec<Comment>, StoreError> {
            self.check()?;
            self.inner.list_comments(post).await
        }

        async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
            self.check()?;
            self.inner.create_comment(comment).await
        }

        async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete_comment(id).await
        }
    }

    #[async_trait]
    impl CommentLikeStore for FlakyStore {
        async fn list_likes(&self, comments: &[CommentId]) -> Result<Vec<CommentLike>, StoreError> {
            self.check()?;
            self.inner.list_likes(comments).await
        }

        async fn add_like(&self, comment: CommentId, user: UserId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.add_like(comment, user).await
        }

        async fn remove_like(&self, comment: CommentId, user: UserId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.remove_like(comment, user).await
        }
    }

    #[async_trait]
    impl ProfileLookup for FlakyStore {
        async fn get_profiles(
            &self,
            users: &[UserId],
        ) -> Result<HashMap<UserId, Profile>, StoreError> {
            self.check()?;
            self.inner.get_profiles(users).await
        }
    }

    fn viewer(role: Role) -> Actor {
        Actor {
            user: UserId::new(),
            role,
        }
    }

    async fn seed(store: &SeaStore, post: PostId, parent: Option<CommentId>) -> Comment {
        store
            .create_comment(NewComment {
                post_id: post,
                author_id: UserId::new(),
                content: "seed".to_string(),
                parent_id: parent,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_load_builds_flattened_tree() {
        let store = setup_test_store().await;
        let post = PostId::new();
        let a = seed(&store, post, None).await;
        let b = seed(&store, post, Some(a.id)).await;
        let c = seed(&store, post, Some(b.id)).await;
        let d = seed(&store, post, None).await;

        let mut thread = CommentThread::new(store, viewer(Role::Member), post, 2);
        thread.load().await.unwrap();

        let tree = thread.tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, a.id);
        assert_eq!(
            tree[0].children.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![b.id, c.id]
        );
        assert_eq!(tree[1].comment.id, d.id);
        assert!(tree[1].children.is_empty());
        assert_eq!(thread.snapshot().total_comments(), 4);
        assert_eq!(thread.controls(), PagerControls::default());
    }

    #[tokio::test]
    async fn test_reply_attaches_to_thread_root() {
        let store = setup_test_store().await;
        let post = PostId::new();
        let author = UserId::new();
        store
            .upsert_profile(
                author,
                Profile {
                    display_name: "Ola".into(),
                    avatar_url: None,
                },
            )
            .await
            .unwrap();
        let root = seed(&store, post, None).await;
        let nested = store
            .create_comment(NewComment {
                post_id: post,
                author_id: author,
                content: "svar".into(),
                parent_id: Some(root.id),
            })
            .await
            .unwrap();

        let mut thread = CommentThread::new(store, viewer(Role::Member), post, 2);
        thread.load().await.unwrap();

        let target = thread.reply_to(nested.id).unwrap().clone();
        assert_eq!(target.root_id, root.id);
        assert_eq!(target.mention_prefix("takk"), "@Ola takk ");

        let reply = thread.submit("  @Ola takk  ").await.unwrap();
        assert_eq!(reply.parent_id, Some(root.id));
        assert_eq!(reply.content, "@Ola takk");
        assert!(thread.reply_target().is_none());

        let tree = thread.tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(thread.snapshot().like_count(reply.id), 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_content() {
        let store = setup_test_store().await;
        let mut thread = CommentThread::new(store, viewer(Role::Member), PostId::new(), 2);
        assert!(matches!(thread.submit("   ").await, Err(BygderError::EmptyContent)));
        assert_eq!(thread.snapshot().total_comments(), 0);
    }

    #[tokio::test]
    async fn test_new_roots_stay_visible() {
        let store = setup_test_store().await;
        let mut thread = CommentThread::new(store, viewer(Role::Member), PostId::new(), 2);

        for text in ["en", "to", "tre"] {
            thread.submit(text).await.unwrap();
        }

        assert_eq!(thread.visible_roots().len(), 3);
        assert!(thread.controls().show_less);
        thread.show_less();
        assert_eq!(thread.visible_roots().len(), 2);
        assert!(thread.controls().show_more);
        thread.show_more();
        assert_eq!(thread.visible_roots().len(), 3);
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let store = setup_test_store().await;
        let post = PostId::new();
        let c = seed(&store, post, None).await;

        let mut thread = CommentThread::new(store, viewer(Role::Member), post, 2);
        thread.load().await.unwrap();

        thread.toggle_like(c.id).await.unwrap();
        let snap = thread.snapshot();
        assert!(snap.is_liked(c.id));
        assert_eq!(snap.like_count(c.id), 1);
        assert_eq!(snap.action(c.id), ActionState::Done);

        thread.toggle_like(c.id).await.unwrap();
        assert!(!thread.snapshot().is_liked(c.id));
        assert_eq!(thread.snapshot().like_count(c.id), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_locally() {
        let store = setup_test_store().await;
        let post = PostId::new();
        let a = seed(&store, post, None).await;
        let b = seed(&store, post, Some(a.id)).await;
        seed(&store, post, Some(b.id)).await;
        let d = seed(&store, post, None).await;

        let mut thread = CommentThread::new(store.clone(), viewer(Role::Moderator), post, 2);
        thread.load().await.unwrap();
        thread.toggle_replies(a.id);

        thread.delete(a.id).await.unwrap();

        let snap = thread.snapshot();
        assert_eq!(snap.total_comments(), 1);
        assert_eq!(snap.root_count(), 1);
        assert_eq!(thread.tree()[0].comment.id, d.id);
        assert!(!thread.replies_shown(a.id));
        assert_eq!(store.list_comments(post).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_member_cannot_delete_others_comment() {
        let store = setup_test_store().await;
        let post = PostId::new();
        let c = seed(&store, post, None).await;

        let mut thread = CommentThread::new(store.clone(), viewer(Role::Member), post, 2);
        thread.load().await.unwrap();

        assert!(!thread.can_delete(&c));
        let err = thread.delete(c.id).await.unwrap_err();
        assert!(matches!(err, BygderError::Denied(Denied::NotAuthorOrModerator)));
        // nothing reached the store
        assert_eq!(store.list_comments(post).await.unwrap().len(), 1);
        assert_eq!(thread.snapshot().action(c.id), ActionState::Idle);
    }

    #[tokio::test]
    async fn test_guest_author_deletes_own_comment() {
        let store = setup_test_store().await;
        let post = PostId::new();
        let guest = viewer(Role::Guest);

        let mut thread = CommentThread::new(store, guest, post, 2);
        let mine = thread.submit("mitt").await.unwrap();

        assert!(thread.can_delete(&mine));
        thread.delete(mine.id).await.unwrap();
        assert_eq!(thread.snapshot().total_comments(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_snapshot() {
        let inner = setup_test_store().await;
        let post = PostId::new();
        let c = seed(&inner, post, None).await;
        let failing = Arc::new(AtomicBool::new(false));
        let store = FlakyStore {
            inner,
            failing: failing.clone(),
        };

        let mut thread = CommentThread::new(store, viewer(Role::Owner), post, 2);
        thread.load().await.unwrap();
        let before = thread.snapshot();

        failing.store(true, Ordering::SeqCst);
        let err = thread.delete(c.id).await.unwrap_err();
        assert!(matches!(err, BygderError::Store(_)));
        assert!(matches!(thread.snapshot().action(c.id), ActionState::Failed(_)));
        assert_eq!(thread.snapshot().comments, before.comments);

        assert!(thread.load().await.is_err());
        assert_eq!(thread.snapshot().comments, before.comments);

        // the failed action can be retried once the backend recovers
        failing.store(false, Ordering::SeqCst);
        thread.delete(c.id).await.unwrap();
        assert_eq!(thread.snapshot().total_comments(), 0);
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let store = setup_test_store().await;
        let post = PostId::new();
        seed(&store, post, None).await;

        let mut thread = CommentThread::new(store.clone(), viewer(Role::Member), post, 2);
        let stale = thread.begin_load();
        let stale_data = fetch_thread(&store, post).await.unwrap();

        seed(&store, post, None).await;
        let fresh = thread.begin_load();
        let fresh_data = fetch_thread(&store, post).await.unwrap();

        assert!(thread.apply_load(&fresh, fresh_data));
        assert!(!thread.apply_load(&stale, stale_data));
        assert_eq!(thread.snapshot().total_comments(), 2);

        let old_post = thread.begin_load();
        let old_data = fetch_thread(&store, post).await.unwrap();
        thread.switch_post(PostId::new());
        assert!(!thread.apply_load(&old_post, old_data));
        assert_eq!(thread.snapshot().total_comments(), 0);
    }

    #[tokio::test]
    async fn test_orphaned_reply_becomes_root_after_reload() {
        let store = setup_test_store().await;
        let post = PostId::new();
        let root = seed(&store, post, None).await;

        let mut thread = CommentThread::new(store.clone(), viewer(Role::Member), post, 2);
        thread.load().await.unwrap();
        thread.reply_to(root.id).unwrap();

        // another client deletes the root while this reply is in flight
        store.delete_comment(root.id).await.unwrap();
        let reply = thread.submit("for sent").await.unwrap();
        assert_eq!(reply.parent_id, Some(root.id));

        thread.load().await.unwrap();
        let tree = thread.tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, reply.id);
        assert_eq!(thread.snapshot().root_count(), 1);
    }

    #[tokio::test]
    async fn test_cycle_root_is_reachable_through_pager() {
        use crate::comments::fixtures::{cid, comment};

        let store = setup_test_store().await;
        let post = comment(1, None, 0).post_id;
        let mut thread = CommentThread::new(store, viewer(Role::Member), post, 2);

        let ticket = thread.begin_load();
        let loaded = LoadedThread {
            comments: vec![
                comment(1, None, 1),
                comment(2, None, 2),
                comment(5, Some(6), 3),
                comment(6, Some(5), 4),
            ],
            likes: None,
        };
        assert!(thread.apply_load(&ticket, loaded));

        let snap = thread.snapshot();
        assert_eq!(snap.root_count(), 2);
        assert_eq!(snap.tree_root_count(), 3);

        assert_eq!(thread.visible_roots().len(), 2);
        assert!(thread.controls().show_more);
        thread.show_more();

        let shown: Vec<_> = thread.visible_roots().iter().map(|r| r.comment.id).collect();
        assert_eq!(shown.len(), 3);
        assert!(shown.contains(&cid(5)));
        assert!(thread.controls().show_less);
        assert!(thread.replies_shown(cid(5)));
    }

    #[test]
    fn test_mention_prefix() {
        let target = ReplyTarget {
            root_id: CommentId::new(),
            name: "Kari".into(),
        };
        assert_eq!(target.mention_prefix(""), "@Kari ");
        assert_eq!(target.mention_prefix("@Kari hei"), "@Kari hei");
        assert_eq!(target.mention_prefix("@Ola  hei"), "@Kari hei ");
        assert_eq!(target.mention_prefix("hei"), "@Kari hei ");
        // a bare `@` is not a mention
        assert_eq!(target.mention_prefix("@ hei"), "@Kari @ hei ");
        assert_eq!(target.mention_prefix("@"), "@Kari @ ");
    }
}
