use std::{path::Path, sync::Arc};

use tokio::sync::OnceCell;

use crate::{
    comments::CommentThread,
    error::BygderError,
    ids::{CommunityId, PostId, UserId},
    roles::{Actor, Moderation},
    store::{CommunityStore, SeaStore},
};

pub mod actions;
pub mod comments;
pub mod config;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod ids;
pub mod logging;
pub mod models;
pub mod roles;
pub mod store;

static BYGDER_CORE: OnceCell<Arc<BygderCore>> = OnceCell::const_new();

/// Process-wide core, started from the default data directory on first use.
pub async fn core() -> Result<Arc<BygderCore>, Box<dyn std::error::Error>> {
    BYGDER_CORE
        .get_or_try_init(|| async move { BygderCore::start().await.map(Arc::new) })
        .await
        .cloned()
}

/// Configuration plus the store every controller is built on.
pub struct BygderCore {
    pub config: config::BygderConfig,
    pub store: SeaStore,
}

impl BygderCore {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let config = config::get_or_init().await?;
        Self::with_config(config).await
    }

    /// Like [`Self::start`], but keeps config and database under `dir`.
    pub async fn start_at(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config::load_or_init_at(dir).await?;
        Self::with_config(config).await
    }

    async fn with_config(config: config::BygderConfig) -> Result<Self, Box<dyn std::error::Error>> {
        logging::init(&config.log_filter);
        tracing::info!(database = %config.database_path.display(), "starting bygder core");

        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        Ok(Self {
            config,
            store: SeaStore::new(db),
        })
    }

    /// Discussion of `post` for `viewer`, not yet loaded.
    pub fn thread(&self, viewer: Actor, post: PostId) -> CommentThread<SeaStore> {
        CommentThread::new(self.store.clone(), viewer, post, self.config.visible_roots)
    }

    pub async fn moderation(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Moderation<SeaStore>, BygderError> {
        let community = self.store.get_community(community).await?;
        Moderation::open(self.store.clone(), &community, user).await
    }
}

pub mod prelude {
    pub use super::actions::{ActionState, ActionTracker};
    pub use super::comments::{
        Comment, CommentThread, NewComment, Profile, ReplyTarget, RootNode, ThreadSnapshot,
    };
    pub use super::config::BygderConfig;
    pub use super::error::{BygderError, Denied, StoreError};
    pub use super::ids::{CommentId, CommunityId, PostId, UserId};
    pub use super::roles::{resolve_role, resolve_role_from_store, Actor, Community, Moderation, Role, Roster};
    pub use super::store::{
        CommentLikeStore, CommentStore, CommunityStore, MembershipStore, ProfileLookup, SeaStore,
    };
    pub use super::BygderCore;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{roles::Role, store::MembershipStore};

    #[tokio::test]
    async fn test_start_at_wires_controllers() {
        let dir = tempfile::tempdir().unwrap();
        let core = BygderCore::start_at(dir.path()).await.unwrap();

        let owner = UserId::new();
        let community = core
            .store
            .create_community("Sørbygda".into(), owner)
            .await
            .unwrap();
        core.store.add_membership(community.id, owner).await.unwrap();

        let moderation = core.moderation(community.id, owner).await.unwrap();
        assert_eq!(moderation.actor().role, Role::Owner);
        assert_eq!(moderation.roster().summary().owners, 1);

        let mut thread = core.thread(*moderation.actor(), PostId::new());
        thread.submit("hei").await.unwrap();
        thread.load().await.unwrap();
        assert_eq!(thread.snapshot().total_comments(), 1);
    }
}
