//! Post discussions: comment records, the flattened display tree built from
//! them, root pagination, and the per-post thread controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, PostId, UserId};

pub mod pager;
pub mod thread;
pub mod tree;

pub use pager::{PagerControls, RootPager};
pub use thread::{fetch_thread, CommentThread, DiscussionStore, LoadedThread, ReplyTarget, ThreadSnapshot};
pub use tree::{build_tree, collect_descendant_ids, count_roots, find_root, RootNode};

/// Display metadata for a user. Optional everywhere it appears.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    /// Kept as stored, even when the parent is missing from the current set.
    pub parent_id: Option<CommentId>,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl Comment {
    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.display_name.as_str())
    }
}

/// Input for [`crate::store::CommentStore::create_comment`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub parent_id: Option<CommentId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommentLike {
    pub comment_id: CommentId,
    pub user_id: UserId,
}
