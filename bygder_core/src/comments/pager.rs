use std::collections::HashSet;

use super::RootNode;
use crate::ids::CommentId;

/// Which pagination buttons apply to the current discussion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PagerControls {
    pub show_more: bool,
    pub show_less: bool,
}

/// Display state layered over a built tree: how many roots are visible and
/// which roots have their replies expanded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootPager {
    default_visible: usize,
    visible: usize,
    expanded: HashSet<CommentId>,
}

impl RootPager {
    pub fn new(default_visible: usize) -> Self {
        Self {
            default_visible,
            visible: default_visible,
            expanded: HashSet::new(),
        }
    }

    /// Back to the initial state, e.g. when switching to another post.
    pub fn reset(&mut self) {
        self.visible = self.default_visible;
        self.expanded.clear();
    }

    pub fn visible_count(&self, root_count: usize) -> usize {
        self.visible.min(root_count)
    }

    pub fn visible_roots<'a>(&self, roots: &'a [RootNode]) -> &'a [RootNode] {
        &roots[..self.visible_count(roots.len())]
    }

    fn has_overflow(&self, root_count: usize) -> bool {
        root_count > self.default_visible
    }

    pub fn controls(&self, root_count: usize) -> PagerControls {
        if !self.has_overflow(root_count) {
            return PagerControls::default();
        }
        let shown = self.visible_count(root_count);
        PagerControls {
            show_more: shown < root_count,
            show_less: shown == root_count,
        }
    }

    pub fn show_more(&mut self, root_count: usize) {
        self.visible = if root_count == 0 {
            self.default_visible
        } else {
            root_count
        };
    }

    /// Collapses to the default page and closes every reply list.
    pub fn show_less(&mut self) {
        self.reset();
    }

    pub fn toggle_replies(&mut self, root: CommentId) {
        if !self.expanded.remove(&root) {
            self.expanded.insert(root);
        }
    }

    /// Replies are shown when expanded individually, or for every root once
    /// the whole overflowing list is open.
    pub fn replies_shown(&self, root: CommentId, root_count: usize) -> bool {
        let all_open = self.has_overflow(root_count) && self.visible == root_count;
        all_open || self.expanded.contains(&root)
    }

    /// A new root comment was posted; grow the page so it stays in view.
    pub fn root_added(&mut self, root_count: usize) {
        self.visible = root_count.min((self.visible + 1).max(self.default_visible));
    }

    /// Comments were deleted; drop their expansion flags and clamp the page.
    pub fn comments_removed<'a>(
        &mut self,
        removed: impl IntoIterator<Item = &'a CommentId>,
        root_count: usize,
    ) {
        for id in removed {
            self.expanded.remove(id);
        }
        self.visible = if root_count == 0 {
            self.default_visible
        } else {
            self.visible.min(root_count)
        };
    }
}
