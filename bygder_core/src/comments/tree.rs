use std::collections::{HashMap, HashSet};

use super::Comment;
use crate::ids::CommentId;

/// A thread root with every transitive reply flattened beneath it.
///
/// `children` holds plain [`Comment`]s, so a reply can never carry nested
/// replies of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootNode {
    pub comment: Comment,
    pub children: Vec<Comment>,
}

/// Arena view over one discussion: positions into the input slice plus the
/// id and parent maps derived from it. Rebuilt from scratch for every call.
struct Arena<'a> {
    comments: &'a [Comment],
    by_id: HashMap<CommentId, usize>,
    children: HashMap<usize, Vec<usize>>,
}

impl<'a> Arena<'a> {
    fn new(comments: &'a [Comment]) -> Self {
        let mut by_id = HashMap::with_capacity(comments.len());
        for (idx, comment) in comments.iter().enumerate() {
            // first occurrence wins on duplicate ids
            by_id.entry(comment.id).or_insert(idx);
        }

        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, comment) in comments.iter().enumerate() {
            if let Some(parent) = Self::resolve(&by_id, comment) {
                if parent != idx {
                    children.entry(parent).or_default().push(idx);
                }
            }
        }

        Self {
            comments,
            by_id,
            children,
        }
    }

    fn resolve(by_id: &HashMap<CommentId, usize>, comment: &Comment) -> Option<usize> {
        comment.parent_id.and_then(|parent| by_id.get(&parent).copied())
    }

    fn parent_of(&self, idx: usize) -> Option<usize> {
        Self::resolve(&self.by_id, &self.comments[idx]).filter(|&parent| parent != idx)
    }

    fn is_natural_root(&self, idx: usize) -> bool {
        self.parent_of(idx).is_none()
    }

    /// Walks parent links up from `start`. On a cycle, the member with the
    /// lowest id stands in as the root, matching [`find_root`].
    fn climb(&self, start: usize) -> usize {
        let mut path = vec![start];
        let mut on_path = HashSet::from([start]);
        let mut current = start;

        while let Some(parent) = self.parent_of(current) {
            if !on_path.insert(parent) {
                let cycle_start = path.iter().position(|&i| i == parent).unwrap_or(0);
                let representative = path[cycle_start..]
                    .iter()
                    .copied()
                    .min_by_key(|&i| self.comments[i].id)
                    .unwrap_or(parent);
                tracing::warn!(
                    comment = %self.comments[representative].id,
                    "reply cycle detected, treating comment as a thread root"
                );
                return representative;
            }
            path.push(parent);
            current = parent;
        }
        current
    }

    /// Every index reachable below `root`, skipping anything already seen.
    fn descendants(&self, root: usize, seen: &mut HashSet<usize>) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            for &child in self.children.get(&idx).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(child) {
                    found.push(child);
                    stack.push(child);
                }
            }
        }
        found
    }

    fn sort_chronologically(&self, indices: &mut [usize]) {
        indices.sort_by_key(|&idx| (self.comments[idx].created_at, idx));
    }
}

/// Builds the display tree for one discussion.
///
/// Roots are comments without a parent in `comments`; each root lists all of
/// its transitive replies, oldest first. Roots are ordered oldest first too,
/// with ties kept in input order. Comments caught in a parent cycle are not
/// dropped: one member of the cycle becomes a root.
pub fn build_tree(comments: &[Comment]) -> Vec<RootNode> {
    let arena = Arena::new(comments);
    let mut seen = HashSet::with_capacity(comments.len());
    let mut roots = Vec::new();

    for idx in 0..comments.len() {
        if arena.is_natural_root(idx) && seen.insert(idx) {
            roots.push(idx);
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = roots
        .into_iter()
        .map(|root| (root, arena.descendants(root, &mut seen)))
        .collect();

    for idx in 0..comments.len() {
        if seen.contains(&idx) {
            continue;
        }
        let root = arena.climb(idx);
        if seen.insert(root) {
            let replies = arena.descendants(root, &mut seen);
            groups.push((root, replies));
        }
    }

    groups.sort_by_key(|(root, _)| (comments[*root].created_at, *root));

    groups
        .into_iter()
        .map(|(root, mut replies)| {
            arena.sort_chronologically(&mut replies);
            RootNode {
                comment: comments[root].clone(),
                children: replies.into_iter().map(|i| comments[i].clone()).collect(),
            }
        })
        .collect()
}

/// Number of comments whose parent is absent or not present in `comments`.
pub fn count_roots(comments: &[Comment]) -> usize {
    let ids: HashSet<CommentId> = comments.iter().map(|c| c.id).collect();
    comments
        .iter()
        .filter(|c| !c.parent_id.is_some_and(|parent| ids.contains(&parent)))
        .count()
}

/// `target` plus every comment whose parent chain leads back to it.
///
/// Fixed-point expansion over the whole list: quadratic in the worst case,
/// which is fine at discussion scale.
pub fn collect_descendant_ids(target: CommentId, comments: &[Comment]) -> HashSet<CommentId> {
    let mut ids = HashSet::from([target]);
    let mut changed = true;
    while changed {
        changed = false;
        for comment in comments {
            if ids.contains(&comment.id) {
                continue;
            }
            if comment.parent_id.is_some_and(|parent| ids.contains(&parent)) {
                ids.insert(comment.id);
                changed = true;
            }
        }
    }
    ids
}

/// The thread root `comment` belongs to, using only parents present in
/// `index`. Stops after `index.len()` steps so cyclic data cannot hang it.
pub fn find_root<'a>(
    comment: &'a Comment,
    index: &HashMap<CommentId, &'a Comment>,
) -> &'a Comment {
    let mut current = comment;
    let mut visited = HashSet::from([comment.id]);
    let mut cycle_min = None;

    for _ in 0..=index.len() {
        let Some(parent) = current
            .parent_id
            .and_then(|id| index.get(&id).copied())
            .filter(|parent| parent.id != current.id)
        else {
            return current;
        };
        if !visited.insert(parent.id) {
            // walk the cycle once more to pick a stable representative
            let mut member = parent;
            let mut best = parent;
            loop {
                member = match member.parent_id.and_then(|id| index.get(&id).copied()) {
                    Some(next) => next,
                    None => break,
                };
                if member.id == parent.id {
                    break;
                }
                if member.id < best.id {
                    best = member;
                }
            }
            cycle_min = Some(best);
            break;
        }
        current = parent;
    }

    cycle_min.unwrap_or(current)
}

/// Id map for [`find_root`].
pub fn index_by_id(comments: &[Comment]) -> HashMap<CommentId, &Comment> {
    let mut index = HashMap::with_capacity(comments.len());
    for comment in comments {
        index.entry(comment.id).or_insert(comment);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::fixtures::{cid, comment};

    fn ids(comments: &[Comment]) -> Vec<CommentId> {
        comments.iter().map(|c| c.id).collect()
    }

    fn root_ids(tree: &[RootNode]) -> Vec<CommentId> {
        tree.iter().map(|n| n.comment.id).collect()
    }

    #[test]
    fn test_flattens_nested_replies_under_root() {
        // A(root,t=1), B(parent=A,t=2), C(parent=B,t=3), D(root,t=4)
        let comments = vec![
            comment(0xd, None, 4),
            comment(0xc, Some(0xb), 3),
            comment(0xa, None, 1),
            comment(0xb, Some(0xa), 2),
        ];

        let tree = build_tree(&comments);

        assert_eq!(root_ids(&tree), vec![cid(0xa), cid(0xd)]);
        assert_eq!(ids(&tree[0].children), vec![cid(0xb), cid(0xc)]);
        assert!(tree[1].children.is_empty());
        // replies keep their original parent pointer
        assert_eq!(tree[0].children[1].parent_id, Some(cid(0xb)));
    }

    #[test]
    fn test_output_covers_input_exactly_once() {
        let comments = vec![
            comment(1, None, 1),
            comment(2, Some(1), 5),
            comment(3, Some(2), 2),
            comment(4, Some(1), 3),
            comment(5, None, 2),
            comment(6, Some(5), 9),
            comment(7, Some(3), 4),
        ];

        let tree = build_tree(&comments);

        let mut all: Vec<CommentId> = tree
            .iter()
            .flat_map(|n| std::iter::once(n.comment.id).chain(ids(&n.children)))
            .collect();
        all.sort();
        let mut expected = ids(&comments);
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_sorted_by_time_with_input_order_ties() {
        let comments = vec![
            comment(1, None, 5),
            comment(2, None, 5),
            comment(3, None, 1),
            comment(4, Some(1), 7),
            comment(5, Some(1), 7),
            comment(6, Some(4), 6),
        ];

        let tree = build_tree(&comments);

        assert_eq!(root_ids(&tree), vec![cid(3), cid(1), cid(2)]);
        assert_eq!(ids(&tree[1].children), vec![cid(6), cid(4), cid(5)]);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let comments = vec![comment(2, Some(99), 2), comment(3, Some(2), 3)];

        let tree = build_tree(&comments);

        assert_eq!(root_ids(&tree), vec![cid(2)]);
        assert_eq!(ids(&tree[0].children), vec![cid(3)]);
        assert_eq!(count_roots(&comments), 1);
    }

    #[test]
    fn test_cycle_does_not_hang_or_drop_comments() {
        let comments = vec![
            comment(1, Some(2), 1),
            comment(2, Some(1), 2),
            comment(3, Some(2), 3),
            comment(4, Some(4), 4),
        ];

        let tree = build_tree(&comments);

        let total: usize = tree.iter().map(|n| 1 + n.children.len()).sum();
        assert_eq!(total, comments.len());
        assert_eq!(root_ids(&tree), vec![cid(1), cid(4)]);
        assert_eq!(ids(&tree[0].children), vec![cid(2), cid(3)]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let comments = vec![
            comment(1, None, 3),
            comment(2, Some(1), 4),
            comment(3, None, 3),
            comment(4, Some(2), 4),
        ];
        assert_eq!(build_tree(&comments), build_tree(&comments));
    }

    #[test]
    fn test_collect_descendants_in_any_order() {
        // 3 is listed before its parent 2
        let comments = vec![
            comment(3, Some(2), 3),
            comment(1, None, 1),
            comment(2, Some(1), 2),
            comment(4, None, 4),
        ];

        let removed = collect_descendant_ids(cid(1), &comments);
        assert_eq!(removed, HashSet::from([cid(1), cid(2), cid(3)]));

        let remaining: Vec<Comment> = comments
            .iter()
            .filter(|c| !removed.contains(&c.id))
            .cloned()
            .collect();
        assert_eq!(count_roots(&remaining), 1);
        assert_eq!(root_ids(&build_tree(&remaining)), vec![cid(4)]);
    }

    #[test]
    fn test_deleting_whole_thread_leaves_nothing() {
        let comments = vec![
            comment(1, None, 1),
            comment(2, Some(1), 2),
            comment(3, Some(2), 3),
        ];
        let removed = collect_descendant_ids(cid(1), &comments);
        assert_eq!(removed.len(), 3);
        let remaining: Vec<Comment> = comments
            .into_iter()
            .filter(|c| !removed.contains(&c.id))
            .collect();
        assert_eq!(count_roots(&remaining), 0);
    }

    #[test]
    fn test_parent_removed_elsewhere_becomes_root() {
        let mut comments = vec![
            comment(1, None, 1),
            comment(2, Some(1), 2),
            comment(3, None, 3),
        ];
        let before = count_roots(&comments);
        // a concurrent delete removed only the parent
        comments.retain(|c| c.id != cid(1));
        assert_eq!(count_roots(&comments), before);
        assert_eq!(root_ids(&build_tree(&comments)), vec![cid(2), cid(3)]);
    }

    #[test]
    fn test_find_root_is_same_for_whole_thread() {
        let comments = vec![
            comment(1, None, 1),
            comment(2, Some(1), 2),
            comment(3, Some(2), 3),
        ];
        let index = index_by_id(&comments);

        for c in &comments {
            assert_eq!(find_root(c, &index).id, cid(1));
        }
    }

    #[test]
    fn test_find_root_terminates_on_cycle() {
        let comments = vec![comment(5, Some(6), 1), comment(6, Some(5), 2)];
        let index = index_by_id(&comments);

        assert_eq!(find_root(&comments[0], &index).id, cid(5));
        assert_eq!(find_root(&comments[1], &index).id, cid(5));
    }
}
