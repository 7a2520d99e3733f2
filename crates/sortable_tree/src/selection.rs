use std::collections::HashSet;

use crate::node::{NodeId, TreeNode};
use crate::tree::{descendant_leaf_ids, find_item};

/// Selected leaf ids, plus "whole group" markers for groups selected as a unit.
///
/// Group markers only drive the cascade. Batch actions must go through
/// [`SelectionSet::resolved_leaf_ids`], never through the raw ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<NodeId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.ids.iter()
    }

    /// Select or deselect a single leaf. Deselecting breaks the whole-group marker of every
    /// enclosing group.
    pub fn toggle_leaf<T>(&mut self, tree: &[TreeNode<T>], id: &NodeId) {
        if self.ids.remove(id) {
            for ancestor in ancestors(tree, id) {
                self.ids.remove(&ancestor);
            }
        } else {
            self.ids.insert(id.clone());
        }
    }

    /// Select a group with all its leaves, or deselect it with all its leaves. Deselecting
    /// also breaks the markers of the groups around it.
    pub fn toggle_group<T>(&mut self, tree: &[TreeNode<T>], group_id: &NodeId) {
        let Some(group) = find_item(tree, group_id).filter(|node| node.is_group) else {
            return;
        };
        let leaves = descendant_leaf_ids(group);

        if self.ids.remove(group_id) {
            for id in &leaves {
                self.ids.remove(id);
            }
            for nested in nested_group_ids(group) {
                self.ids.remove(&nested);
            }
            for ancestor in ancestors(tree, group_id) {
                self.ids.remove(&ancestor);
            }
        } else {
            self.ids.insert(group_id.clone());
            self.ids.extend(leaves);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected leaves, in tree order. Group markers are never returned.
    pub fn resolved_leaf_ids<T>(&self, tree: &[TreeNode<T>]) -> Vec<NodeId> {
        fn walk<T>(items: &[TreeNode<T>], ids: &HashSet<NodeId>, out: &mut Vec<NodeId>) {
            for item in items {
                if item.is_leaf() && ids.contains(&item.id) {
                    out.push(item.id.clone());
                }
                walk(&item.children, ids, out);
            }
        }

        let mut out = Vec::new();
        walk(tree, &self.ids, &mut out);
        out
    }

    /// Selected group markers, in tree order.
    pub fn group_markers<T>(&self, tree: &[TreeNode<T>]) -> Vec<NodeId> {
        fn walk<T>(items: &[TreeNode<T>], ids: &HashSet<NodeId>, out: &mut Vec<NodeId>) {
            for item in items {
                if item.is_group && ids.contains(&item.id) {
                    out.push(item.id.clone());
                }
                walk(&item.children, ids, out);
            }
        }

        let mut out = Vec::new();
        walk(tree, &self.ids, &mut out);
        out
    }

    /// Forget ids that are no longer in `tree`.
    pub fn retain_existing<T>(&mut self, tree: &[TreeNode<T>]) {
        self.ids.retain(|id| find_item(tree, id).is_some());
    }
}

/// Ids of the groups enclosing `id`, nearest first.
fn ancestors<T>(tree: &[TreeNode<T>], id: &NodeId) -> Vec<NodeId> {
    fn walk<T>(items: &[TreeNode<T>], id: &NodeId, path: &mut Vec<NodeId>) -> bool {
        for item in items {
            if item.id == *id {
                return true;
            }
            path.push(item.id.clone());
            if walk(&item.children, id, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = Vec::new();
    if !walk(tree, id, &mut path) {
        return Vec::new();
    }
    path.reverse();
    path
}

fn nested_group_ids<T>(group: &TreeNode<T>) -> Vec<NodeId> {
    fn walk<T>(items: &[TreeNode<T>], out: &mut Vec<NodeId>) {
        for item in items {
            if item.is_group {
                out.push(item.id.clone());
            }
            walk(&item.children, out);
        }
    }

    let mut out = Vec::new();
    walk(&group.children, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<TreeNode<()>> {
        vec![
            TreeNode::group("g", "Indicators")
                .child(TreeNode::leaf("a", "a", ()))
                .child(TreeNode::group("h", "Nested").child(TreeNode::leaf("b", "b", ()))),
            TreeNode::leaf("c", "c", ()),
        ]
    }

    fn ids(list: &[&str]) -> Vec<NodeId> {
        list.iter().map(|id| NodeId::from(*id)).collect()
    }

    #[test]
    fn selecting_group_selects_all_leaves() {
        let tree = tree();
        let mut selection = SelectionSet::new();
        selection.toggle_group(&tree, &"g".into());
        assert!(selection.contains(&"g".into()));
        assert_eq!(selection.resolved_leaf_ids(&tree), ids(&["a", "b"]));

        selection.toggle_group(&tree, &"g".into());
        assert!(selection.is_empty());
    }

    #[test]
    fn deselecting_leaf_breaks_group_marker() {
        let tree = tree();
        let mut selection = SelectionSet::new();
        selection.toggle_group(&tree, &"g".into());
        selection.toggle_leaf(&tree, &"b".into());
        assert!(!selection.contains(&"g".into()));
        assert_eq!(selection.resolved_leaf_ids(&tree), ids(&["a"]));

        selection.toggle_leaf(&tree, &"b".into());
        assert!(!selection.contains(&"g".into()));
        assert_eq!(selection.resolved_leaf_ids(&tree), ids(&["a", "b"]));
    }

    #[test]
    fn deselecting_nested_group_breaks_outer_marker() {
        let tree = tree();
        let mut selection = SelectionSet::new();
        selection.toggle_group(&tree, &"g".into());
        selection.toggle_group(&tree, &"h".into());
        assert!(selection.contains(&"g".into()));
        assert!(selection.contains(&"h".into()));

        selection.toggle_group(&tree, &"h".into());
        assert!(!selection.contains(&"h".into()));
        assert!(!selection.contains(&"g".into()));
        assert_eq!(selection.resolved_leaf_ids(&tree), ids(&["a"]));
        assert_eq!(selection.group_markers(&tree), Vec::<NodeId>::new());
    }

    #[test]
    fn toggling_unknown_or_leaf_as_group_is_ignored() {
        let tree = tree();
        let mut selection = SelectionSet::new();
        selection.toggle_group(&tree, &"c".into());
        selection.toggle_group(&tree, &"missing".into());
        assert!(selection.is_empty());
    }

    #[test]
    fn retain_existing_drops_stale_ids() {
        let tree = tree();
        let mut selection = SelectionSet::new();
        selection.toggle_leaf(&tree, &"c".into());
        selection.toggle_leaf(&tree, &"gone".into());
        selection.retain_existing(&tree);
        assert_eq!(selection.len(), 1);
    }
}
