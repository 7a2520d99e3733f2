//! Conversions between the nested tree and its flattened, depth-annotated form, plus the
//! structural helpers the editor uses to mutate the nested form.
//!
//! Every function here is pure: inputs are borrowed and a fresh tree or list is returned.

use std::collections::HashSet;

use crate::node::{FlatNode, NodeId, TreeNode};

/// Pre-order flattening of `items`.
///
/// Collapsed groups are walked like any other group; use [`remove_children_of`] (or
/// [`visible_items`]) to hide their descendants.
pub fn flatten<T: Clone>(items: &[TreeNode<T>]) -> Vec<FlatNode<T>> {
    let mut out = Vec::new();
    flatten_into(items, 0, None, &mut out);
    out
}

fn flatten_into<T: Clone>(
    items: &[TreeNode<T>],
    depth: usize,
    parent_id: Option<&NodeId>,
    out: &mut Vec<FlatNode<T>>,
) {
    for (index, item) in items.iter().enumerate() {
        let ix = out.len();
        out.push(FlatNode {
            id: item.id.clone(),
            name: item.name.clone(),
            is_group: item.is_group,
            data: item.data.clone(),
            collapsed: item.collapsed,
            child_count: item.children.len(),
            descendant_count: 0,
            depth,
            parent_id: parent_id.cloned(),
            index,
        });
        flatten_into(&item.children, depth + 1, Some(&item.id), out);
        out[ix].descendant_count = out.len() - ix - 1;
    }
}

/// Drop every entry whose ancestor chain contains one of `ids`.
///
/// Relies on `items` being in pre-order, so a parent is always seen before its children.
pub fn remove_children_of<'a, T>(
    items: Vec<FlatNode<T>>,
    ids: impl IntoIterator<Item = &'a NodeId>,
) -> Vec<FlatNode<T>> {
    let mut excluded: HashSet<NodeId> = ids.into_iter().cloned().collect();
    if excluded.is_empty() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            let hidden = item
                .parent_id
                .as_ref()
                .is_some_and(|parent_id| excluded.contains(parent_id));
            if hidden {
                excluded.insert(item.id.clone());
            }
            !hidden
        })
        .collect()
}

/// The list a view renders: collapsed subtrees and the subtree of `active_id` are hidden.
pub fn visible_items<T: Clone>(
    items: &[TreeNode<T>],
    active_id: Option<&NodeId>,
) -> Vec<FlatNode<T>> {
    let flat = flatten(items);
    let mut hidden: Vec<NodeId> = flat
        .iter()
        .filter(|item| item.collapsed && item.has_children())
        .map(|item| item.id.clone())
        .collect();
    if let Some(active_id) = active_id {
        hidden.push(active_id.clone());
    }
    remove_children_of(flat, hidden.iter())
}

/// Rebuild a nested tree from a flat list.
///
/// Nesting is derived from list order and `depth` alone: an entry becomes a child of the
/// nearest preceding open entry one level shallower. An entry claiming a depth more than one
/// level deeper than anything open starts a new root segment instead.
pub fn build<T: Clone>(items: &[FlatNode<T>]) -> Vec<TreeNode<T>> {
    let mut roots: Vec<TreeNode<T>> = Vec::new();
    // (claimed depth, node) for every entry that may still receive children.
    let mut open: Vec<(usize, TreeNode<T>)> = Vec::new();

    fn close<T>(open: &mut Vec<(usize, TreeNode<T>)>, roots: &mut Vec<TreeNode<T>>) {
        if let Some((_, node)) = open.pop() {
            match open.last_mut() {
                Some((_, parent)) => parent.children.push(node),
                None => roots.push(node),
            }
        }
    }

    for item in items {
        while open.last().is_some_and(|(depth, _)| *depth >= item.depth) {
            close(&mut open, &mut roots);
        }

        let attached = match open.last() {
            Some((depth, _)) => *depth + 1 == item.depth,
            None => item.depth == 0,
        };
        if !attached {
            while !open.is_empty() {
                close(&mut open, &mut roots);
            }
            tracing::trace!(id = %item.id, depth = item.depth, "depth jump, starting new root");
        }

        open.push((item.depth, item.to_tree_node()));
    }

    while !open.is_empty() {
        close(&mut open, &mut roots);
    }
    roots
}

/// Remove the node `id` and its whole subtree, wherever it occurs.
pub fn remove_item<T: Clone>(items: &[TreeNode<T>], id: &NodeId) -> Vec<TreeNode<T>> {
    items
        .iter()
        .filter(|item| item.id != *id)
        .map(|item| item.with_children(remove_item(&item.children, id)))
        .collect()
}

/// Replace the property selected by `field` on node `id` with `update(current)`.
///
/// ```ignore
/// let tree = set_property(&tree, &id, TreeNode::collapsed_mut, |collapsed| !collapsed);
/// ```
pub fn set_property<T: Clone, V>(
    items: &[TreeNode<T>],
    id: &NodeId,
    field: fn(&mut TreeNode<T>) -> &mut V,
    update: impl Fn(&V) -> V,
) -> Vec<TreeNode<T>> {
    fn walk<T: Clone, V>(
        items: &[TreeNode<T>],
        id: &NodeId,
        field: fn(&mut TreeNode<T>) -> &mut V,
        update: &dyn Fn(&V) -> V,
    ) -> Vec<TreeNode<T>> {
        items
            .iter()
            .map(|item| {
                let mut node = item.with_children(walk(&item.children, id, field, update));
                if node.id == *id {
                    let slot = field(&mut node);
                    let next = update(slot);
                    *slot = next;
                }
                node
            })
            .collect()
    }

    walk(items, id, field, &update)
}

pub fn find_item<'a, T>(items: &'a [TreeNode<T>], id: &NodeId) -> Option<&'a TreeNode<T>> {
    for item in items {
        if item.id == *id {
            return Some(item);
        }
        if let Some(found) = find_item(&item.children, id) {
            return Some(found);
        }
    }
    None
}

/// Id of the group that owns `id`, `None` for roots and unknown ids.
pub fn find_parent_id<T>(items: &[TreeNode<T>], id: &NodeId) -> Option<NodeId> {
    for item in items {
        if item.children.iter().any(|child| child.id == *id) {
            return Some(item.id.clone());
        }
        if let Some(found) = find_parent_id(&item.children, id) {
            return Some(found);
        }
    }
    None
}

/// Number of nodes (groups and leaves) below `id`. Zero for leaves and unknown ids.
pub fn get_child_count<T>(items: &[TreeNode<T>], id: &NodeId) -> usize {
    fn count<T>(children: &[TreeNode<T>]) -> usize {
        children
            .iter()
            .map(|child| 1 + count(&child.children))
            .sum()
    }

    find_item(items, id).map_or(0, |item| count(&item.children))
}

/// Ids of every leaf below `node`, in pre-order.
pub fn descendant_leaf_ids<T>(node: &TreeNode<T>) -> Vec<NodeId> {
    fn walk<T>(children: &[TreeNode<T>], out: &mut Vec<NodeId>) {
        for child in children {
            if child.is_leaf() {
                out.push(child.id.clone());
            }
            walk(&child.children, out);
        }
    }

    let mut out = Vec::new();
    walk(&node.children, &mut out);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: NodeId,
    pub name: String,
}

pub fn find_all_groups<T>(items: &[TreeNode<T>]) -> Vec<GroupSummary> {
    fn walk<T>(items: &[TreeNode<T>], out: &mut Vec<GroupSummary>) {
        for item in items {
            if item.is_group {
                out.push(GroupSummary {
                    id: item.id.clone(),
                    name: item.name.clone(),
                });
            }
            walk(&item.children, out);
        }
    }

    let mut out = Vec::new();
    walk(items, &mut out);
    out
}

/// First `"{prefix} N"` not already used by a group, starting at the group count plus one.
pub fn next_group_name<T>(items: &[TreeNode<T>], prefix: &str) -> String {
    let groups = find_all_groups(items);
    let mut n = groups.len() + 1;
    loop {
        let name = format!("{prefix} {n}");
        if !groups.iter().any(|group| group.name == name) {
            return name;
        }
        n += 1;
    }
}

/// Copy of `items` with the element at `from` moved to `to`.
pub fn array_move<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = items.to_vec();
    if from >= out.len() {
        return out;
    }
    let item = out.remove(from);
    let to = to.min(out.len());
    out.insert(to, item);
    out
}
