//! Property-based invariant tests for the flatten/build/projection/commit pipeline.
//!
//! 1. build(flatten(tree)) reproduces the tree.
//! 2. Flattened depths follow the parent chain.
//! 3. Projections stay within their own bounds and name a parent one level up.
//! 4. Dropping a node where it was picked up leaves the tree unchanged.
//! 5. Any committed drop keeps every node exactly once, never nests under a leaf and never
//!    makes a node its own ancestor.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use manos_sortable_tree::{
    DragOutcome, DragSession, NodeId, SortableTreeConfig, TreeNode, build, flatten, project,
    validate_tree, visible_items,
};
use proptest::prelude::*;
use proptest::sample::Index;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Shape {
    Leaf,
    Group { collapsed: bool, children: Vec<Shape> },
}

fn shape() -> impl Strategy<Value = Shape> {
    Just(Shape::Leaf).prop_recursive(4, 32, 4, |inner| {
        (any::<bool>(), proptest::collection::vec(inner, 0..4))
            .prop_map(|(collapsed, children)| Shape::Group { collapsed, children })
    })
}

fn materialize(shape: &Shape, next: &mut u32) -> TreeNode<u32> {
    let id = *next;
    *next += 1;
    match shape {
        Shape::Leaf => TreeNode::leaf(id, format!("leaf {id}"), id),
        Shape::Group {
            collapsed,
            children,
        } => {
            let children: Vec<_> = children.iter().map(|c| materialize(c, next)).collect();
            TreeNode::group(id, format!("group {id}"))
                .collapsed(*collapsed)
                .children(children)
        }
    }
}

/// Trees with pre-order sequential ids.
fn forest() -> impl Strategy<Value = Vec<TreeNode<u32>>> {
    proptest::collection::vec(shape(), 1..6).prop_map(|shapes| {
        let mut next = 0;
        shapes.iter().map(|s| materialize(s, &mut next)).collect()
    })
}

fn leaf_payloads(tree: &[TreeNode<u32>]) -> HashMap<NodeId, Option<u32>> {
    flatten(tree)
        .into_iter()
        .map(|item| (item.id, item.data))
        .collect()
}

/// Walking `parentId` upwards from any node reaches a root without revisiting a node.
fn parent_chains_terminate(tree: &[TreeNode<u32>]) -> bool {
    let flat = flatten(tree);
    let parents: HashMap<&NodeId, Option<&NodeId>> = flat
        .iter()
        .map(|item| (&item.id, item.parent_id.as_ref()))
        .collect();

    flat.iter().all(|item| {
        let mut seen = vec![&item.id];
        let mut current = parents.get(&item.id).copied().flatten();
        while let Some(id) = current {
            if seen.contains(&id) {
                return false;
            }
            seen.push(id);
            current = parents.get(id).copied().flatten();
        }
        true
    })
}

fn session() -> DragSession<u32> {
    DragSession::new(&SortableTreeConfig::default().settle_delay(Duration::ZERO))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn build_inverts_flatten(tree in forest()) {
        prop_assert_eq!(build(&flatten(&tree)), tree);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Depth invariant
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn depth_follows_parent(tree in forest()) {
        let flat = flatten(&tree);
        let depths: HashMap<&NodeId, usize> =
            flat.iter().map(|item| (&item.id, item.depth)).collect();

        for item in &flat {
            match &item.parent_id {
                None => prop_assert_eq!(item.depth, 0),
                Some(parent_id) => prop_assert_eq!(item.depth, depths[parent_id] + 1),
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Projection bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn projection_within_bounds(
        tree in forest(),
        active in any::<Index>(),
        over in any::<Index>(),
        offset in -300.0f32..300.0,
    ) {
        let all = visible_items(&tree, None);
        let active_id = all[active.index(all.len())].id.clone();
        let items = visible_items(&tree, Some(&active_id));
        let over_id = items[over.index(items.len())].id.clone();

        let projection = project(&items, &active_id, &over_id, offset, 50.0).unwrap();
        prop_assert!(projection.min_depth <= projection.depth);
        prop_assert!(projection.depth <= projection.max_depth);

        match &projection.parent_id {
            None => prop_assert_eq!(projection.depth, 0),
            Some(parent_id) => {
                let parent = items.iter().find(|item| item.id == *parent_id).unwrap();
                prop_assert_eq!(parent.depth + 1, projection.depth);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Drop in place
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn drop_in_place_is_unchanged(tree in forest(), active in any::<Index>()) {
        let all = visible_items(&tree, None);
        let active_id = all[active.index(all.len())].id.clone();

        let mut session = session();
        prop_assert!(session.start(&tree, active_id));
        match session.end(Instant::now()) {
            DragOutcome::Committed { tree: after, changed } => {
                prop_assert!(!changed);
                prop_assert_eq!(after, tree);
            }
            other => prop_assert!(false, "expected a commit, got {:?}", other),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Random commits
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn commit_keeps_every_node_once(
        tree in forest(),
        active in any::<Index>(),
        over in any::<Index>(),
        offset in -300.0f32..300.0,
    ) {
        let all = visible_items(&tree, None);
        let active_id = all[active.index(all.len())].id.clone();

        let mut session = session();
        prop_assert!(session.start(&tree, active_id));
        let targets: Vec<NodeId> = session
            .items()
            .unwrap()
            .iter()
            .map(|item| item.id.clone())
            .collect();
        session.over(Some(targets[over.index(targets.len())].clone()));
        session.drag_move(offset);

        match session.end(Instant::now()) {
            DragOutcome::Committed { tree: after, .. } => {
                prop_assert!(validate_tree(&after).is_ok(), "invalid tree {:?}", after);
                prop_assert_eq!(flatten(&after).len(), flatten(&tree).len());
                prop_assert_eq!(leaf_payloads(&after), leaf_payloads(&tree));
                prop_assert!(parent_chains_terminate(&after));
            }
            other => prop_assert!(false, "expected a commit, got {:?}", other),
        }
    }
}
