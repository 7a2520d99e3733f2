use serde::Serialize;

use crate::node::{FlatNode, NodeId};

/// Legal drop target for the node being positioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub depth: usize,
    pub parent_id: Option<NodeId>,
    pub max_depth: usize,
    pub min_depth: usize,
}

/// Read-only view of `items` as if the element at `from` had been moved to `to`.
pub(crate) struct MovedView<'a, T> {
    items: &'a [T],
    from: usize,
    to: usize,
}

impl<'a, T> MovedView<'a, T> {
    pub(crate) fn new(items: &'a [T], from: usize, to: usize) -> Self {
        let last = items.len().saturating_sub(1);
        Self {
            items,
            from: from.min(last),
            to: to.min(last),
        }
    }

    pub(crate) fn get(&self, pos: usize) -> Option<&'a T> {
        if pos >= self.items.len() {
            return None;
        }
        let source = if pos == self.to {
            self.from
        } else if self.from < self.to && (self.from..self.to).contains(&pos) {
            pos + 1
        } else if self.from > self.to && (self.to + 1..=self.from).contains(&pos) {
            pos - 1
        } else {
            pos
        };
        self.items.get(source)
    }

    /// Entries strictly before `pos`, nearest first.
    pub(crate) fn before(&self, pos: usize) -> impl Iterator<Item = &'a T> + '_ {
        (0..pos.min(self.items.len())).rev().filter_map(move |ix| self.get(ix))
    }
}

/// Number of indentation levels a horizontal drag of `offset` pixels represents.
pub fn drag_depth(offset: f32, indentation_width: f32) -> isize {
    if indentation_width <= 0.0 || !offset.is_finite() {
        return 0;
    }
    (offset / indentation_width).round() as isize
}

/// Compute where `active_id` would land if dropped over `over_id` with a horizontal drag of
/// `offset` pixels.
///
/// `items` is the visible list with the active node's descendants already removed. Returns
/// `None` when either id is not in `items`. Nesting legality is purely structural: whether the
/// resulting parent is a group is not checked here (see [`restrict_to_groups`]).
pub fn project<T>(
    items: &[FlatNode<T>],
    active_id: &NodeId,
    over_id: &NodeId,
    offset: f32,
    indentation_width: f32,
) -> Option<Projection> {
    let over_ix = items.iter().position(|item| item.id == *over_id)?;
    let active_ix = items.iter().position(|item| item.id == *active_id)?;
    let active = &items[active_ix];

    let moved = MovedView::new(items, active_ix, over_ix);
    let previous = over_ix.checked_sub(1).and_then(|ix| moved.get(ix));
    let next = moved.get(over_ix + 1);

    let projected = active.depth as isize + drag_depth(offset, indentation_width);
    let max_depth = previous.map_or(0, |item| item.depth + 1);
    let min_depth = next.map_or(0, |item| item.depth);

    let depth = if projected >= max_depth as isize {
        max_depth
    } else if projected < min_depth as isize {
        min_depth
    } else {
        projected as usize
    };

    let parent_id = if depth == 0 {
        None
    } else {
        moved
            .before(over_ix)
            .find(|item| item.depth + 1 == depth)
            .map(|item| item.id.clone())
    };

    tracing::trace!(
        active = %active_id,
        over = %over_id,
        offset,
        depth,
        min_depth,
        max_depth,
        "projection"
    );

    Some(Projection {
        depth,
        parent_id,
        max_depth,
        min_depth,
    })
}

/// Pull a projection out of leaves: while the resolved parent is not a group, the drop is
/// lifted to become that leaf's sibling instead of its child.
pub fn restrict_to_groups<T>(
    items: &[FlatNode<T>],
    active_id: &NodeId,
    over_id: &NodeId,
    projection: Projection,
) -> Projection {
    let (Some(over_ix), Some(active_ix)) = (
        items.iter().position(|item| item.id == *over_id),
        items.iter().position(|item| item.id == *active_id),
    ) else {
        return projection;
    };
    let moved = MovedView::new(items, active_ix, over_ix);

    let mut projection = projection;
    while let Some(parent_id) = projection.parent_id.clone() {
        let Some(parent) = moved.before(over_ix).find(|item| item.id == parent_id) else {
            break;
        };
        if parent.is_group || parent.depth < projection.min_depth {
            break;
        }
        projection.depth = parent.depth;
        projection.parent_id = parent.parent_id.clone();
    }
    projection
}

/// The projection a drop would actually use: [`project`], then [`restrict_to_groups`] unless
/// leaves may own children.
pub fn resolve_projection<T>(
    items: &[FlatNode<T>],
    active_id: &NodeId,
    over_id: &NodeId,
    offset: f32,
    indentation_width: f32,
    nest_under_leaves: bool,
) -> Option<Projection> {
    let projection = project(items, active_id, over_id, offset, indentation_width)?;
    Some(if nest_under_leaves {
        projection
    } else {
        restrict_to_groups(items, active_id, over_id, projection)
    })
}
