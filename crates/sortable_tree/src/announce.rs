//! Screen-reader style messages describing a drag as it happens.

use crate::node::{FlatNode, NodeId};
use crate::projection::{MovedView, Projection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Movement {
    Moved,
    Dropped,
}

fn name_of<'a, T>(items: &'a [FlatNode<T>], id: &'a NodeId) -> &'a str {
    items
        .iter()
        .find(|item| item.id == *id)
        .map_or(id.as_str(), |item| item.name.as_str())
}

pub(crate) fn picked_up(name: &str) -> String {
    format!("Picked up {name}.")
}

pub(crate) fn cancelled(name: &str) -> String {
    format!("Moving was cancelled. {name} was dropped in its original position.")
}

/// Describe where `active_id` sits relative to its neighbours after the simulated move.
///
/// When the projected depth is shallower than the row above, the parent chain of that row is
/// walked until a node at the projected depth is found; that node is the previous sibling.
pub(crate) fn movement<T>(
    items: &[FlatNode<T>],
    active_id: &NodeId,
    over_id: &NodeId,
    projection: &Projection,
    movement: Movement,
) -> Option<String> {
    let over_ix = items.iter().position(|item| item.id == *over_id)?;
    let active_ix = items.iter().position(|item| item.id == *active_id)?;
    let sorted = MovedView::new(items, active_ix, over_ix);
    let active = name_of(items, active_id);

    let (moved_verb, nested_verb) = match movement {
        Movement::Moved => ("moved", "nested"),
        Movement::Dropped => ("dropped", "dropped"),
    };

    let Some(previous) = over_ix.checked_sub(1).and_then(|ix| sorted.get(ix)) else {
        let next = sorted.get(over_ix + 1)?;
        return Some(format!("{active} was {moved_verb} before {}.", next.name));
    };

    if projection.depth > previous.depth {
        return Some(format!(
            "{active} was {nested_verb} under {}.",
            previous.name
        ));
    }

    let mut sibling = Some(previous);
    while let Some(candidate) = sibling {
        if projection.depth >= candidate.depth {
            break;
        }
        sibling = candidate
            .parent_id
            .as_ref()
            .and_then(|parent_id| items.iter().find(|item| item.id == *parent_id));
    }

    sibling.map(|sibling| format!("{active} was {moved_verb} after {}.", sibling.name))
}
