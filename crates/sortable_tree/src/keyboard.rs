//! Arrow-key navigation for a picked-up node.
//!
//! Key presses are translated into the same inputs a pointer produces (an `over` target and a
//! horizontal offset) so [`resolve_projection`] stays the single source of nesting rules. Each accepted
//! step also yields the synthetic pointer coordinate the view should move its indicator to.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::node::{FlatNode, NodeId};
use crate::projection::{Projection, resolve_projection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardDirection {
    Up,
    Down,
    Left,
    Right,
}

impl KeyboardDirection {
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn corners(self) -> [Point; 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(self.x, bottom),
            Point::new(right, bottom),
        ]
    }

    /// Mean distance between matching corners of `self` and `other`.
    pub fn corner_distance(self, other: Rect) -> f32 {
        self.corners()
            .iter()
            .zip(other.corners())
            .map(|(a, b)| a.distance(b))
            .sum::<f32>()
            / 4.0
    }
}

/// Everything the adapter needs to know about the current drag.
pub struct KeyboardContext<'a, T> {
    /// Visible items, with the active node's descendants removed.
    pub items: &'a [FlatNode<T>],
    pub active_id: &'a NodeId,
    pub over_id: Option<&'a NodeId>,
    pub offset: f32,
    pub indentation_width: f32,
    pub nest_under_leaves: bool,
    /// Current bounds of the dragged row.
    pub collision_rect: Rect,
    /// Current pointer-equivalent coordinate.
    pub coordinates: Point,
    /// Bounds of every droppable row, in list order.
    pub droppable_rects: &'a [(NodeId, Rect)],
}

/// Result of an accepted key press.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardStep {
    pub over_id: NodeId,
    pub offset: f32,
    pub coordinates: Point,
}

/// Translate one arrow key into a drag step, or `None` when the key has no legal effect.
pub fn keyboard_step<T>(
    direction: KeyboardDirection,
    cx: &KeyboardContext<'_, T>,
) -> Option<KeyboardStep> {
    let over_id = cx.over_id?;
    if direction.is_vertical() {
        vertical_step(direction, over_id, cx)
    } else {
        horizontal_step(direction, over_id, cx)
    }
}

fn horizontal_step<T>(
    direction: KeyboardDirection,
    over_id: &NodeId,
    cx: &KeyboardContext<'_, T>,
) -> Option<KeyboardStep> {
    let active_depth = cx.items.iter().find(|item| item.id == *cx.active_id)?.depth;
    let current = effective(cx, over_id, cx.offset)?;
    let target = match direction {
        KeyboardDirection::Left => current.depth.checked_sub(1)?,
        KeyboardDirection::Right => current.depth + 1,
        _ => return None,
    };

    // Only a step that changes the depth a drop would use is accepted.
    let offset = (target as f32 - active_depth as f32) * cx.indentation_width;
    if effective(cx, over_id, offset)?.depth != target {
        return None;
    }

    let delta = (target as f32 - current.depth as f32) * cx.indentation_width;
    Some(KeyboardStep {
        over_id: over_id.clone(),
        offset,
        coordinates: Point::new(cx.coordinates.x + delta, cx.coordinates.y),
    })
}

fn effective<T>(cx: &KeyboardContext<'_, T>, over_id: &NodeId, offset: f32) -> Option<Projection> {
    resolve_projection(
        cx.items,
        cx.active_id,
        over_id,
        offset,
        cx.indentation_width,
        cx.nest_under_leaves,
    )
}

fn vertical_step<T>(
    direction: KeyboardDirection,
    over_id: &NodeId,
    cx: &KeyboardContext<'_, T>,
) -> Option<KeyboardStep> {
    let top = cx.collision_rect.y;
    let mut candidates: Vec<(usize, &NodeId, Rect)> = cx
        .droppable_rects
        .iter()
        .enumerate()
        .filter(|(_, (id, rect))| {
            id != over_id
                && match direction {
                    KeyboardDirection::Down => top < rect.y,
                    _ => top > rect.y,
                }
        })
        .map(|(order, (id, rect))| (order, id, *rect))
        .collect();

    // Equidistant candidates keep list order, so the earlier row wins.
    candidates.sort_by(|a, b| {
        let da = cx.collision_rect.corner_distance(a.2);
        let db = cx.collision_rect.corner_distance(b.2);
        da.partial_cmp(&db)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let (_, closest_id, closest_rect) = candidates.first().copied()?;

    if !cx.droppable_rects.iter().any(|(id, _)| id == cx.active_id) {
        return None;
    }
    let active_ix = cx.items.iter().position(|item| item.id == *cx.active_id)?;
    let new_ix = cx.items.iter().position(|item| item.id == *closest_id)?;
    let active = &cx.items[active_ix];
    let target = &cx.items[new_ix];

    // Keep the relative depth the user had, so moving onto a shallower row does not jump to
    // the deepest legal nesting.
    let relative = (target.depth as f32 - active.depth as f32) * cx.indentation_width;
    let projection = effective(cx, closest_id, relative)?;

    tracing::trace!(
        ?direction,
        over = %closest_id,
        depth = projection.depth,
        "keyboard step"
    );

    Some(KeyboardStep {
        over_id: closest_id.clone(),
        offset: (projection.depth as f32 - active.depth as f32) * cx.indentation_width,
        coordinates: Point::new(
            closest_rect.x + projection.depth as f32 * cx.indentation_width,
            closest_rect.y,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TreeNode;
    use crate::tree::visible_items;

    const ROW: f32 = 30.0;
    const INDENT: f32 = 20.0;

    fn rows<T>(items: &[FlatNode<T>]) -> Vec<(NodeId, Rect)> {
        items
            .iter()
            .enumerate()
            .map(|(ix, item)| {
                (item.id.clone(), Rect::new(0.0, ix as f32 * ROW, 200.0, ROW))
            })
            .collect()
    }

    fn tree() -> Vec<TreeNode<()>> {
        vec![
            TreeNode::group("A", "A").child(TreeNode::leaf("B", "B", ())),
            TreeNode::leaf("C", "C", ()),
            TreeNode::leaf("D", "D", ()),
        ]
    }

    #[test]
    fn right_arrow_steps_one_level_when_legal() {
        let items = visible_items(&tree(), Some(&"C".into()));
        let rects = rows(&items);
        let active: NodeId = "C".into();
        let cx = KeyboardContext {
            items: &items,
            active_id: &active,
            over_id: Some(&active),
            offset: 0.0,
            indentation_width: INDENT,
            nest_under_leaves: true,
            collision_rect: rects[2].1,
            coordinates: Point::new(10.0, 70.0),
            droppable_rects: &rects,
        };

        let step = keyboard_step(KeyboardDirection::Right, &cx).unwrap();
        assert_eq!(step.offset, INDENT);
        assert_eq!(step.coordinates, Point::new(30.0, 70.0));

        let cx = KeyboardContext { offset: step.offset, ..cx };
        let step = keyboard_step(KeyboardDirection::Right, &cx).unwrap();
        assert_eq!(step.offset, 2.0 * INDENT);

        // Nested below B now, which is as deep as the row above allows.
        let cx = KeyboardContext { offset: step.offset, ..cx };
        assert!(keyboard_step(KeyboardDirection::Right, &cx).is_none());
        assert!(keyboard_step(KeyboardDirection::Left, &cx).is_some());
    }

    #[test]
    fn right_arrow_under_leaf_is_ignored_unless_allowed() {
        let tree = vec![TreeNode::leaf("A", "A", ()), TreeNode::leaf("B", "B", ())];
        let items = visible_items(&tree, Some(&"B".into()));
        let rects = rows(&items);
        let active: NodeId = "B".into();
        let cx = KeyboardContext {
            items: &items,
            active_id: &active,
            over_id: Some(&active),
            offset: 0.0,
            indentation_width: INDENT,
            nest_under_leaves: false,
            collision_rect: rects[1].1,
            coordinates: Point::new(0.0, ROW),
            droppable_rects: &rects,
        };
        assert!(keyboard_step(KeyboardDirection::Right, &cx).is_none());

        let cx = KeyboardContext {
            nest_under_leaves: true,
            ..cx
        };
        let step = keyboard_step(KeyboardDirection::Right, &cx).unwrap();
        assert_eq!(step.offset, INDENT);
    }

    #[test]
    fn right_arrow_stops_at_last_group_level() {
        let items = visible_items(&tree(), Some(&"C".into()));
        let rects = rows(&items);
        let active: NodeId = "C".into();
        let cx = KeyboardContext {
            items: &items,
            active_id: &active,
            over_id: Some(&active),
            offset: 0.0,
            indentation_width: INDENT,
            nest_under_leaves: false,
            collision_rect: rects[2].1,
            coordinates: Point::default(),
            droppable_rects: &rects,
        };
        let step = keyboard_step(KeyboardDirection::Right, &cx).unwrap();
        assert_eq!(step.offset, INDENT);

        // B is a leaf, so the next level would be lifted straight back into A.
        let cx = KeyboardContext { offset: step.offset, ..cx };
        assert!(keyboard_step(KeyboardDirection::Right, &cx).is_none());
    }

    #[test]
    fn left_arrow_is_ignored_at_min_depth() {
        let items = visible_items(&tree(), Some(&"C".into()));
        let rects = rows(&items);
        let active: NodeId = "C".into();
        let cx = KeyboardContext {
            items: &items,
            active_id: &active,
            over_id: Some(&active),
            offset: 0.0,
            indentation_width: INDENT,
            nest_under_leaves: false,
            collision_rect: rects[2].1,
            coordinates: Point::default(),
            droppable_rects: &rects,
        };
        assert!(keyboard_step(KeyboardDirection::Left, &cx).is_none());
    }

    #[test]
    fn down_arrow_moves_to_next_row() {
        let items = visible_items(&tree(), Some(&"C".into()));
        let rects = rows(&items);
        let active: NodeId = "C".into();
        let cx = KeyboardContext {
            items: &items,
            active_id: &active,
            over_id: Some(&active),
            offset: 0.0,
            indentation_width: INDENT,
            nest_under_leaves: false,
            collision_rect: rects[2].1,
            coordinates: Point::default(),
            droppable_rects: &rects,
        };
        let step = keyboard_step(KeyboardDirection::Down, &cx).unwrap();
        assert_eq!(step.over_id, NodeId::from("D"));
        assert_eq!(step.offset, 0.0);
        assert_eq!(step.coordinates, Point::new(0.0, 3.0 * ROW));
    }

    #[test]
    fn up_arrow_keeps_relative_depth() {
        let items = visible_items(&tree(), Some(&"C".into()));
        let rects = rows(&items);
        let active: NodeId = "C".into();
        let cx = KeyboardContext {
            items: &items,
            active_id: &active,
            over_id: Some(&active),
            offset: 0.0,
            indentation_width: INDENT,
            nest_under_leaves: false,
            collision_rect: rects[2].1,
            coordinates: Point::default(),
            droppable_rects: &rects,
        };
        let step = keyboard_step(KeyboardDirection::Up, &cx).unwrap();
        assert_eq!(step.over_id, NodeId::from("B"));
        // Over B from below: previous is A, next is B, so the node lands inside A.
        assert_eq!(step.offset, INDENT);
        assert_eq!(step.coordinates, Point::new(INDENT, ROW));
    }

    #[test]
    fn no_over_target_means_no_step() {
        let items = visible_items(&tree(), None);
        let rects = rows(&items);
        let active: NodeId = "C".into();
        let cx = KeyboardContext {
            items: &items,
            active_id: &active,
            over_id: None,
            offset: 0.0,
            indentation_width: INDENT,
            nest_under_leaves: false,
            collision_rect: rects[2].1,
            coordinates: Point::default(),
            droppable_rects: &rects,
        };
        assert!(keyboard_step(KeyboardDirection::Down, &cx).is_none());
    }

    #[test]
    fn corner_distance_is_zero_for_same_rect() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r.corner_distance(r), 0.0);
        assert_eq!(r.corner_distance(Rect::new(1.0, 12.0, 3.0, 4.0)), 10.0);
    }
}
