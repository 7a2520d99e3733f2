//! Drag lifecycle: `Idle -> Dragging -> (commit | cancel) -> Settling -> Idle`.
//!
//! The session never touches the caller's tree while a drag is in progress. It works on a
//! private snapshot taken at [`DragSession::start`] and hands back a complete new tree on commit,
//! or the untouched snapshot on cancel.

use std::time::{Duration, Instant};

use crate::announce::{self, Movement};
use crate::config::SortableTreeConfig;
use crate::keyboard::{KeyboardContext, KeyboardDirection, KeyboardStep, Point, Rect, keyboard_step};
use crate::node::{FlatNode, NodeId, TreeNode};
use crate::projection::{MovedView, Projection, resolve_projection};
use crate::tree::{build, find_parent_id, flatten, visible_items};

/// An in-progress drag.
#[derive(Debug, Clone)]
pub struct ActiveDrag<T> {
    active_id: NodeId,
    over_id: Option<NodeId>,
    offset: f32,
    origin_parent_id: Option<NodeId>,
    /// Visible list at drag start, with the active node's subtree hidden.
    items: Vec<FlatNode<T>>,
    snapshot: Vec<TreeNode<T>>,
    projection: Option<Projection>,
    last_position: Option<(NodeId, Option<NodeId>)>,
}

impl<T> ActiveDrag<T> {
    pub fn active_id(&self) -> &NodeId {
        &self.active_id
    }

    pub fn over_id(&self) -> Option<&NodeId> {
        self.over_id.as_ref()
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Parent of the active node before the drag started.
    pub fn origin_parent_id(&self) -> Option<&NodeId> {
        self.origin_parent_id.as_ref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn items(&self) -> &[FlatNode<T>] {
        &self.items
    }

    pub fn active_item(&self) -> Option<&FlatNode<T>> {
        self.items.iter().find(|item| item.id == self.active_id)
    }
}

#[derive(Debug, Clone)]
pub enum DragState<T> {
    Idle,
    Dragging(ActiveDrag<T>),
    /// Just committed; the flat list is frozen until `until`.
    Settling {
        until: Instant,
        items: Vec<FlatNode<T>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome<T> {
    /// The drop was applied. `changed` is false when the node ended where it started.
    Committed { tree: Vec<TreeNode<T>>, changed: bool },
    /// The drag was abandoned; `tree` is the pre-drag snapshot.
    Cancelled { tree: Vec<TreeNode<T>> },
    /// No drag was in progress.
    Ignored,
}

pub struct DragSession<T> {
    state: DragState<T>,
    indentation_width: f32,
    settle_delay: Duration,
    nest_under_leaves: bool,
    announcement: Option<String>,
}

impl<T: Clone + PartialEq> DragSession<T> {
    pub fn new(config: &SortableTreeConfig) -> Self {
        Self {
            state: DragState::Idle,
            indentation_width: config.indentation_width,
            settle_delay: config.settle_delay_duration(),
            nest_under_leaves: config.nest_under_leaves,
            announcement: None,
        }
    }

    pub fn state(&self) -> &DragState<T> {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn is_settling(&self) -> bool {
        matches!(self.state, DragState::Settling { .. })
    }

    pub fn active(&self) -> Option<&ActiveDrag<T>> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            _ => None,
        }
    }

    pub fn active_id(&self) -> Option<&NodeId> {
        self.active().map(|drag| &drag.active_id)
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.active().and_then(|drag| drag.projection.as_ref())
    }

    pub fn indentation_width(&self) -> f32 {
        self.indentation_width
    }

    /// Items a view should render while the session owns the list, `None` when idle.
    pub fn items(&self) -> Option<&[FlatNode<T>]> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging(drag) => Some(&drag.items),
            DragState::Settling { items, .. } => Some(items),
        }
    }

    /// Like [`DragSession::items`], but a settle freeze whose delay has elapsed at `now` no
    /// longer counts, even if [`DragSession::settle`] was never called.
    pub fn items_at(&self, now: Instant) -> Option<&[FlatNode<T>]> {
        match &self.state {
            DragState::Settling { until, .. } if now >= *until => None,
            _ => self.items(),
        }
    }

    /// Latest accessibility message.
    pub fn announcement(&self) -> Option<&str> {
        self.announcement.as_deref()
    }

    /// Pick up `active_id`. Ignored while another drag is running or when the node is not
    /// visible in `tree`.
    pub fn start(&mut self, tree: &[TreeNode<T>], active_id: NodeId) -> bool {
        if self.is_dragging() {
            return false;
        }

        let items = visible_items(tree, Some(&active_id));
        let Some(active) = items.iter().find(|item| item.id == active_id) else {
            tracing::debug!(id = %active_id, "drag start ignored, node not visible");
            return false;
        };

        self.announcement = Some(announce::picked_up(&active.name));
        let origin_parent_id = find_parent_id(tree, &active_id);
        tracing::debug!(id = %active_id, parent = ?origin_parent_id, "drag started");

        let mut drag = ActiveDrag {
            over_id: Some(active_id.clone()),
            active_id,
            offset: 0.0,
            origin_parent_id,
            items,
            snapshot: tree.to_vec(),
            projection: None,
            last_position: None,
        };
        self.reproject(&mut drag);
        self.state = DragState::Dragging(drag);
        true
    }

    /// Horizontal pointer distance since the drag started.
    pub fn drag_move(&mut self, offset: f32) {
        self.update(|drag| drag.offset = offset, Movement::Moved);
    }

    /// The row currently hovered, `None` when the pointer left every drop target.
    pub fn over(&mut self, over_id: Option<NodeId>) {
        self.update(|drag| drag.over_id = over_id, Movement::Moved);
    }

    /// Apply an arrow key. Returns the synthetic pointer coordinate on success; keys with no
    /// legal effect are ignored.
    pub fn keyboard(
        &mut self,
        direction: KeyboardDirection,
        collision_rect: Rect,
        coordinates: Point,
        droppable_rects: &[(NodeId, Rect)],
    ) -> Option<Point> {
        let step = {
            let drag = self.active()?;
            let cx = KeyboardContext {
                items: &drag.items,
                active_id: &drag.active_id,
                over_id: drag.over_id.as_ref(),
                offset: drag.offset,
                indentation_width: self.indentation_width,
                nest_under_leaves: self.nest_under_leaves,
                collision_rect,
                coordinates,
                droppable_rects,
            };
            keyboard_step(direction, &cx)?
        };

        let KeyboardStep {
            over_id,
            offset,
            coordinates,
        } = step;
        self.update(
            |drag| {
                drag.over_id = Some(over_id);
                drag.offset = offset;
            },
            Movement::Moved,
        );
        Some(coordinates)
    }

    /// Drop. Without a resolvable target this behaves exactly like [`DragSession::cancel`].
    pub fn end(&mut self, now: Instant) -> DragOutcome<T> {
        let drag = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(drag) => drag,
            other => {
                self.state = other;
                return DragOutcome::Ignored;
            }
        };

        let (Some(over_id), Some(projection)) = (drag.over_id.clone(), drag.projection.clone())
        else {
            return self.cancelled(drag);
        };
        let Some(tree) = commit(&drag, &over_id, &projection) else {
            return self.cancelled(drag);
        };

        let changed = tree != drag.snapshot;
        self.announcement = announce::movement(
            &drag.items,
            &drag.active_id,
            &over_id,
            &projection,
            Movement::Dropped,
        );
        tracing::debug!(
            id = %drag.active_id,
            over = %over_id,
            depth = projection.depth,
            parent = ?projection.parent_id,
            changed,
            "drag committed"
        );

        if !self.settle_delay.is_zero() {
            self.state = DragState::Settling {
                until: now + self.settle_delay,
                items: visible_items(&tree, None),
            };
        }
        DragOutcome::Committed { tree, changed }
    }

    pub fn cancel(&mut self) -> DragOutcome<T> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(drag) => self.cancelled(drag),
            other => {
                self.state = other;
                DragOutcome::Ignored
            }
        }
    }

    /// Abandon whatever the session holds: a running drag is cancelled, a settle freeze is
    /// dropped immediately.
    pub fn interrupt(&mut self) -> DragOutcome<T> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(drag) => self.cancelled(drag),
            DragState::Settling { .. } => {
                tracing::trace!("settle interrupted");
                DragOutcome::Ignored
            }
            DragState::Idle => DragOutcome::Ignored,
        }
    }

    /// Leave the settling state once its delay has elapsed. Returns true on transition.
    pub fn settle(&mut self, now: Instant) -> bool {
        match self.state {
            DragState::Settling { until, .. } if now >= until => {
                self.state = DragState::Idle;
                true
            }
            _ => false,
        }
    }

    fn cancelled(&mut self, drag: ActiveDrag<T>) -> DragOutcome<T> {
        let name = drag
            .active_item()
            .map_or_else(|| drag.active_id.to_string(), |item| item.name.clone());
        self.announcement = Some(announce::cancelled(&name));
        tracing::debug!(id = %drag.active_id, "drag cancelled");
        DragOutcome::Cancelled {
            tree: drag.snapshot,
        }
    }

    fn update(&mut self, apply: impl FnOnce(&mut ActiveDrag<T>), movement: Movement) {
        let DragState::Dragging(mut drag) = std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return;
        };
        apply(&mut drag);
        self.reproject(&mut drag);

        if let (Some(over_id), Some(projection)) = (&drag.over_id, &drag.projection) {
            let position = (over_id.clone(), projection.parent_id.clone());
            if drag.last_position.as_ref() != Some(&position) {
                if let Some(message) =
                    announce::movement(&drag.items, &drag.active_id, over_id, projection, movement)
                {
                    self.announcement = Some(message);
                }
                drag.last_position = Some(position);
            }
        }
        self.state = DragState::Dragging(drag);
    }

    fn reproject(&self, drag: &mut ActiveDrag<T>) {
        drag.projection = drag.over_id.as_ref().and_then(|over_id| {
            resolve_projection(
                &drag.items,
                &drag.active_id,
                over_id,
                drag.offset,
                self.indentation_width,
                self.nest_under_leaves,
            )
        });
    }
}

/// Move the active node (with its hidden subtree) to the projected position and rebuild.
///
/// The active block is placed right before the item that follows it in the simulated visible
/// order, so hidden descendants of the row above (a collapsed group) stay with their parent.
fn commit<T: Clone>(
    drag: &ActiveDrag<T>,
    over_id: &NodeId,
    projection: &Projection,
) -> Option<Vec<TreeNode<T>>> {
    let active_ix = drag.items.iter().position(|item| item.id == drag.active_id)?;
    let over_ix = drag.items.iter().position(|item| item.id == *over_id)?;
    let next_id = MovedView::new(&drag.items, active_ix, over_ix)
        .get(over_ix + 1)
        .map(|item| item.id.clone());

    let mut full = flatten(&drag.snapshot);
    let start = full.iter().position(|item| item.id == drag.active_id)?;
    let end = start + 1 + full[start].descendant_count;
    let mut block: Vec<FlatNode<T>> = full.drain(start..end).collect();

    let base = block[0].depth;
    for item in &mut block {
        item.depth = item.depth - base + projection.depth;
    }
    block[0].parent_id = projection.parent_id.clone();

    let at = next_id
        .and_then(|next_id| full.iter().position(|item| item.id == next_id))
        .unwrap_or(full.len());
    full.splice(at..at, block);

    Some(build(&full))
}
