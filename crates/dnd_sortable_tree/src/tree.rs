use std::{ops::Range, rc::Rc};

use gpui::{
    App, AppContext as _, Context, DragMoveEvent, ElementId, Entity, EntityId, EventEmitter,
    FocusHandle, InteractiveElement as _, IntoElement, KeyBinding, ListSizingBehavior,
    ParentElement as _, Pixels, Render, RenderOnce, SharedString,
    StatefulInteractiveElement as _, StyleRefinement, Styled, UniformListScrollHandle, Window,
    actions, div, prelude::FluentBuilder as _, px, uniform_list,
};
use gpui_component::list::ListItem;
use gpui_component::scroll::{Scrollbar, ScrollbarState};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use manos_sortable_tree::{
    FlatNode, KeyboardDirection, NodeId, Point, Rect, SortableTreeConfig, TreeEditor, TreeEvent,
    TreeNode,
};

const CONTEXT: &str = "SortableTree";
const DEFAULT_ROW_HEIGHT: f32 = 28.;
const DEFAULT_ROW_WIDTH: f32 = 240.;

actions!(
    sortable_tree,
    [PickUp, Cancel, MoveUp, MoveDown, MoveLeft, MoveRight]
);

pub(crate) fn init(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("space", PickUp, Some(CONTEXT)),
        KeyBinding::new("enter", PickUp, Some(CONTEXT)),
        KeyBinding::new("escape", Cancel, Some(CONTEXT)),
        KeyBinding::new("up", MoveUp, Some(CONTEXT)),
        KeyBinding::new("down", MoveDown, Some(CONTEXT)),
        KeyBinding::new("left", MoveLeft, Some(CONTEXT)),
        KeyBinding::new("right", MoveRight, Some(CONTEXT)),
    ]);
}

/// Create a [`SortableTree`].
pub fn sortable_tree<T, R>(
    state: &Entity<SortableTreeState<T>>,
    render_item: R,
) -> SortableTree<T>
where
    T: Clone + PartialEq + 'static,
    R: Fn(usize, &FlatNode<T>, SortableTreeRowState, &mut Window, &mut App) -> ListItem + 'static,
{
    SortableTree::new(state, render_item)
}

#[derive(Clone)]
struct SortableTreeDrag {
    tree_id: EntityId,
    item_id: NodeId,
    label: SharedString,
}

struct DragGhost {
    label: SharedString,
}

impl DragGhost {
    fn new(label: SharedString) -> Self {
        Self { label }
    }
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        div()
            .px(px(10.))
            .py(px(6.))
            .rounded(px(8.))
            .bg(theme.popover)
            .border_1()
            .border_color(theme.border)
            .shadow_md()
            .text_color(theme.popover_foreground)
            .text_sm()
            .child(self.label.clone())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortableTreeRowState {
    /// Keyboard cursor row.
    pub focused: bool,
    pub selected: bool,
    pub dragging: bool,
    /// Depth to indent the row at. For the dragged row this is the projected depth.
    pub depth: usize,
}

/// State for a sortable tree view.
///
/// Wraps a [`TreeEditor`] and forwards every host callback as a [`TreeEvent`], so owners
/// persist changes with `cx.subscribe`.
pub struct SortableTreeState<T> {
    focus_handle: FocusHandle,
    editor: TreeEditor<T>,
    entries: Vec<FlatNode<T>>,
    indent_offset: Pixels,
    scrollbar_state: ScrollbarState,
    scroll_handle: UniformListScrollHandle,
    focused_id: Option<NodeId>,
    drag_origin_x: Option<Pixels>,
    keyboard_drag: bool,
    keyboard_cursor: Option<Point>,
    render_item:
        Rc<dyn Fn(usize, &FlatNode<T>, SortableTreeRowState, &mut Window, &mut App) -> ListItem>,
}

impl<T: 'static> EventEmitter<TreeEvent<T>> for SortableTreeState<T> {}

impl<T: Clone + PartialEq + 'static> SortableTreeState<T> {
    pub fn new(cx: &mut App) -> Self {
        Self {
            focus_handle: cx.focus_handle(),
            editor: TreeEditor::new(Vec::new(), SortableTreeConfig::default()),
            entries: Vec::new(),
            indent_offset: px(0.),
            scrollbar_state: ScrollbarState::default(),
            scroll_handle: UniformListScrollHandle::default(),
            focused_id: None,
            drag_origin_x: None,
            keyboard_drag: false,
            keyboard_cursor: None,
            render_item: Rc::new(|_, _, _, _, _| ListItem::new("sortable-tree-empty")),
        }
    }

    pub fn config(mut self, config: SortableTreeConfig) -> Self {
        self.editor = TreeEditor::new(self.editor.items().to_vec(), config);
        self.refresh();
        self
    }

    /// Set the indentation width (in pixels) used to infer the intended depth during a drag.
    ///
    /// This should match the indentation used by your row renderer.
    pub fn indent_width(self, indent_width: Pixels) -> Self {
        let config = self
            .editor
            .config()
            .clone()
            .indentation_width(f32::from(indent_width));
        self.config(config)
    }

    /// Set the left offset for the drop indicator line.
    ///
    /// This is purely visual and does not affect the actual tree indentation.
    pub fn indent_offset(mut self, indent_offset: Pixels) -> Self {
        self.indent_offset = indent_offset;
        self
    }

    pub fn items(mut self, items: Vec<TreeNode<T>>) -> Self {
        self.editor.set_items(items);
        self.refresh();
        self
    }

    pub fn set_items(&mut self, items: Vec<TreeNode<T>>, cx: &mut Context<Self>) {
        self.editor.set_items(items);
        self.reset_drag();
        self.refresh();
        cx.notify();
    }

    pub fn root_items(&self) -> &[TreeNode<T>] {
        self.editor.items()
    }

    pub fn editor(&self) -> &TreeEditor<T> {
        &self.editor
    }

    /// Rows currently rendered.
    pub fn entries(&self) -> &[FlatNode<T>] {
        &self.entries
    }

    pub fn focused_entry(&self) -> Option<&FlatNode<T>> {
        let id = self.focused_id.as_ref()?;
        self.entries.iter().find(|entry| entry.id == *id)
    }

    pub fn announcement(&self) -> Option<&str> {
        self.editor.session().announcement()
    }

    fn indent_width_px(&self) -> Pixels {
        px(self.editor.config().indentation_width)
    }

    pub fn add_group(
        &mut self,
        id: impl Into<NodeId>,
        cx: &mut Context<Self>,
    ) -> Option<String> {
        let mut events: Vec<TreeEvent<T>> = Vec::new();
        let name = self.editor.add_group(id, &mut events);
        self.flush(events, cx);
        name
    }

    pub fn rename_group(
        &mut self,
        id: &NodeId,
        name: impl Into<String>,
        cx: &mut Context<Self>,
    ) {
        let mut events: Vec<TreeEvent<T>> = Vec::new();
        self.editor.rename_group(id, name, &mut events);
        self.flush(events, cx);
    }

    pub fn remove_group(&mut self, id: &NodeId, cx: &mut Context<Self>) {
        let mut events: Vec<TreeEvent<T>> = Vec::new();
        self.editor.remove_group(id, &mut events);
        self.flush(events, cx);
    }

    pub fn remove_leaf(&mut self, id: &NodeId, cx: &mut Context<Self>) {
        let mut events: Vec<TreeEvent<T>> = Vec::new();
        self.editor.remove_leaf(id, &mut events);
        self.flush(events, cx);
    }

    pub fn change_leaf(&mut self, id: &NodeId, data: T, cx: &mut Context<Self>) {
        let mut events: Vec<TreeEvent<T>> = Vec::new();
        self.editor.change_leaf(id, data, &mut events);
        self.flush(events, cx);
    }

    pub fn remove_selected(&mut self, cx: &mut Context<Self>) {
        let mut events: Vec<TreeEvent<T>> = Vec::new();
        self.editor.remove_selected(&mut events);
        self.flush(events, cx);
    }

    pub fn toggle_collapsed(&mut self, id: &NodeId, cx: &mut Context<Self>) {
        self.editor.toggle_collapsed(id);
        self.refresh();
        cx.notify();
    }

    pub fn toggle_selected(&mut self, id: &NodeId, cx: &mut Context<Self>) {
        self.editor.toggle_selected(id);
        cx.notify();
    }

    pub fn clear_selection(&mut self, cx: &mut Context<Self>) {
        self.editor.clear_selection();
        cx.notify();
    }

    fn flush(&mut self, events: Vec<TreeEvent<T>>, cx: &mut Context<Self>) {
        self.refresh();
        for event in events {
            cx.emit(event);
        }
        cx.notify();
    }

    fn refresh(&mut self) {
        // Structural edits cancel a running drag inside the editor.
        if !self.editor.session().is_dragging() {
            self.reset_drag();
        }
        self.entries = self.editor.visible_items();
        if let Some(id) = self.focused_id.as_ref()
            && !self.entries.iter().any(|entry| entry.id == *id)
        {
            self.focused_id = None;
        }
    }

    fn reset_drag(&mut self) {
        self.drag_origin_x = None;
        self.keyboard_drag = false;
        self.keyboard_cursor = None;
    }

    fn row_metrics(&self) -> (f32, f32) {
        let size = self
            .scroll_handle
            .0
            .borrow()
            .last_item_size
            .map(|s| s.item);
        (
            size.map_or(DEFAULT_ROW_WIDTH, |s| f32::from(s.width)),
            size.map_or(DEFAULT_ROW_HEIGHT, |s| f32::from(s.height)),
        )
    }

    fn row_state(&self, entry: &FlatNode<T>) -> SortableTreeRowState {
        let session = self.editor.session();
        let dragging = session.active_id() == Some(&entry.id);
        let depth = if dragging {
            session.projection().map_or(entry.depth, |p| p.depth)
        } else {
            entry.depth
        };
        SortableTreeRowState {
            focused: self.focused_id.as_ref() == Some(&entry.id),
            selected: self.editor.selection().contains(&entry.id),
            dragging,
            depth,
        }
    }

    /// Left and top of the insertion line for the current drag, in list coordinates.
    fn insertion_line(&self) -> Option<(Pixels, Pixels)> {
        let drag = self.editor.session().active()?;
        let over_id = drag.over_id()?;
        let projection = drag.projection()?;
        let active_ix = self
            .entries
            .iter()
            .position(|entry| entry.id == *drag.active_id())?;
        let over_ix = self.entries.iter().position(|entry| entry.id == *over_id)?;

        let (_, row_height) = self.row_metrics();
        let scroll_y = self.scroll_handle.0.borrow().base_handle.offset().y;
        Some((
            self.indent_offset + self.indent_width_px() * projection.depth,
            px(row_height) * insertion_row(active_ix, over_ix) + scroll_y,
        ))
    }

    fn on_entry_click(&mut self, ix: usize, window: &mut Window, cx: &mut Context<Self>) {
        let Some(entry) = self.entries.get(ix) else {
            return;
        };
        let id = entry.id.clone();
        let is_group = entry.is_group;

        window.focus(&self.focus_handle);
        if window.modifiers().secondary() {
            self.editor.toggle_selected(&id);
        } else if is_group {
            self.editor.toggle_collapsed(&id);
        }
        self.focused_id = Some(id);
        self.refresh();
        cx.notify();
    }

    fn on_drag_start(
        &mut self,
        drag: &SortableTreeDrag,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if drag.tree_id != cx.entity_id() || !self.editor.start_drag(drag.item_id.clone()) {
            return;
        }
        tracing::debug!(id = %drag.item_id, "pointer drag started");
        self.reset_drag();
        self.drag_origin_x = Some(window.mouse_position().x);
        self.focused_id = Some(drag.item_id.clone());
        self.refresh();
        cx.notify();
    }

    fn on_row_drag_move(
        &mut self,
        row_ix: usize,
        event: &DragMoveEvent<SortableTreeDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() {
            return;
        }

        let drag = event.drag(cx);
        if drag.tree_id != cx.entity_id() {
            return;
        }

        let mouse_position = event.event.position;
        if !event.bounds.contains(&mouse_position) {
            return;
        }
        let Some(over_id) = self.entries.get(row_ix).map(|entry| entry.id.clone()) else {
            return;
        };

        let offset = self
            .drag_origin_x
            .map_or(0., |origin_x| f32::from(mouse_position.x - origin_x));
        let before = self.editor.session().projection().cloned();
        let over_changed = self
            .editor
            .session()
            .active()
            .and_then(|drag| drag.over_id())
            != Some(&over_id);

        if over_changed {
            self.editor.drag_over(Some(over_id));
        }
        self.editor.drag_move(offset);
        if over_changed || self.editor.session().projection() != before.as_ref() {
            cx.notify();
        }
    }

    fn on_drag_move(
        &mut self,
        event: &DragMoveEvent<SortableTreeDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() || event.drag(cx).tree_id != cx.entity_id() {
            return;
        }

        let over_any = self
            .editor
            .session()
            .active()
            .is_some_and(|drag| drag.over_id().is_some());
        if over_any && !event.bounds.contains(&event.event.position) {
            self.editor.drag_over(None);
            cx.notify();
        }
    }

    fn on_drop(&mut self, drag: &SortableTreeDrag, _window: &mut Window, cx: &mut Context<Self>) {
        if drag.tree_id != cx.entity_id() {
            return;
        }
        self.finish_drag(cx);
    }

    fn finish_drag(&mut self, cx: &mut Context<Self>) {
        let mut events: Vec<TreeEvent<T>> = Vec::new();
        self.editor.end_drag(&mut events);
        self.reset_drag();
        self.schedule_settle(cx);
        self.flush(events, cx);
    }

    fn schedule_settle(&mut self, cx: &mut Context<Self>) {
        if !self.editor.session().is_settling() {
            return;
        }

        let delay = self.editor.config().settle_delay_duration();
        cx.spawn(async move |this, cx| {
            cx.background_executor().timer(delay).await;
            _ = this.update(cx, |state, cx| {
                if state.editor.settle() {
                    state.refresh();
                    cx.notify();
                }
            });
        })
        .detach();
    }

    fn pick_up(&mut self, _: &PickUp, _window: &mut Window, cx: &mut Context<Self>) {
        if self.editor.session().is_dragging() {
            if self.keyboard_drag {
                self.finish_drag(cx);
            }
            return;
        }

        let Some(id) = self.focused_id.clone() else {
            return;
        };
        let Some(ix) = self.entries.iter().position(|entry| entry.id == id) else {
            return;
        };
        if !self.editor.start_drag(id.clone()) {
            return;
        }
        tracing::debug!(%id, "keyboard drag started");

        let (_, row_height) = self.row_metrics();
        self.reset_drag();
        self.keyboard_drag = true;
        self.keyboard_cursor = Some(Point::new(0., ix as f32 * row_height));
        self.refresh();
        cx.notify();
    }

    fn cancel(&mut self, _: &Cancel, _window: &mut Window, cx: &mut Context<Self>) {
        if !self.editor.session().is_dragging() {
            return;
        }
        self.editor.cancel_drag();
        self.reset_drag();
        self.refresh();
        cx.notify();
    }

    fn move_up(&mut self, _: &MoveUp, _window: &mut Window, cx: &mut Context<Self>) {
        self.navigate(KeyboardDirection::Up, cx);
    }

    fn move_down(&mut self, _: &MoveDown, _window: &mut Window, cx: &mut Context<Self>) {
        self.navigate(KeyboardDirection::Down, cx);
    }

    fn move_left(&mut self, _: &MoveLeft, _window: &mut Window, cx: &mut Context<Self>) {
        self.navigate(KeyboardDirection::Left, cx);
    }

    fn move_right(&mut self, _: &MoveRight, _window: &mut Window, cx: &mut Context<Self>) {
        self.navigate(KeyboardDirection::Right, cx);
    }

    fn navigate(&mut self, direction: KeyboardDirection, cx: &mut Context<Self>) {
        if self.keyboard_drag {
            self.step_drag(direction, cx);
        } else {
            self.move_focus(direction, cx);
        }
    }

    fn step_drag(&mut self, direction: KeyboardDirection, cx: &mut Context<Self>) {
        let Some(cursor) = self.keyboard_cursor else {
            return;
        };
        let (row_width, row_height) = self.row_metrics();
        let rects: Vec<(NodeId, Rect)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(ix, entry)| (entry.id.clone(), row_rect(ix, row_width, row_height)))
            .collect();
        let collision_rect = Rect::new(cursor.x, cursor.y, row_width, row_height);

        if let Some(next) = self
            .editor
            .drag_key(direction, collision_rect, cursor, &rects)
        {
            self.keyboard_cursor = Some(next);
            cx.notify();
        }
    }

    fn move_focus(&mut self, direction: KeyboardDirection, cx: &mut Context<Self>) {
        let current = self
            .focused_id
            .as_ref()
            .and_then(|id| self.entries.iter().position(|entry| entry.id == *id));

        if direction.is_vertical() {
            if let Some(ix) = focus_step(current, self.entries.len(), direction) {
                self.focused_id = Some(self.entries[ix].id.clone());
                self.scroll_handle
                    .scroll_to_item(ix, gpui::ScrollStrategy::Top);
                cx.notify();
            }
            return;
        }

        let Some(entry) = current.and_then(|ix| self.entries.get(ix)) else {
            return;
        };
        let expand = direction == KeyboardDirection::Right;
        if entry.is_group && entry.collapsed == expand {
            let id = entry.id.clone();
            self.toggle_collapsed(&id, cx);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Render for SortableTreeState<T> {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        // A pointer drag released outside every drop target never reaches `on_drop`.
        if !cx.has_active_drag() && !self.keyboard_drag && self.editor.session().is_dragging() {
            self.editor.cancel_drag();
            self.reset_drag();
            self.refresh();
        }

        let render_item = Rc::clone(&self.render_item);
        let state_entity = cx.entity();

        let line = self.insertion_line().map(|(x, y)| {
            let theme = cx.theme();
            div()
                .absolute()
                .left(x)
                .right_0()
                .top(y)
                .h(px(2.))
                .bg(theme.drag_border)
        });

        div()
            .id("sortable-tree-state")
            .size_full()
            .relative()
            .child(
                uniform_list("entries", self.entries.len(), {
                    cx.processor(move |state, visible_range: Range<usize>, window, cx| {
                        let mut items = Vec::with_capacity(visible_range.len());
                        for ix in visible_range {
                            let entry = &state.entries[ix];
                            let row_state = state.row_state(entry);
                            let item = (render_item)(ix, entry, row_state, window, cx);
                            let drag_value = SortableTreeDrag {
                                tree_id: cx.entity_id(),
                                item_id: entry.id.clone(),
                                label: entry.name.clone().into(),
                            };

                            let row = div()
                                .id(ix)
                                .child(item.selected(row_state.selected || row_state.focused))
                                .on_drag_move::<SortableTreeDrag>(cx.listener(
                                    move |this, ev, window, cx| {
                                        this.on_row_drag_move(ix, ev, window, cx);
                                    },
                                ))
                                .on_drop::<SortableTreeDrag>(cx.listener(Self::on_drop))
                                .on_click(cx.listener(move |this, _, window, cx| {
                                    this.on_entry_click(ix, window, cx);
                                }))
                                .on_drag(drag_value, {
                                    let state_entity = state_entity.clone();
                                    move |drag, _cursor_offset, window, cx| {
                                        state_entity.update(cx, |state, cx| {
                                            state.on_drag_start(drag, window, cx);
                                        });
                                        let label = drag.label.clone();
                                        cx.new(|_| DragGhost::new(label))
                                    }
                                });

                            items.push(row);
                        }
                        items
                    })
                })
                .on_drag_move::<SortableTreeDrag>(cx.listener(Self::on_drag_move))
                .on_drop::<SortableTreeDrag>(cx.listener(Self::on_drop))
                .flex_grow()
                .size_full()
                .track_scroll(self.scroll_handle.clone())
                .with_sizing_behavior(ListSizingBehavior::Auto)
                .into_any_element(),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .right_0()
                    .bottom_0()
                    .w(px(12.))
                    .child(Scrollbar::uniform_scroll(
                        &self.scrollbar_state,
                        &self.scroll_handle,
                    )),
            )
            .when_some(line, |this, line| this.child(line))
    }
}

/// A sortable tree view element with pointer and keyboard drag support.
#[derive(IntoElement)]
pub struct SortableTree<T: Clone + PartialEq + 'static> {
    id: ElementId,
    state: Entity<SortableTreeState<T>>,
    style: StyleRefinement,
    render_item:
        Rc<dyn Fn(usize, &FlatNode<T>, SortableTreeRowState, &mut Window, &mut App) -> ListItem>,
}

impl<T: Clone + PartialEq + 'static> SortableTree<T> {
    pub fn new<R>(state: &Entity<SortableTreeState<T>>, render_item: R) -> Self
    where
        R: Fn(usize, &FlatNode<T>, SortableTreeRowState, &mut Window, &mut App) -> ListItem
            + 'static,
    {
        Self {
            id: ElementId::Name(format!("sortable-tree-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_item: Rc::new(move |ix, entry, row_state, window, cx| {
                render_item(ix, entry, row_state, window, cx)
            }),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Styled for SortableTree<T> {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl<T: Clone + PartialEq + 'static> RenderOnce for SortableTree<T> {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        self.state
            .update(cx, |state, _| state.render_item = self.render_item);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .on_action(window.listener_for(&self.state, SortableTreeState::pick_up))
            .on_action(window.listener_for(&self.state, SortableTreeState::cancel))
            .on_action(window.listener_for(&self.state, SortableTreeState::move_up))
            .on_action(window.listener_for(&self.state, SortableTreeState::move_down))
            .on_action(window.listener_for(&self.state, SortableTreeState::move_left))
            .on_action(window.listener_for(&self.state, SortableTreeState::move_right))
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

/// Row index the insertion line sits above: the dragged row lands before `over` when moving
/// up and after it when moving down.
fn insertion_row(active_ix: usize, over_ix: usize) -> usize {
    if over_ix > active_ix {
        over_ix + 1
    } else {
        over_ix
    }
}

fn row_rect(ix: usize, row_width: f32, row_height: f32) -> Rect {
    Rect::new(0., ix as f32 * row_height, row_width, row_height)
}

fn focus_step(current: Option<usize>, len: usize, direction: KeyboardDirection) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let Some(current) = current else {
        return Some(0);
    };
    match direction {
        KeyboardDirection::Up => Some(current.saturating_sub(1)),
        KeyboardDirection::Down => Some((current + 1).min(len - 1)),
        KeyboardDirection::Left | KeyboardDirection::Right => None,
    }
}
