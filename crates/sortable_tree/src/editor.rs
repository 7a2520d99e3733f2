use std::time::Instant;

use crate::config::SortableTreeConfig;
use crate::host::TreeHost;
use crate::keyboard::{KeyboardDirection, Point, Rect};
use crate::node::{FlatNode, NodeId, TreeNode};
use crate::selection::SelectionSet;
use crate::session::{DragOutcome, DragSession};
use crate::tree::{
    descendant_leaf_ids, find_item, get_child_count, next_group_name, remove_item, set_property,
    visible_items,
};

/// The nested tree together with its drag session and selection.
///
/// Structural edits (group management, leaf removal) apply to the nested tree immediately and
/// are reported to the [`TreeHost`]. Drags go through the [`DragSession`] and replace the tree
/// wholesale on commit, so an edit that applies while a drag is running cancels that drag first,
/// and ends any settle freeze. Unknown ids are silently ignored everywhere.
pub struct TreeEditor<T> {
    items: Vec<TreeNode<T>>,
    config: SortableTreeConfig,
    session: DragSession<T>,
    selection: SelectionSet,
}

impl<T: Clone + PartialEq> TreeEditor<T> {
    pub fn new(items: Vec<TreeNode<T>>, config: SortableTreeConfig) -> Self {
        Self {
            session: DragSession::new(&config),
            items,
            config,
            selection: SelectionSet::new(),
        }
    }

    pub fn items(&self) -> &[TreeNode<T>] {
        &self.items
    }

    pub fn config(&self) -> &SortableTreeConfig {
        &self.config
    }

    pub fn session(&self) -> &DragSession<T> {
        &self.session
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Replace the tree with a fresh host snapshot. Any running drag is dropped.
    pub fn set_items(&mut self, items: Vec<TreeNode<T>>) {
        self.session.interrupt();
        self.items = items;
        self.selection.retain_existing(&self.items);
    }

    /// Rows to render. During a drag (and while settling) this is the session's list.
    pub fn visible_items(&self) -> Vec<FlatNode<T>> {
        match self.session.items_at(Instant::now()) {
            Some(items) => items.to_vec(),
            None => visible_items(&self.items, None),
        }
    }

    pub fn child_count(&self, id: &NodeId) -> usize {
        get_child_count(&self.items, id)
    }

    pub fn start_drag(&mut self, id: impl Into<NodeId>) -> bool {
        self.session.start(&self.items, id.into())
    }

    pub fn drag_move(&mut self, offset: f32) {
        self.session.drag_move(offset);
    }

    pub fn drag_over(&mut self, over_id: Option<NodeId>) {
        self.session.over(over_id);
    }

    pub fn drag_key(
        &mut self,
        direction: KeyboardDirection,
        collision_rect: Rect,
        coordinates: Point,
        droppable_rects: &[(NodeId, Rect)],
    ) -> Option<Point> {
        self.session
            .keyboard(direction, collision_rect, coordinates, droppable_rects)
    }

    /// Drop the dragged node. Returns true when the tree changed.
    pub fn end_drag(&mut self, host: &mut dyn TreeHost<T>) -> bool {
        self.end_drag_at(Instant::now(), host)
    }

    pub fn end_drag_at(&mut self, now: Instant, host: &mut dyn TreeHost<T>) -> bool {
        match self.session.end(now) {
            DragOutcome::Committed { tree, changed } => {
                self.items = tree;
                if changed {
                    host.on_reorder(&self.items);
                }
                changed
            }
            DragOutcome::Cancelled { tree } => {
                self.items = tree;
                false
            }
            DragOutcome::Ignored => false,
        }
    }

    pub fn cancel_drag(&mut self) {
        if let DragOutcome::Cancelled { tree } = self.session.cancel() {
            self.items = tree;
        }
    }

    /// Finish the post-commit settle delay if it has elapsed. Hosts should call this once the
    /// delay has passed; until then [`TreeEditor::session`] still reports settling, although
    /// [`TreeEditor::visible_items`] already falls back to the tree.
    pub fn settle(&mut self) -> bool {
        self.session.settle(Instant::now())
    }

    pub fn toggle_collapsed(&mut self, id: &NodeId) {
        if !self.config.collapsible {
            return;
        }
        if find_item(&self.items, id).is_some_and(|node| node.is_group) {
            self.interrupt_drag();
            self.items = set_property(&self.items, id, TreeNode::collapsed_mut, |collapsed| {
                !collapsed
            });
        }
    }

    /// Add an empty root group with a generated, non-colliding name.
    pub fn add_group(
        &mut self,
        id: impl Into<NodeId>,
        host: &mut dyn TreeHost<T>,
    ) -> Option<String> {
        let id = id.into();
        if find_item(&self.items, &id).is_some() {
            tracing::debug!(%id, "add group ignored, id already used");
            return None;
        }
        self.interrupt_drag();
        let name = next_group_name(&self.items, &self.config.default_group_prefix);
        self.items.push(TreeNode::group(id.clone(), name.clone()));
        tracing::debug!(%id, %name, "group added");
        host.on_group_added(&id, &name);
        Some(name)
    }

    pub fn rename_group(
        &mut self,
        id: &NodeId,
        name: impl Into<String>,
        host: &mut dyn TreeHost<T>,
    ) {
        if !find_item(&self.items, id).is_some_and(|node| node.is_group) {
            return;
        }
        self.interrupt_drag();
        let name = name.into();
        self.items = set_property(&self.items, id, TreeNode::name_mut, |_| name.clone());
        tracing::debug!(%id, %name, "group renamed");
        host.on_group_renamed(id, &name);
    }

    /// Remove a group. Every leaf below it is reported removed first, in tree order.
    pub fn remove_group(&mut self, id: &NodeId, host: &mut dyn TreeHost<T>) {
        if !self.config.removable {
            return;
        }
        let Some(group) = find_item(&self.items, id).filter(|node| node.is_group) else {
            return;
        };
        let leaf_ids = descendant_leaf_ids(group);
        self.interrupt_drag();

        for leaf_id in leaf_ids {
            let data = find_item(&self.items, &leaf_id).and_then(|leaf| leaf.data.as_ref());
            if let Some(data) = data {
                host.on_leaf_removed(&leaf_id, data);
            }
        }
        host.on_group_removed(id);

        self.items = remove_item(&self.items, id);
        self.selection.retain_existing(&self.items);
        tracing::debug!(%id, "group removed");
    }

    pub fn remove_leaf(&mut self, id: &NodeId, host: &mut dyn TreeHost<T>) {
        if !self.config.removable {
            return;
        }
        let Some(data) = find_item(&self.items, id)
            .filter(|node| node.is_leaf())
            .and_then(|node| node.data.clone())
        else {
            return;
        };

        self.interrupt_drag();
        host.on_leaf_removed(id, &data);
        self.items = remove_item(&self.items, id);
        self.selection.retain_existing(&self.items);
        tracing::debug!(%id, "leaf removed");
    }

    pub fn change_leaf(&mut self, id: &NodeId, data: T, host: &mut dyn TreeHost<T>) {
        if !find_item(&self.items, id).is_some_and(|node| node.is_leaf()) {
            return;
        }
        self.interrupt_drag();
        self.items = set_property(&self.items, id, TreeNode::data_mut, |_| Some(data.clone()));
        host.on_leaf_changed(id, &data);
    }

    /// Toggle selection of a leaf or a whole group.
    pub fn toggle_selected(&mut self, id: &NodeId) {
        match find_item(&self.items, id) {
            Some(node) if node.is_group => self.selection.toggle_group(&self.items, id),
            Some(_) => self.selection.toggle_leaf(&self.items, id),
            None => {}
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Remove every selected leaf, then every selected group left empty, then clear.
    pub fn remove_selected(&mut self, host: &mut dyn TreeHost<T>) {
        let leaves = self.selection.resolved_leaf_ids(&self.items);
        let groups = self.selection.group_markers(&self.items);
        tracing::debug!(leaves = leaves.len(), groups = groups.len(), "removing selection");

        for id in &leaves {
            self.remove_leaf(id, host);
        }
        for id in groups.iter().rev() {
            if find_item(&self.items, id).is_some_and(|group| group.children.is_empty()) {
                self.remove_group(id, host);
            }
        }
        self.selection.clear();
    }

    /// Make the tree the only source of truth again before a structural edit.
    fn interrupt_drag(&mut self) {
        if let DragOutcome::Cancelled { tree } = self.session.interrupt() {
            tracing::debug!("drag cancelled by a structural edit");
            self.items = tree;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::host::TreeEvent;

    fn layers() -> Vec<TreeNode<&'static str>> {
        vec![
            TreeNode::group("ind", "Indicator layers")
                .child(TreeNode::leaf("pop", "Population", "pop.geojson"))
                .child(TreeNode::leaf("gdp", "GDP", "gdp.geojson")),
            TreeNode::group("base", "Basemap layers")
                .child(TreeNode::leaf("osm", "OpenStreetMap", "osm")),
        ]
    }

    fn editor() -> TreeEditor<&'static str> {
        TreeEditor::new(layers(), SortableTreeConfig::default())
    }

    #[test]
    fn add_group_fires_callback_with_generated_name() {
        let mut editor = editor();
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        assert_eq!(editor.add_group("g3", &mut events).as_deref(), Some("Group 3"));
        assert_eq!(
            events,
            vec![TreeEvent::GroupAdded {
                id: "g3".into(),
                name: "Group 3".into()
            }]
        );
        assert!(editor.add_group("g3", &mut events).is_none());
    }

    #[test]
    fn rename_ignores_leaves_and_unknown_ids() {
        let mut editor = editor();
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        editor.rename_group(&"pop".into(), "x", &mut events);
        editor.rename_group(&"nope".into(), "x", &mut events);
        assert!(events.is_empty());

        editor.rename_group(&"base".into(), "Basemaps", &mut events);
        assert_eq!(find_item(editor.items(), &"base".into()).unwrap().name, "Basemaps");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn change_leaf_replaces_payload() {
        let mut editor = editor();
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        editor.change_leaf(&"osm".into(), "osm-dark", &mut events);
        assert_eq!(
            find_item(editor.items(), &"osm".into()).unwrap().data,
            Some("osm-dark")
        );
        assert_eq!(
            events,
            vec![TreeEvent::LeafChanged {
                id: "osm".into(),
                data: "osm-dark"
            }]
        );
    }

    #[test]
    fn remove_selected_uses_resolved_leaves() {
        let mut editor = editor();
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        editor.toggle_selected(&"ind".into());
        editor.toggle_selected(&"osm".into());
        editor.remove_selected(&mut events);

        assert_eq!(
            events,
            vec![
                TreeEvent::LeafRemoved { id: "pop".into(), data: "pop.geojson" },
                TreeEvent::LeafRemoved { id: "gdp".into(), data: "gdp.geojson" },
                TreeEvent::LeafRemoved { id: "osm".into(), data: "osm" },
                TreeEvent::GroupRemoved("ind".into()),
            ]
        );
        assert_eq!(editor.items().len(), 1);
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn collapse_respects_config() {
        let mut editor = TreeEditor::new(
            layers(),
            SortableTreeConfig {
                collapsible: false,
                ..SortableTreeConfig::default()
            },
        );
        editor.toggle_collapsed(&"ind".into());
        assert_eq!(editor.visible_items().len(), 5);
    }

    #[test]
    fn drag_commit_notifies_host() {
        let mut editor = editor();
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        assert!(editor.start_drag("osm"));
        editor.drag_over(Some("gdp".into()));
        assert!(editor.end_drag(&mut events));
        assert!(matches!(events.as_slice(), [TreeEvent::Reordered(tree)] if tree.len() == 2));
        let ind = find_item(editor.items(), &"ind".into()).unwrap();
        let ids: Vec<_> = ind.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["pop", "osm", "gdp"]);
    }

    fn ids(items: &[FlatNode<&str>]) -> Vec<String> {
        items.iter().map(|item| item.id.to_string()).collect()
    }

    #[test]
    fn removing_group_mid_drag_cancels_the_drag() {
        let mut editor = editor();
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        assert!(editor.start_drag("osm"));
        editor.drag_over(Some("gdp".into()));

        editor.remove_group(&"ind".into(), &mut events);
        assert!(!editor.session().is_dragging());
        assert_eq!(events.len(), 3);

        assert!(!editor.end_drag(&mut events));
        assert_eq!(events.len(), 3);
        assert!(find_item(editor.items(), &"ind".into()).is_none());
        assert_eq!(ids(&editor.visible_items()), vec!["base", "osm"]);
    }

    #[test]
    fn ignored_edit_keeps_the_drag() {
        let mut editor = editor();
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        assert!(editor.start_drag("osm"));
        editor.rename_group(&"missing".into(), "x", &mut events);
        assert!(editor.session().is_dragging());
    }

    #[test]
    fn edits_and_snapshots_end_the_settle_freeze() {
        let config = SortableTreeConfig::default().settle_delay(Duration::from_secs(60));
        let mut editor = TreeEditor::new(layers(), config.clone());
        let mut events: Vec<TreeEvent<&str>> = Vec::new();
        editor.start_drag("osm");
        editor.drag_over(Some("gdp".into()));
        assert!(editor.end_drag(&mut events));
        assert!(editor.session().is_settling());

        editor.remove_group(&"base".into(), &mut events);
        assert!(!editor.session().is_settling());
        assert_eq!(ids(&editor.visible_items()), vec!["ind", "pop", "osm", "gdp"]);

        let mut editor = TreeEditor::new(layers(), config);
        editor.start_drag("osm");
        editor.drag_over(Some("gdp".into()));
        editor.end_drag(&mut events);
        editor.set_items(vec![TreeNode::leaf("x", "X", "x.geojson")]);
        assert_eq!(ids(&editor.visible_items()), vec!["x"]);
    }
}
