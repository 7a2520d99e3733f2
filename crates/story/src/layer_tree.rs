use anyhow::Context as _;
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::list::ListItem;
use gpui_component::{ActiveTheme as _, Icon, Sizable as _, h_flex, v_flex};
use gpui_manos_sortable_tree::{SortableTreeRowState, SortableTreeState, sortable_tree};
use manos_sortable_tree::{FlatNode, SortableTreeConfig, TreeEvent, TreeNode, parse_snapshot};
use serde_json::Value;

const INDENT: f32 = 20.;

const DEMO_LAYERS: &str = r#"[
    { "id": 1, "name": "Indicator layers", "isGroup": true, "children": [
        { "id": 11, "name": "Population density", "isGroup": false,
          "data": { "source": "population.geojson", "style": "choropleth" } },
        { "id": 12, "name": "GDP per capita", "isGroup": false,
          "data": { "source": "gdp.geojson", "style": "choropleth" } },
        { "id": 13, "name": "Health facilities", "isGroup": true, "collapsed": true, "children": [
            { "id": 131, "name": "Hospitals", "isGroup": false,
              "data": { "source": "hospitals.geojson", "style": "points" } },
            { "id": 132, "name": "Clinics", "isGroup": false,
              "data": { "source": "clinics.geojson", "style": "points" } }
        ] }
    ] },
    { "id": 2, "name": "Basemap layers", "isGroup": true, "children": [
        { "id": 21, "name": "OpenStreetMap", "isGroup": false,
          "data": { "source": "osm", "style": "tiles" } },
        { "id": 22, "name": "Satellite", "isGroup": false,
          "data": { "source": "sentinel-2", "style": "tiles" } }
    ] },
    { "id": 3, "name": "Admin boundaries", "isGroup": false,
      "data": { "source": "admin.geojson", "style": "outline" } }
]"#;

pub struct LayerTreeExample {
    tree: Entity<SortableTreeState<Value>>,
    log: Vec<String>,
    next_group_id: u64,
    _subscriptions: Vec<Subscription>,
}

impl LayerTreeExample {
    pub fn view(_window: &mut Window, cx: &mut App) -> Entity<Self> {
        let items = demo_layers().unwrap_or_else(|err| {
            tracing::error!("{err:#}");
            Vec::new()
        });
        let tree = cx.new(|cx| {
            SortableTreeState::new(cx)
                .config(SortableTreeConfig::default().indentation_width(INDENT))
                .indent_offset(px(10.))
                .items(items)
        });

        cx.new(|cx| {
            let subscriptions = vec![cx.subscribe(&tree, Self::on_tree_event)];
            Self {
                tree,
                log: Vec::new(),
                next_group_id: 100,
                _subscriptions: subscriptions,
            }
        })
    }

    fn on_tree_event(
        &mut self,
        _: Entity<SortableTreeState<Value>>,
        event: &TreeEvent<Value>,
        cx: &mut Context<Self>,
    ) {
        let line = describe(event);
        tracing::info!("{line}");
        self.log.push(line);
        cx.notify();
    }

    fn add_group(&mut self, cx: &mut Context<Self>) {
        let id = self.next_group_id;
        self.next_group_id += 1;
        self.tree.update(cx, |tree, cx| {
            tree.add_group(id, cx);
        });
    }

    fn remove_selected(&mut self, cx: &mut Context<Self>) {
        self.tree.update(cx, |tree, cx| tree.remove_selected(cx));
    }

    fn remove_focused(&mut self, cx: &mut Context<Self>) {
        self.tree.update(cx, |tree, cx| {
            let Some((id, is_group)) = tree
                .focused_entry()
                .map(|entry| (entry.id.clone(), entry.is_group))
            else {
                return;
            };
            if is_group {
                tree.remove_group(&id, cx);
            } else {
                tree.remove_leaf(&id, cx);
            }
        });
    }
}

impl Render for LayerTreeExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let state = self.tree.read(cx);
        let tree_dump = format_tree(state.root_items());
        let announcement = state.announcement().unwrap_or("").to_string();
        let selected = state
            .editor()
            .selection()
            .resolved_leaf_ids(state.root_items())
            .len();

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                v_flex()
                    .gap_y_1()
                    .child(
                        div()
                            .text_xl()
                            .font_weight(FontWeight::BOLD)
                            .child("Layer Organizer"),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Drag layers to reorder. Drag right to nest under the group above, left to move out. Keyboard: space picks up and drops, arrows move, escape cancels. Cmd/Ctrl-click selects."),
                    )
                    .child(
                        h_flex()
                            .gap_x_2()
                            .child(
                                Button::new("add-group")
                                    .ghost()
                                    .label("Add group")
                                    .on_click(cx.listener(|this, _, _, cx| this.add_group(cx))),
                            )
                            .child(
                                Button::new("remove-focused")
                                    .ghost()
                                    .label("Remove")
                                    .on_click(
                                        cx.listener(|this, _, _, cx| this.remove_focused(cx)),
                                    ),
                            )
                            .child(
                                Button::new("remove-selected")
                                    .ghost()
                                    .label(format!("Remove selected ({selected})"))
                                    .on_click(
                                        cx.listener(|this, _, _, cx| this.remove_selected(cx)),
                                    ),
                            ),
                    ),
            )
            .child(
                h_flex()
                    .flex_1()
                    .min_h(px(0.))
                    .gap_x_3()
                    .child(
                        v_flex()
                            .w(px(420.))
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(div().text_sm().font_weight(FontWeight::MEDIUM).child("Layers"))
                            .child(
                                div()
                                    .flex_1()
                                    .min_h(px(0.))
                                    .rounded(px(12.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .bg(theme.background)
                                    .child(sortable_tree(
                                        &self.tree,
                                        move |ix, entry, row_state, _window, cx| {
                                            render_layer_row(ix, entry, row_state, cx)
                                        },
                                    )),
                            )
                            .child(
                                div()
                                    .text_sm()
                                    .text_color(theme.muted_foreground)
                                    .child(announcement),
                            ),
                    )
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w(px(0.))
                            .h_full()
                            .gap_y_2()
                            .child(div().text_sm().font_weight(FontWeight::MEDIUM).child("Tree"))
                            .child(panel(cx).child(render_lines(tree_dump.lines())))
                            .child(
                                div()
                                    .text_sm()
                                    .font_weight(FontWeight::MEDIUM)
                                    .child("Host callbacks"),
                            )
                            .child(panel(cx).child(render_lines(
                                self.log.iter().rev().take(20).map(String::as_str),
                            ))),
                    ),
            )
    }
}

fn panel(cx: &App) -> Div {
    let theme = cx.theme();
    div()
        .flex_1()
        .min_h(px(0.))
        .rounded(px(12.))
        .border_1()
        .border_color(theme.border)
        .bg(theme.background)
        .p(px(12.))
}

fn render_layer_row(
    ix: usize,
    entry: &FlatNode<Value>,
    row_state: SortableTreeRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();
    let indent = px(INDENT) * row_state.depth;

    let icon_path = if entry.is_group {
        if entry.collapsed {
            "icons/square-library.svg"
        } else {
            "icons/library.svg"
        }
    } else {
        "icons/text-align-start.svg"
    };
    let icon_color = if row_state.focused {
        theme.foreground
    } else {
        theme.muted_foreground
    };
    let label = if entry.is_group && entry.collapsed && entry.has_children() {
        format!("{} ({})", entry.name, entry.descendant_count)
    } else {
        entry.name.clone()
    };
    let source = entry.data.as_ref().map(layer_source).unwrap_or_default();

    ListItem::new(ix)
        .pl(px(10.) + indent)
        .when(row_state.dragging, |this| this.opacity(0.4))
        .child(
            h_flex()
                .gap_x_2()
                .items_center()
                .child(Icon::empty().path(icon_path).small().text_color(icon_color))
                .child(label)
                .child(
                    div()
                        .text_xs()
                        .text_color(theme.muted_foreground)
                        .child(source.to_string()),
                )
                .when(row_state.selected, |this| {
                    this.child(div().text_xs().text_color(theme.primary).child("selected"))
                }),
        )
}

fn render_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Div {
    let lines = lines.map(|line| div().text_sm().child(line.to_string()));
    v_flex().gap_y_0p5().children(lines)
}

fn demo_layers() -> anyhow::Result<Vec<TreeNode<Value>>> {
    parse_snapshot(DEMO_LAYERS).context("parse demo layer tree")
}

fn layer_source(data: &Value) -> &str {
    data.get("source").and_then(Value::as_str).unwrap_or("?")
}

fn describe(event: &TreeEvent<Value>) -> String {
    match event {
        TreeEvent::Reordered(tree) => format!("reordered, {} root nodes", tree.len()),
        TreeEvent::GroupAdded { id, name } => format!("group {id} added as \"{name}\""),
        TreeEvent::GroupRenamed { id, name } => format!("group {id} renamed to \"{name}\""),
        TreeEvent::GroupRemoved(id) => format!("group {id} removed"),
        TreeEvent::LeafRemoved { id, data } => {
            format!("layer {id} removed ({})", layer_source(data))
        }
        TreeEvent::LeafChanged { id, data } => {
            format!("layer {id} changed ({})", layer_source(data))
        }
    }
}

fn format_tree(items: &[TreeNode<Value>]) -> String {
    fn walk(items: &[TreeNode<Value>], depth: usize, out: &mut String) {
        for item in items {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&item.name);
            if item.collapsed {
                out.push_str(" [collapsed]");
            }
            out.push('\n');
            walk(&item.children, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(items, 0, &mut out);
    out
}
