//! Context menu construction.
//!
//! A menu is built from scratch for every interaction out of the session's
//! current state: the domain graph (for the clicked node's current
//! assignments), the hidden set, the nodes with an assignment in flight and
//! the active hierarchy. Nothing is cached between interactions.
//!
//! Items carry a [`MenuAction`] value instead of a callback; the shell
//! dispatches the action when the item is picked.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use strata_core::{domain::DomainGraph, geometry::Point, identifier::Id};

use crate::hierarchy::HierarchyContext;

/// What the user right-clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuTarget {
    /// Empty canvas, at the given graph coordinates.
    Background { position: Point },
    Node { node_id: Id },
    Selection { node_ids: Vec<Id> },
}

impl MenuTarget {
    /// Classify a selection: nothing selected is the background, one node is a
    /// single-node target, more is a multi-node target. Duplicates are dropped.
    pub fn from_selection(node_ids: impl IntoIterator<Item = Id>, position: Point) -> Self {
        let mut seen = HashSet::new();
        let mut node_ids: Vec<Id> = node_ids.into_iter().filter(|id| seen.insert(*id)).collect();
        match node_ids.len() {
            0 => Self::Background { position },
            1 => Self::Node {
                node_id: node_ids.remove(0),
            },
            _ => Self::Selection { node_ids },
        }
    }
}

/// What picking a menu item does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuAction {
    AddNodeAt { position: Point },
    LoadFullGraph,
    Edit { node_id: Id },
    Delete { node_id: Id },
    Hide { node_id: Id },
    /// Show the node's hidden neighbours.
    Expand { node_id: Id },
    /// Create a node one level below `parent` and link it.
    AddChild {
        parent: Id,
        hierarchy_id: Id,
        level_id: Id,
    },
    DeleteMany { node_ids: Vec<Id> },
    HideMany { node_ids: Vec<Id> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub id: &'static str,
    pub label: String,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<&'static str>,
    pub disabled: bool,
    pub action: MenuAction,
}

impl MenuItem {
    fn new(id: &'static str, label: impl Into<String>, icon: &'static str, action: MenuAction) -> Self {
        Self {
            id,
            label: label.into(),
            icon,
            shortcut: None,
            disabled: false,
            action,
        }
    }

    fn with_shortcut(mut self, shortcut: &'static str) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    fn disabled_if(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// An ordered list of menu items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MenuDescriptor {
    pub items: Vec<MenuItem>,
}

impl MenuDescriptor {
    pub fn item(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.item(id).is_some()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Builds menus from borrowed session state.
pub struct MenuBuilder<'a> {
    graph: &'a DomainGraph,
    hidden: &'a HashSet<Id>,
    busy: &'a HashSet<Id>,
}

impl<'a> MenuBuilder<'a> {
    pub fn new(graph: &'a DomainGraph, hidden: &'a HashSet<Id>, busy: &'a HashSet<Id>) -> Self {
        Self {
            graph,
            hidden,
            busy,
        }
    }

    pub fn build(&self, target: &MenuTarget, hierarchy: Option<HierarchyContext<'_>>) -> MenuDescriptor {
        let items = match target {
            MenuTarget::Background { position } => vec![
                MenuItem::new(
                    "add-node",
                    "Add node here",
                    "plus",
                    MenuAction::AddNodeAt {
                        position: *position,
                    },
                )
                .with_shortcut("N"),
                MenuItem::new("load-full-graph", "Load full graph", "refresh", MenuAction::LoadFullGraph),
            ],
            MenuTarget::Node { node_id } => self.node_items(*node_id, hierarchy),
            MenuTarget::Selection { node_ids } => {
                let count = node_ids.len();
                vec![
                    MenuItem::new(
                        "delete-many",
                        format!("Delete {count} nodes"),
                        "trash",
                        MenuAction::DeleteMany {
                            node_ids: node_ids.clone(),
                        },
                    )
                    .with_shortcut("Delete"),
                    MenuItem::new(
                        "hide-many",
                        format!("Hide {count} nodes"),
                        "eye-off",
                        MenuAction::HideMany {
                            node_ids: node_ids.clone(),
                        },
                    )
                    .with_shortcut("H"),
                ]
            }
        };
        MenuDescriptor { items }
    }

    fn node_items(&self, node_id: Id, hierarchy: Option<HierarchyContext<'_>>) -> Vec<MenuItem> {
        if !self.graph.contains_node(node_id) {
            debug!(node_id:%; "Menu requested for an unknown node");
            return Vec::new();
        }

        let busy = self.busy.contains(&node_id);
        let has_hidden_neighbours = self
            .graph
            .neighbors(node_id)
            .iter()
            .any(|neighbour| self.hidden.contains(neighbour));

        let mut items = vec![
            MenuItem::new("edit", "Edit", "pencil", MenuAction::Edit { node_id })
                .with_shortcut("E")
                .disabled_if(busy),
            MenuItem::new("delete", "Delete", "trash", MenuAction::Delete { node_id })
                .with_shortcut("Delete")
                .disabled_if(busy),
            MenuItem::new("hide", "Hide", "eye-off", MenuAction::Hide { node_id }).with_shortcut("H"),
            MenuItem::new("expand", "Expand", "expand", MenuAction::Expand { node_id })
                .disabled_if(!has_hidden_neighbours),
        ];
        if let Some(item) = self.add_child_item(node_id, hierarchy) {
            items.push(item);
        }
        items
    }

    /// Offered only if the node sits on a level of the active hierarchy whose
    /// next level exists and offers at least one type.
    fn add_child_item(&self, node_id: Id, hierarchy: Option<HierarchyContext<'_>>) -> Option<MenuItem> {
        let context = hierarchy?;
        let assignment = self.graph.node(node_id)?.assignment_in(context.hierarchy_id)?;
        let next = context.levels.next_after(assignment.level_number)?;
        if !next.offers_types() {
            debug!(node_id:%, level_id:% = next.id(); "Next level offers no types, omitting add child");
            return None;
        }
        Some(MenuItem::new(
            "add-child",
            format!("Add child ({})", next.label()),
            "plus-circle",
            MenuAction::AddChild {
                parent: node_id,
                hierarchy_id: context.hierarchy_id,
                level_id: next.id(),
            },
        ))
    }
}
