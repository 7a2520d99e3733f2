use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a tree node, unique across the whole tree.
///
/// Hosts often key layers by numeric database ids, so the deserializer accepts both JSON
/// strings and integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for NodeId {
                fn from(id: $ty) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Signed(id) => Self(id.to_string()),
            RawId::Unsigned(id) => Self(id.to_string()),
        })
    }
}

/// A node of the nested tree: either a group organizing children, or a leaf carrying a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct TreeNode<T> {
    pub id: NodeId,
    pub name: String,
    pub is_group: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub children: Vec<TreeNode<T>>,
    #[serde(default)]
    pub collapsed: bool,
}

impl<T> TreeNode<T> {
    pub fn group(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_group: true,
            data: None,
            children: Vec::new(),
            collapsed: false,
        }
    }

    pub fn leaf(id: impl Into<NodeId>, name: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_group: false,
            data: Some(data),
            children: Vec::new(),
            collapsed: false,
        }
    }

    /// Append a child. Only meaningful on groups; leaves never own children.
    pub fn child(mut self, child: TreeNode<T>) -> Self {
        if self.is_group {
            self.children.push(child);
        }
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = TreeNode<T>>) -> Self {
        if self.is_group {
            self.children.extend(children);
        }
        self
    }

    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_group
    }

    pub fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }

    pub fn collapsed_mut(&mut self) -> &mut bool {
        &mut self.collapsed
    }

    pub fn data_mut(&mut self) -> &mut Option<T> {
        &mut self.data
    }
}

impl<T: Clone> TreeNode<T> {
    /// Copy of this node with its children replaced.
    pub(crate) fn with_children(&self, children: Vec<TreeNode<T>>) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            is_group: self.is_group,
            data: self.data.clone(),
            children,
            collapsed: self.collapsed,
        }
    }
}

/// A pre-order, depth-annotated entry of a flattened tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct FlatNode<T> {
    pub id: NodeId,
    pub name: String,
    pub is_group: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub collapsed: bool,
    /// Number of direct children in the nested tree, hidden or not.
    #[serde(default)]
    pub child_count: usize,
    /// Number of nodes below this one in the nested tree.
    #[serde(default)]
    pub descendant_count: usize,
    pub depth: usize,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Position among siblings.
    #[serde(default)]
    pub index: usize,
}

impl<T> FlatNode<T> {
    #[inline]
    pub fn has_children(&self) -> bool {
        self.child_count > 0
    }
}

impl<T: Clone> FlatNode<T> {
    pub(crate) fn to_tree_node(&self) -> TreeNode<T> {
        TreeNode {
            id: self.id.clone(),
            name: self.name.clone(),
            is_group: self.is_group,
            data: self.data.clone(),
            children: Vec::new(),
            collapsed: self.collapsed,
        }
    }
}
