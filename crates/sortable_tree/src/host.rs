use crate::node::{NodeId, TreeNode};

/// Callbacks through which the editor reports changes to whoever persists the tree.
///
/// Every method defaults to doing nothing, so hosts only implement what they care about.
pub trait TreeHost<T> {
    fn on_reorder(&mut self, _tree: &[TreeNode<T>]) {}
    fn on_group_added(&mut self, _id: &NodeId, _name: &str) {}
    fn on_group_renamed(&mut self, _id: &NodeId, _name: &str) {}
    fn on_group_removed(&mut self, _id: &NodeId) {}
    fn on_leaf_removed(&mut self, _id: &NodeId, _data: &T) {}
    fn on_leaf_changed(&mut self, _id: &NodeId, _data: &T) {}
}

/// A host callback, recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent<T> {
    Reordered(Vec<TreeNode<T>>),
    GroupAdded { id: NodeId, name: String },
    GroupRenamed { id: NodeId, name: String },
    GroupRemoved(NodeId),
    LeafRemoved { id: NodeId, data: T },
    LeafChanged { id: NodeId, data: T },
}

impl<T: Clone> TreeHost<T> for Vec<TreeEvent<T>> {
    fn on_reorder(&mut self, tree: &[TreeNode<T>]) {
        self.push(TreeEvent::Reordered(tree.to_vec()));
    }

    fn on_group_added(&mut self, id: &NodeId, name: &str) {
        self.push(TreeEvent::GroupAdded {
            id: id.clone(),
            name: name.to_string(),
        });
    }

    fn on_group_renamed(&mut self, id: &NodeId, name: &str) {
        self.push(TreeEvent::GroupRenamed {
            id: id.clone(),
            name: name.to_string(),
        });
    }

    fn on_group_removed(&mut self, id: &NodeId) {
        self.push(TreeEvent::GroupRemoved(id.clone()));
    }

    fn on_leaf_removed(&mut self, id: &NodeId, data: &T) {
        self.push(TreeEvent::LeafRemoved {
            id: id.clone(),
            data: data.clone(),
        });
    }

    fn on_leaf_changed(&mut self, id: &NodeId, data: &T) {
        self.push(TreeEvent::LeafChanged {
            id: id.clone(),
            data: data.clone(),
        });
    }
}

/// A host that ignores every callback.
impl<T> TreeHost<T> for () {}
