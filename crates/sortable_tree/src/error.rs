use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::node::{NodeId, TreeNode};

/// Problems with a tree snapshot handed over by the host.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed tree snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateId(NodeId),
    #[error("leaf `{0}` has children")]
    LeafWithChildren(NodeId),
    #[error("leaf `{0}` has no data")]
    LeafWithoutData(NodeId),
    #[error("group `{0}` carries leaf data")]
    GroupWithData(NodeId),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed tree config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("indentation width must be positive, got {0}")]
    InvalidIndentation(f32),
}

/// Parse and validate a nested tree from JSON.
pub fn parse_snapshot<T: DeserializeOwned>(json: &str) -> Result<Vec<TreeNode<T>>, SnapshotError> {
    let items: Vec<TreeNode<T>> = serde_json::from_str(json)?;
    validate_tree(&items)?;
    Ok(items)
}

/// Check id uniqueness and the leaf/group invariants.
pub fn validate_tree<T>(items: &[TreeNode<T>]) -> Result<(), SnapshotError> {
    fn walk<T>(items: &[TreeNode<T>], seen: &mut HashSet<NodeId>) -> Result<(), SnapshotError> {
        for item in items {
            if !seen.insert(item.id.clone()) {
                return Err(SnapshotError::DuplicateId(item.id.clone()));
            }
            if item.is_group {
                if item.data.is_some() {
                    return Err(SnapshotError::GroupWithData(item.id.clone()));
                }
            } else {
                if !item.children.is_empty() {
                    return Err(SnapshotError::LeafWithChildren(item.id.clone()));
                }
                if item.data.is_none() {
                    return Err(SnapshotError::LeafWithoutData(item.id.clone()));
                }
            }
            walk(&item.children, seen)?;
        }
        Ok(())
    }

    walk(items, &mut HashSet::new())
}
