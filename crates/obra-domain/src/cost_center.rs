//! Cost-center nodes stored as a flat parent-pointer forest.

use serde::{Deserialize, Serialize};

use crate::common::*;

/// Separator used when rendering a node's root-to-leaf path.
pub const PATH_SEPARATOR: &str = " / ";

/// Classification node that expense line items post into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostCenter {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default = "CostCenter::default_launchable")]
    pub is_launchable: bool,
}

impl CostCenter {
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            is_launchable: Self::default_launchable(),
        }
    }

    pub fn with_launchable(mut self, is_launchable: bool) -> Self {
        self.is_launchable = is_launchable;
        self
    }

    pub fn default_launchable() -> bool {
        true
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Identifiable for CostCenter {
    fn id(&self) -> &str {
        &self.id
    }
}

impl NamedEntity for CostCenter {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Materialized view of a node with its derived path and children.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CostCenterTreeNode {
    pub id: String,
    pub name: String,
    pub path: String,
    pub depth: usize,
    pub is_launchable: bool,
    pub children: Vec<CostCenterTreeNode>,
}

impl CostCenterTreeNode {
    /// Visits this node and every descendant depth-first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a CostCenterTreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Flat listing row used by selection controls and exports.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CostCenterPathEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    pub is_launchable: bool,
}
