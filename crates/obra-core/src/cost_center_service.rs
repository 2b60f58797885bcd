//! Cost-center forest maintenance and derived views.
//!
//! Nodes are stored flat with a `parent_id` lookup key; children and paths are
//! always derived. Every mutation keeps the set a forest: parents must exist,
//! a node is never its own ancestor, and deletes remove the whole subtree.

use std::collections::{HashMap, HashSet, VecDeque};

use obra_domain::{
    CostCenter, CostCenterPathEntry, CostCenterTreeNode, EntryKind, Ledger, PATH_SEPARATOR,
};
use tracing::info;

use crate::ids::{IdGenerator, SequenceKind};
use crate::time::Clock;
use crate::{CoreError, CoreResult};

pub struct CostCenterService;

impl CostCenterService {
    /// Adds a launchable node as a root or under an existing parent.
    pub fn add_node(
        ledger: &mut Ledger,
        name: &str,
        parent_id: Option<&str>,
        clock: &dyn Clock,
    ) -> CoreResult<CostCenter> {
        let name = Self::validate_name(name)?;
        if let Some(parent) = parent_id {
            Self::require(ledger, parent)?;
        }
        let id = IdGenerator::next(ledger, SequenceKind::CostCenter, clock);
        let node = CostCenter::new(id, name, parent_id.map(str::to_string));
        ledger.cost_centers.push(node.clone());
        ledger.touch();
        info!(id = %node.id, parent = ?node.parent_id, "cost center added");
        Ok(node)
    }

    /// Renames or re-flags a node; its children are untouched.
    pub fn update_node(
        ledger: &mut Ledger,
        id: &str,
        name: &str,
        is_launchable: bool,
    ) -> CoreResult<()> {
        let name = Self::validate_name(name)?;
        let node = ledger
            .cost_centers
            .iter_mut()
            .find(|node| node.id == id)
            .ok_or_else(|| CoreError::not_found("Cost center", id))?;
        node.name = name;
        node.is_launchable = is_launchable;
        ledger.touch();
        Ok(())
    }

    /// Re-parents a node, refusing anything that would introduce a cycle.
    pub fn move_node(ledger: &mut Ledger, id: &str, new_parent: Option<&str>) -> CoreResult<()> {
        Self::require(ledger, id)?;
        if let Some(parent) = new_parent {
            if parent == id {
                return Err(CoreError::InvalidOperation(
                    "a cost center cannot be its own parent".into(),
                ));
            }
            Self::require(ledger, parent)?;
            if Self::subtree_ids(ledger, id).contains(parent) {
                return Err(CoreError::InvalidOperation(format!(
                    "moving {id} under its descendant {parent} would create a cycle"
                )));
            }
        }
        if let Some(node) = ledger.cost_centers.iter_mut().find(|node| node.id == id) {
            node.parent_id = new_parent.map(str::to_string);
        }
        ledger.touch();
        Ok(())
    }

    /// Deletes the node together with every transitive descendant.
    ///
    /// Refused while any expense line item posts into the subtree.
    pub fn delete_node(ledger: &mut Ledger, id: &str) -> CoreResult<Vec<String>> {
        Self::require(ledger, id)?;
        let doomed = Self::subtree_ids(ledger, id);
        let postings = ledger
            .entries_of(EntryKind::Expense)
            .flat_map(|entry| entry.line_items.iter())
            .filter(|line| doomed.contains(line.target_id.as_str()))
            .count();
        if postings > 0 {
            return Err(CoreError::ReferenceInUse(format!(
                "cost center {id} subtree has {postings} posted line item(s)"
            )));
        }
        let mut removed = Vec::with_capacity(doomed.len());
        ledger.cost_centers.retain(|node| {
            if doomed.contains(node.id.as_str()) {
                removed.push(node.id.clone());
                false
            } else {
                true
            }
        });
        ledger.touch();
        info!(id, removed = removed.len(), "cost center subtree deleted");
        Ok(removed)
    }

    /// Root-to-node names joined by [`PATH_SEPARATOR`]; empty for unknown ids.
    pub fn path(ledger: &Ledger, id: Option<&str>) -> String {
        let Some(id) = id else {
            return String::new();
        };
        let index: HashMap<&str, &CostCenter> = ledger
            .cost_centers
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect();
        path_with_index(&index, id)
    }

    /// The node itself plus all transitive descendants, breadth first.
    pub fn subtree_ids(ledger: &Ledger, id: &str) -> HashSet<String> {
        let children = children_index(&ledger.cost_centers);
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(kids) = children.get(current.as_str()) {
                queue.extend(kids.iter().map(|child| child.id.clone()));
            }
        }
        seen
    }

    /// Groups the flat nodes into a forest. Nodes whose parent is missing become roots.
    pub fn materialize_tree(ledger: &Ledger) -> Vec<CostCenterTreeNode> {
        let known: HashSet<&str> = ledger
            .cost_centers
            .iter()
            .map(|node| node.id.as_str())
            .collect();
        let children = children_index(&ledger.cost_centers);
        let mut visited = HashSet::new();
        ledger
            .cost_centers
            .iter()
            .filter(|node| {
                node.parent_id
                    .as_deref()
                    .map_or(true, |parent| !known.contains(parent))
            })
            .map(|root| build_node(root, &children, String::new(), 0, &mut visited))
            .collect()
    }

    /// Every node with its path, sorted by path.
    pub fn flat_list(ledger: &Ledger) -> Vec<CostCenterPathEntry> {
        let index: HashMap<&str, &CostCenter> = ledger
            .cost_centers
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect();
        let mut rows: Vec<CostCenterPathEntry> = ledger
            .cost_centers
            .iter()
            .map(|node| CostCenterPathEntry {
                id: node.id.clone(),
                name: node.name.clone(),
                path: path_with_index(&index, &node.id),
                is_launchable: node.is_launchable,
            })
            .collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows
    }

    /// Nodes that may receive direct expense postings.
    pub fn launchable_nodes(ledger: &Ledger) -> Vec<CostCenterPathEntry> {
        Self::flat_list(ledger)
            .into_iter()
            .filter(|row| row.is_launchable)
            .collect()
    }

    /// Valid new parents for `id`: every node outside its own subtree.
    pub fn parent_choices(ledger: &Ledger, id: &str) -> Vec<CostCenterPathEntry> {
        let excluded = Self::subtree_ids(ledger, id);
        Self::flat_list(ledger)
            .into_iter()
            .filter(|row| !excluded.contains(&row.id))
            .collect()
    }

    fn require(ledger: &Ledger, id: &str) -> CoreResult<()> {
        if ledger.cost_center(id).is_none() {
            return Err(CoreError::not_found("Cost center", id));
        }
        Ok(())
    }

    fn validate_name(name: &str) -> CoreResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation(
                "cost center name cannot be empty".into(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

fn children_index(nodes: &[CostCenter]) -> HashMap<&str, Vec<&CostCenter>> {
    let mut children: HashMap<&str, Vec<&CostCenter>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.parent_id.as_deref() {
            children.entry(parent).or_default().push(node);
        }
    }
    children
}

fn path_with_index(index: &HashMap<&str, &CostCenter>, id: &str) -> String {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = index.get(id).copied();
    while let Some(node) = cursor {
        if !seen.insert(node.id.as_str()) {
            break;
        }
        names.push(node.name.as_str());
        cursor = node
            .parent_id
            .as_deref()
            .and_then(|parent| index.get(parent).copied());
    }
    names.reverse();
    names.join(PATH_SEPARATOR)
}

fn build_node<'a>(
    node: &'a CostCenter,
    children: &HashMap<&str, Vec<&'a CostCenter>>,
    parent_path: String,
    depth: usize,
    visited: &mut HashSet<&'a str>,
) -> CostCenterTreeNode {
    visited.insert(node.id.as_str());
    let path = if parent_path.is_empty() {
        node.name.clone()
    } else {
        format!("{parent_path}{PATH_SEPARATOR}{}", node.name)
    };
    let mut built = Vec::new();
    if let Some(kids) = children.get(node.id.as_str()) {
        for child in kids {
            if visited.contains(child.id.as_str()) {
                continue;
            }
            built.push(build_node(child, children, path.clone(), depth + 1, visited));
        }
    }
    CostCenterTreeNode {
        id: node.id.clone(),
        name: node.name.clone(),
        path,
        depth,
        is_launchable: node.is_launchable,
        children: built,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock::on(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    fn chain() -> (Ledger, String, String, String) {
        let mut ledger = Ledger::new();
        let clock = clock();
        let a = CostCenterService::add_node(&mut ledger, "A", None, &clock).unwrap();
        let b = CostCenterService::add_node(&mut ledger, "B", Some(a.id.as_str()), &clock).unwrap();
        let c = CostCenterService::add_node(&mut ledger, "C", Some(b.id.as_str()), &clock).unwrap();
        (ledger, a.id, b.id, c.id)
    }

    #[test]
    fn path_joins_names_root_first() {
        let (ledger, a, _, c) = chain();
        assert_eq!(CostCenterService::path(&ledger, Some(c.as_str())), "A / B / C");
        assert_eq!(CostCenterService::path(&ledger, Some(a.as_str())), "A");
        assert_eq!(CostCenterService::path(&ledger, None), "");
        assert_eq!(CostCenterService::path(&ledger, Some("cc-missing")), "");
    }

    #[test]
    fn new_nodes_default_to_launchable() {
        let (ledger, a, _, _) = chain();
        assert!(ledger.cost_center(&a).unwrap().is_launchable);
        assert_eq!(a, "cc-user-001");
    }

    #[test]
    fn add_requires_existing_parent() {
        let mut ledger = Ledger::new();
        let err =
            CostCenterService::add_node(&mut ledger, "Orphan", Some("cc-nope"), &clock())
                .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(ledger.cost_centers.is_empty());
    }

    #[test]
    fn delete_cascades_to_every_descendant() {
        let (mut ledger, a, b, _) = chain();
        let clock = clock();
        CostCenterService::add_node(&mut ledger, "B2", Some(a.as_str()), &clock).unwrap();
        let keep = CostCenterService::add_node(&mut ledger, "Other", None, &clock).unwrap();

        let removed = CostCenterService::delete_node(&mut ledger, &a).unwrap();
        assert_eq!(removed.len(), 4);
        assert_eq!(ledger.cost_centers.len(), 1);
        assert_eq!(ledger.cost_centers[0].id, keep.id);
        assert!(ledger.cost_center(&b).is_none());
        assert!(ledger.cost_centers.iter().all(|node| node
            .parent_id
            .as_deref()
            .map_or(true, |parent| ledger.cost_center(parent).is_some())));
    }

    #[test]
    fn move_rejects_self_and_descendants() {
        let (mut ledger, a, _, c) = chain();
        let self_parent = CostCenterService::move_node(&mut ledger, &a, Some(a.as_str())).unwrap_err();
        assert!(matches!(self_parent, CoreError::InvalidOperation(_)));
        let cycle = CostCenterService::move_node(&mut ledger, &a, Some(c.as_str())).unwrap_err();
        assert!(matches!(cycle, CoreError::InvalidOperation(_)));
        assert!(ledger.cost_center(&a).unwrap().is_root());
    }

    #[test]
    fn move_to_root_and_back() {
        let (mut ledger, a, b, c) = chain();
        CostCenterService::move_node(&mut ledger, &c, None).unwrap();
        assert_eq!(CostCenterService::path(&ledger, Some(c.as_str())), "C");
        CostCenterService::move_node(&mut ledger, &c, Some(a.as_str())).unwrap();
        assert_eq!(CostCenterService::path(&ledger, Some(c.as_str())), "A / C");
        assert_eq!(CostCenterService::path(&ledger, Some(b.as_str())), "A / B");
    }

    #[test]
    fn parent_choices_exclude_own_subtree() {
        let (ledger, a, b, c) = chain();
        let choices: Vec<_> = CostCenterService::parent_choices(&ledger, &b)
            .into_iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(choices, vec![a]);
        assert!(!choices.contains(&c));
    }

    #[test]
    fn update_keeps_children() {
        let (mut ledger, a, _, c) = chain();
        CostCenterService::update_node(&mut ledger, &a, "Obra", false).unwrap();
        assert_eq!(CostCenterService::path(&ledger, Some(c.as_str())), "Obra / B / C");
        assert!(!ledger.cost_center(&a).unwrap().is_launchable);
    }

    #[test]
    fn tree_materializes_with_depth_and_paths() {
        let (ledger, _, _, _) = chain();
        let forest = CostCenterService::materialize_tree(&ledger);
        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.descendant_count(), 2);
        let leaf = &root.children[0].children[0];
        assert_eq!(leaf.path, "A / B / C");
        assert_eq!(leaf.depth, 2);
    }

    #[test]
    fn orphans_surface_as_roots() {
        let mut ledger = Ledger::new();
        ledger
            .cost_centers
            .push(CostCenter::new("cc-x", "Dangling", Some("cc-gone".into())));
        let forest = CostCenterService::materialize_tree(&ledger);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, "cc-x");
    }

    #[test]
    fn flat_list_is_sorted_by_path() {
        let (mut ledger, _, _, _) = chain();
        CostCenterService::add_node(&mut ledger, "AA", None, &clock()).unwrap();
        let paths: Vec<_> = CostCenterService::flat_list(&ledger)
            .into_iter()
            .map(|row| row.path)
            .collect();
        assert_eq!(paths, vec!["A", "A / B", "A / B / C", "AA"]);
    }
}
