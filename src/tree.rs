//! OKR hierarchy built from the flat objective list (`parent_okr` links)

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;

use crate::models::Objective;

#[derive(Debug, Clone, PartialEq)]
pub struct OkrNode {
    pub objective: Objective,
    pub children: Vec<OkrNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OkrTree {
    pub roots: Vec<OkrNode>,
}

impl OkrTree {
    /// Link objectives to their parents. Objectives without a parent, or
    /// whose parent is not in the list, become roots. A parent cycle is
    /// broken at its lowest id, which becomes a root too.
    pub fn build(objectives: Vec<Objective>) -> Self {
        let by_id: BTreeMap<i64, Objective> = objectives.into_iter().map(|o| (o.id, o)).collect();

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut root_ids = Vec::new();
        for okr in by_id.values() {
            match okr.parent_okr {
                Some(parent) if parent != okr.id && by_id.contains_key(&parent) => {
                    children.entry(parent).or_default().push(okr.id)
                }
                _ => root_ids.push(okr.id),
            }
        }

        let mut reached = HashSet::new();
        for id in &root_ids {
            mark_reached(*id, &children, &mut reached);
        }
        // Whatever is still unreached sits on a cycle (or hangs below one)
        for id in by_id.keys() {
            if !reached.contains(id) {
                root_ids.push(*id);
                mark_reached(*id, &children, &mut reached);
            }
        }
        root_ids.sort_unstable();

        let mut placed = HashSet::new();
        let roots = root_ids
            .into_iter()
            .filter_map(|id| build_node(id, &by_id, &children, &mut placed))
            .collect();
        Self { roots }
    }

    pub fn len(&self) -> usize {
        fn count(node: &OkrNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Indented outline, one objective per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            render_node(root, 0, &mut out);
        }
        out
    }
}

fn mark_reached(id: i64, children: &HashMap<i64, Vec<i64>>, reached: &mut HashSet<i64>) {
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if !reached.insert(current) {
            continue;
        }
        if let Some(kids) = children.get(&current) {
            stack.extend(kids.iter().copied());
        }
    }
}

fn build_node(
    id: i64,
    by_id: &BTreeMap<i64, Objective>,
    children: &HashMap<i64, Vec<i64>>,
    placed: &mut HashSet<i64>,
) -> Option<OkrNode> {
    if !placed.insert(id) {
        return None;
    }
    let objective = by_id.get(&id)?.clone();
    let mut kid_ids = children.get(&id).cloned().unwrap_or_default();
    kid_ids.sort_unstable();
    let children = kid_ids
        .into_iter()
        .filter_map(|kid| build_node(kid, by_id, children, placed))
        .collect();
    Some(OkrNode { objective, children })
}

fn render_node(node: &OkrNode, depth: usize, out: &mut String) {
    let okr = &node.objective;
    let status = okr
        .status_kind()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = write!(out, "{}#{} {} [{}]", "  ".repeat(depth), okr.id, okr.label(), status);
    if let Some(progress) = okr.progress {
        let _ = write!(out, " {:.0}%", progress);
    }
    out.push('\n');
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn okr(id: i64, parent: Option<i64>) -> Objective {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Objective {id}"),
            "parent_okr": parent,
        }))
        .unwrap()
    }

    #[test]
    fn children_hang_below_parents() {
        let tree = OkrTree::build(vec![okr(3, Some(1)), okr(1, None), okr(2, Some(1)), okr(4, Some(2))]);
        assert_eq!(tree.roots.len(), 1);
        let root = &tree.roots[0];
        assert_eq!(root.objective.id, 1);
        let kids: Vec<i64> = root.children.iter().map(|c| c.objective.id).collect();
        assert_eq!(kids, vec![2, 3]);
        assert_eq!(root.children[0].children[0].objective.id, 4);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn orphans_become_roots() {
        let tree = OkrTree::build(vec![okr(5, Some(99)), okr(6, None)]);
        let roots: Vec<i64> = tree.roots.iter().map(|r| r.objective.id).collect();
        assert_eq!(roots, vec![5, 6]);
    }

    #[test]
    fn cycles_do_not_lose_nodes() {
        let tree = OkrTree::build(vec![okr(1, Some(2)), okr(2, Some(1)), okr(3, Some(3))]);
        assert_eq!(tree.len(), 3);
        let roots: Vec<i64> = tree.roots.iter().map(|r| r.objective.id).collect();
        assert_eq!(roots, vec![1, 3]);
    }

    #[test]
    fn render_shows_status_and_progress() {
        let mut parent = okr(1, None);
        parent.status = Some(Status::Boolean(true));
        parent.progress = Some(42.4);
        let tree = OkrTree::build(vec![parent, okr(2, Some(1))]);
        assert_eq!(tree.render(), "#1 Objective 1 [active] 42%\n  #2 Objective 2 [-]\n");
    }
}
