use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::entities::Item;

/// Upper bound on items visited by one breadth-first walk.
pub const MAX_TRAVERSAL_ITEMS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("traversal visited more than {limit} items")]
pub struct TraversalLimitExceeded {
    pub limit: usize,
}

/// Read-only view over a flat item list with `id → item` and `parentId → children`
/// indexes. When ids repeat, the first occurrence is the one indexed by id.
#[derive(Debug)]
pub struct ItemGraph<'a> {
    items: &'a [Item],
    by_id: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> ItemGraph<'a> {
    pub fn build(items: &'a [Item]) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (index, item) in items.iter().enumerate() {
            by_id.entry(item.id.as_str()).or_insert(index);
            if let Some(parent) = item.parent_id() {
                children.entry(parent).or_default().push(index);
            }
        }
        Self {
            items,
            by_id,
            children,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Item> {
        self.by_id.get(id).map(|&index| &self.items[index])
    }

    pub fn children_of(&self, id: &str) -> impl Iterator<Item = &'a Item> + '_ {
        let items = self.items;
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&index| &items[index])
    }

    pub fn equipment_roots(&self) -> impl Iterator<Item = &'a Item> {
        self.items.iter().filter(|item| item.is_equipment_root())
    }

    /// Breadth-first closure of `seeds` over the child index, seeds included.
    pub fn collect_descendants<I>(
        &self,
        seeds: I,
        limit: usize,
    ) -> Result<HashSet<&'a str>, TraversalLimitExceeded>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut queue: VecDeque<&'a str> = seeds.into_iter().collect();
        let mut processed = 0usize;

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            processed += 1;
            if processed > limit {
                return Err(TraversalLimitExceeded { limit });
            }
            if let Some(indexes) = self.children.get(id) {
                for &index in indexes {
                    let child = self.items[index].id.as_str();
                    if !visited.contains(child) {
                        queue.push_back(child);
                    }
                }
            }
        }
        Ok(visited)
    }

    /// Copies `root_id` and everything below it, parents before children.
    pub fn deep_copy_subtree(&self, root_id: &str) -> Result<Vec<Item>, TraversalLimitExceeded> {
        let Some(root) = self.get(root_id) else {
            return Ok(Vec::new());
        };
        let mut out = vec![root.clone()];
        let mut visited: HashSet<&str> = HashSet::from([root.id.as_str()]);
        let mut queue: VecDeque<&str> = VecDeque::from([root.id.as_str()]);
        while let Some(id) = queue.pop_front() {
            for child in self.children_of(id) {
                if !visited.insert(child.id.as_str()) {
                    continue;
                }
                if visited.len() > MAX_TRAVERSAL_ITEMS {
                    return Err(TraversalLimitExceeded {
                        limit: MAX_TRAVERSAL_ITEMS,
                    });
                }
                out.push(child.clone());
                queue.push_back(child.id.as_str());
            }
        }
        Ok(out)
    }
}

/// Drops later occurrences of repeated ids. Returns the kept items and the number dropped.
pub fn dedup_items(items: &[Item]) -> (Vec<Item>, usize) {
    let mut seen = HashSet::with_capacity(items.len());
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.id.as_str()) {
            kept.push(item.clone());
        }
    }
    let dropped = items.len() - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<Item> {
        vec![
            Item::equipment_root("eq"),
            Item::new("bp", "backpack").with_parent("eq", "Backpack"),
            Item::new("box", "ammo_box").with_parent("bp", "main"),
            Item::new("round", "ammo").with_parent("box", "cartridges"),
            Item::new("rig", "vest").with_parent("eq", "TacticalVest"),
        ]
    }

    #[test]
    fn indexes_children_by_parent() {
        let items = tree();
        let graph = ItemGraph::build(&items);
        let under_root: Vec<&str> = graph.children_of("eq").map(|i| i.id.as_str()).collect();
        assert_eq!(under_root, vec!["bp", "rig"]);
        assert_eq!(graph.children_of("round").count(), 0);
        assert_eq!(graph.get("box").map(|i| i.tpl.as_str()), Some("ammo_box"));
        assert_eq!(graph.equipment_roots().count(), 1);
    }

    #[test]
    fn descendants_include_seeds_and_whole_subtree() {
        let items = tree();
        let graph = ItemGraph::build(&items);
        let found = graph
            .collect_descendants(["bp"], MAX_TRAVERSAL_ITEMS)
            .expect("within limit");
        let mut ids: Vec<&str> = found.into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec!["box", "bp", "round"]);
    }

    #[test]
    fn descendants_survive_cycles() {
        let items = vec![
            Item::new("a", "t").with_parent("b", "main"),
            Item::new("b", "t").with_parent("a", "main"),
        ];
        let graph = ItemGraph::build(&items);
        let found = graph
            .collect_descendants(["a"], MAX_TRAVERSAL_ITEMS)
            .expect("cycle terminates");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn descendants_respect_processed_limit() {
        let items = tree();
        let graph = ItemGraph::build(&items);
        let err = graph.collect_descendants(["eq"], 3).expect_err("limit hit");
        assert_eq!(err.limit, 3);
    }

    #[test]
    fn deep_copy_returns_parents_before_children() {
        let items = tree();
        let graph = ItemGraph::build(&items);
        let copy = graph.deep_copy_subtree("bp").expect("copy");
        let ids: Vec<&str> = copy.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["bp", "box", "round"]);
        assert!(graph.deep_copy_subtree("missing").expect("copy").is_empty());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut items = tree();
        let mut dup = Item::new("bp", "other_tpl");
        dup.parent_id = Some("rig".to_string());
        items.push(dup);
        let (kept, dropped) = dedup_items(&items);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 5);
        assert_eq!(
            kept.iter().find(|i| i.id == "bp").map(|i| i.tpl.as_str()),
            Some("backpack")
        );
    }
}
