//! Undirected multigraph of substation nodes joined by switches (C2).
//!
//! `G = (V, E)` with `V = substation_nodes` and `E = switches`; each
//! edge carries the switch's name so callers can look the full record
//! back up in [`crate::model::OptimizationInput::switches`]. The
//! *active subgraph* `G_0` retains only edges with `initial_state = 1`;
//! its connected components partition `V` into islands. Unlike the
//! general-purpose network analysis elsewhere in this workspace (which
//! labels components with a breadth-first search), islands here are
//! computed with union-find: `G_0` is a fixed view selected by a single
//! edge predicate, not a graph that needs traversing on demand.

use crate::model::OptimizationInput;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// An edge in the topology graph: just enough to recover the switch
/// record (`name`) and re-check its initial state without walking back
/// through the input's switch map for every query.
#[derive(Debug, Clone)]
pub struct SwitchEdge {
    pub switch_name: String,
    pub initial_state: u8,
}

/// Tokens that mark a node name as bus-like; used only by the
/// switching-order synthesizer (§4.10), never by the MILP itself.
const BUS_LIKE_TOKENS: [&str; 4] = ["bus", "母线", "正母", "副母"];

/// The substation switching graph, `G` of §4.1.
pub struct TopologyGraph {
    graph: UnGraph<String, SwitchEdge>,
    index_of: HashMap<String, NodeIndex>,
}

impl TopologyGraph {
    /// Build `G` from the node list and switch map of an input record.
    /// Assumes the input has already passed
    /// [`OptimizationInput::validate`]: every switch endpoint is a
    /// known node.
    pub fn build(input: &OptimizationInput) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index_of = HashMap::with_capacity(input.substation_nodes.len());
        for node in &input.substation_nodes {
            let idx = graph.add_node(node.clone());
            index_of.insert(node.clone(), idx);
        }
        for (name, switch) in &input.switches {
            let (Some(&u), Some(&v)) = (
                index_of.get(&switch.nodes.0),
                index_of.get(&switch.nodes.1),
            ) else {
                continue;
            };
            graph.add_edge(
                u,
                v,
                SwitchEdge {
                    switch_name: name.clone(),
                    initial_state: switch.initial_state,
                },
            );
        }
        Self { graph, index_of }
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.index_of.get(name).copied()
    }

    pub fn node_name(&self, index: NodeIndex) -> &str {
        &self.graph[index]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// True if `name` contains one of the bus-like tokens (§3); used by
    /// the sequencing stage to tell equipment-side nodes from bus-side
    /// nodes when walking adjacent isolators.
    pub fn is_bus_like(name: &str) -> bool {
        BUS_LIKE_TOKENS
            .iter()
            .any(|token| name.to_lowercase().contains(token) || name.contains(token))
    }

    /// Switches incident to `node`, as `(neighbor_index, switch_name,
    /// initial_state)` triples.
    pub fn incident_switches(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (NodeIndex, &str, u8)> {
        self.graph.edges(node).map(|edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight().switch_name.as_str(), edge.weight().initial_state)
        })
    }

    /// Connected components of the active subgraph `G_0` (edges with
    /// `initial_state = 1`), partitioning every node into an island id
    /// `0..K-1`, or `None` if the node is not incident to any closed
    /// switch ("isolated", §4.1).
    pub fn islands(&self) -> Islands {
        let n = self.graph.node_count();
        let mut uf = UnionFind::new(n);
        for edge in self.graph.edge_references_all() {
            if edge.2.initial_state == 1 {
                uf.union(edge.0.index(), edge.1.index());
            }
        }

        let mut component_size: HashMap<usize, usize> = HashMap::new();
        for i in 0..n {
            *component_size.entry(uf.find(i)).or_insert(0) += 1;
        }

        let mut island_of_root: HashMap<usize, usize> = HashMap::new();
        let mut next_island = 0usize;
        let mut node_island = vec![None; n];
        for i in 0..n {
            let root = uf.find(i);
            if component_size[&root] < 2 {
                continue;
            }
            let island = *island_of_root.entry(root).or_insert_with(|| {
                let id = next_island;
                next_island += 1;
                id
            });
            node_island[i] = Some(island);
        }

        Islands {
            node_island,
            count: next_island,
        }
    }
}

/// Helper iterator so `islands()` doesn't need a `petgraph::visit`
/// import at the call site; pulls `(source, target, weight)` triples.
trait AllEdges {
    fn edge_references_all(&self) -> Vec<(NodeIndex, NodeIndex, &SwitchEdge)>;
}

impl AllEdges for UnGraph<String, SwitchEdge> {
    fn edge_references_all(&self) -> Vec<(NodeIndex, NodeIndex, &SwitchEdge)> {
        self.edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
            .collect()
    }
}

/// Island labeling of every node in `G_0`, the active subgraph.
#[derive(Debug, Clone)]
pub struct Islands {
    node_island: Vec<Option<usize>>,
    count: usize,
}

impl Islands {
    pub fn of(&self, index: NodeIndex) -> Option<usize> {
        self.node_island[index.index()]
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// True if the two endpoint pairs share at least one real island id
    /// (never matches on two isolated nodes — there is no shared island
    /// to report).
    pub fn shares_island(&self, a: (NodeIndex, NodeIndex), b: (NodeIndex, NodeIndex)) -> bool {
        let ids_a = [self.of(a.0), self.of(a.1)];
        let ids_b = [self.of(b.0), self.of(b.1)];
        ids_a
            .iter()
            .flatten()
            .any(|id| ids_b.iter().flatten().any(|other| other == id))
    }
}

/// Disjoint-set forest with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Objective, Switch, SwitchKind, Zone};
    use indexmap::IndexMap;

    fn two_island_input() -> OptimizationInput {
        let mut switches = IndexMap::new();
        switches.insert(
            "S1".to_string(),
            Switch {
                nodes: ("A".to_string(), "B".to_string()),
                initial_state: 1,
                cost: 1.0,
                available: true,
                switch_type: SwitchKind::Breaker,
            },
        );
        switches.insert(
            "S2".to_string(),
            Switch {
                nodes: ("C".to_string(), "D".to_string()),
                initial_state: 0,
                cost: 1.0,
                available: true,
                switch_type: SwitchKind::Isolator,
            },
        );
        let mut zones = IndexMap::new();
        zones.insert(
            "Zone_A".to_string(),
            Zone {
                capacity: 100.0,
                fixed_load: vec![10.0],
            },
        );
        OptimizationInput {
            horizon: 1,
            zones,
            substation_nodes: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            transformers: IndexMap::new(),
            zone_lines: IndexMap::new(),
            switches,
            operating_units: IndexMap::new(),
            backup_units: IndexMap::new(),
            hydro_units: IndexMap::new(),
            storage_units: IndexMap::new(),
            interruptible_loads: IndexMap::new(),
            objective: Objective::MinimizeSwitchOperation,
        }
    }

    #[test]
    fn closed_switch_joins_an_island() {
        let input = two_island_input();
        let graph = TopologyGraph::build(&input);
        let islands = graph.islands();
        let a = graph.node_index("A").unwrap();
        let b = graph.node_index("B").unwrap();
        assert_eq!(islands.of(a), islands.of(b));
        assert!(islands.of(a).is_some());
    }

    #[test]
    fn open_switch_leaves_endpoints_isolated() {
        let input = two_island_input();
        let graph = TopologyGraph::build(&input);
        let islands = graph.islands();
        let c = graph.node_index("C").unwrap();
        let d = graph.node_index("D").unwrap();
        assert_eq!(islands.of(c), None);
        assert_eq!(islands.of(d), None);
        assert_eq!(islands.count(), 1);
    }

    #[test]
    fn bus_like_token_detection() {
        assert!(TopologyGraph::is_bus_like("10kV_Bus_A"));
        assert!(TopologyGraph::is_bus_like("正母线"));
        assert!(!TopologyGraph::is_bus_like("T1_conn"));
    }
}
