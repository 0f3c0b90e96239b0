use crate::link::Link;
use crate::task::Task;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// Immutable adjacency index over the task network, built once per
/// scheduling run. Node weights are task ids, edge weights the links
/// themselves, so both passes read relationship type and lag straight off
/// the edge.
pub struct ScheduleDag {
    pub graph: DiGraph<i32, Link>,
    pub id_to_index: HashMap<i32, NodeIndex>,
}

impl ScheduleDag {
    /// Build the index. Links referencing unknown tasks are skipped; input
    /// validation has already reported them.
    pub fn build(tasks: &[Task], links: &[Link]) -> Self {
        let mut graph: DiGraph<i32, Link> = DiGraph::with_capacity(tasks.len(), links.len());
        let mut id_to_index: HashMap<i32, NodeIndex> = HashMap::with_capacity(tasks.len());

        for task in tasks {
            let node_ix = graph.add_node(task.id);
            id_to_index.insert(task.id, node_ix);
        }

        for link in links {
            if let (Some(&u), Some(&v)) = (
                id_to_index.get(&link.predecessor_id),
                id_to_index.get(&link.successor_id),
            ) {
                if u != v {
                    graph.add_edge(u, v, link.clone());
                }
            }
        }

        Self { graph, id_to_index }
    }

    /// Incoming links of a task.
    pub fn predecessor_links(&self, task_id: i32) -> Vec<&Link> {
        self.links_directed(task_id, Direction::Incoming)
    }

    /// Outgoing links of a task.
    pub fn successor_links(&self, task_id: i32) -> Vec<&Link> {
        self.links_directed(task_id, Direction::Outgoing)
    }

    fn links_directed(&self, task_id: i32, direction: Direction) -> Vec<&Link> {
        match self.id_to_index.get(&task_id) {
            Some(&node_ix) => self
                .graph
                .edges_directed(node_ix, direction)
                .map(|edge| edge.weight())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Enumerate dependency cycles with a depth-first traversal from every
    /// unvisited node. A node reached while still on the recursion stack
    /// closes a cycle; the reported path runs from the repeated node back to
    /// itself, inclusive (`[a, b, c, a]`).
    pub fn detect_cycles(&self) -> Vec<Vec<i32>> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut on_stack: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<NodeIndex> = Vec::new();
        let mut cycles: Vec<Vec<i32>> = Vec::new();

        for root in self.graph.node_indices() {
            if !visited.contains(&root) {
                self.dfs(root, &mut visited, &mut on_stack, &mut stack, &mut cycles);
            }
        }
        cycles
    }

    fn dfs(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        on_stack: &mut HashSet<NodeIndex>,
        stack: &mut Vec<NodeIndex>,
        cycles: &mut Vec<Vec<i32>>,
    ) {
        visited.insert(node);
        on_stack.insert(node);
        stack.push(node);

        for succ in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if on_stack.contains(&succ) {
                let pos = stack
                    .iter()
                    .position(|&ix| ix == succ)
                    .expect("on-stack node is on the stack");
                let mut cycle: Vec<i32> = stack[pos..].iter().map(|&ix| self.graph[ix]).collect();
                cycle.push(self.graph[succ]);
                cycles.push(cycle);
            } else if !visited.contains(&succ) {
                self.dfs(succ, visited, on_stack, stack, cycles);
            }
        }

        stack.pop();
        on_stack.remove(&node);
    }
}
