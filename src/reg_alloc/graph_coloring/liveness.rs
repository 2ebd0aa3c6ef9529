// Copyright 2017 The Australian National University
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use ir::*;
use utils::LinkedHashMap;
use utils::vec_utils;

use std::collections::{BTreeMap, BTreeSet};

use petgraph;
use petgraph::Graph;
use petgraph::graph::NodeIndex;

const TRACE_LIVENESS: bool = true;

/// a node in the interference graph is a NodeIndex of the underlying petgraph graph
pub type Node = NodeIndex;

/// Undirected interference graph over variables.
///
/// Every variable the builder sees is a node, including variables that never
/// interfere with anything. The graph is symmetric by construction and never
/// holds self edges or parallel edges.
#[derive(Clone)]
pub struct InterferenceGraph {
    graph: Graph<Variable, (), petgraph::Undirected>,
    nodes: LinkedHashMap<Variable, Node>
}

impl InterferenceGraph {
    pub fn new() -> InterferenceGraph {
        InterferenceGraph {
            graph: Graph::new_undirected(),
            nodes: LinkedHashMap::new()
        }
    }

    /// returns the node for the variable, creating it if necessary
    pub fn add_node(&mut self, var: Variable) -> Node {
        if let Some(index) = self.nodes.get(&var) {
            return *index;
        }

        let index = self.graph.add_node(var.clone());
        self.nodes.insert(var, index);

        index
    }

    pub fn get_node(&self, var: &Variable) -> Option<Node> {
        self.nodes.get(var).cloned()
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.nodes.contains_key(var)
    }

    /// all variables, in the order their nodes were created
    pub fn temps(&self) -> Vec<Variable> {
        self.nodes.keys().cloned().collect()
    }

    /// all nodes, in the order they were created
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Adds an interference edge between two variables, creating nodes for them
    /// if needed. A variable never interferes with itself, so `a == b` only
    /// makes sure the node exists.
    pub fn add_interference_edge(&mut self, a: &Variable, b: &Variable) {
        let from = self.add_node(a.clone());
        let to = self.add_node(b.clone());

        if from != to {
            self.graph.update_edge(from, to, ());
        }
    }

    pub fn is_interfered_with(&self, a: &Variable, b: &Variable) -> bool {
        match (self.get_node(a), self.get_node(b)) {
            (Some(from), Some(to)) => self.is_adj(from, to),
            _ => false
        }
    }

    pub fn is_adj(&self, from: Node, to: Node) -> bool {
        self.graph.find_edge(from, to).is_some()
    }

    pub fn get_temp_of(&self, node: Node) -> &Variable {
        &self.graph[node]
    }

    pub fn outedges_of(&self, node: Node) -> Vec<Node> {
        self.graph.neighbors(node).collect()
    }

    /// neighbors of a variable sorted by name (empty if the variable is not in the graph)
    pub fn neighbors(&self, var: &Variable) -> Vec<Variable> {
        let mut ret: Vec<Variable> = match self.get_node(var) {
            Some(node) => self.outedges_of(node).into_iter().map(|n| self.get_temp_of(n).clone()).collect(),
            None => vec![]
        };
        ret.sort();
        ret
    }

    pub fn degree_of(&self, var: &Variable) -> usize {
        match self.get_node(var) {
            Some(node) => self.graph.neighbors(node).count(),
            None => 0
        }
    }

    /// the adjacency mapping, every node is a key (isolated nodes map to an empty set)
    pub fn adjacency(&self) -> BTreeMap<Variable, BTreeSet<Variable>> {
        let mut ret = BTreeMap::new();

        for (var, node) in self.nodes.iter() {
            let adj: BTreeSet<Variable> = self.graph.neighbors(*node)
                .map(|n| self.get_temp_of(n).clone())
                .collect();
            ret.insert(var.clone(), adj);
        }

        ret
    }

    /// the graph in Graphviz dot format
    pub fn to_dot(&self) -> String {
        use petgraph::dot::{Config, Dot};

        format!("{:?}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }

    pub fn print(&self) {
        debug!("");
        debug!("Interference Graph");

        debug!("nodes:");
        for (var, node) in self.nodes.iter() {
            debug!("{} -> {:?} (degree {})", var, node, self.graph.neighbors(*node).count());
        }

        debug!("graph:");
        debug!("\n\n{}\n", self.to_dot());
        debug!("");
    }
}

impl Default for InterferenceGraph {
    fn default() -> InterferenceGraph {
        InterferenceGraph::new()
    }
}

/// Builds the interference graph from per-block instruction sequences and live-out sets.
///
/// Each block is scanned backwards starting from its live-out set. An
/// instruction occurrence `v` is treated as a definition: `v` leaves the live
/// set, interferes with everything still live, and is live again above the
/// instruction. A repeated occurrence in the same block therefore restarts the
/// live range of the variable. Results from all blocks are merged by edge union.
///
/// The live-in sets are not checked against the result of the scan, they only
/// contribute nodes.
pub fn build_interference_graph(blocks: &[BasicBlock]) -> InterferenceGraph {
    info!("start building interference graph for {} block(s)", blocks.len());

    let mut ig = InterferenceGraph::new();

    // creates nodes for all the involved variables, so that variables without
    // any interference still get a register
    for block in blocks {
        for var in block.instructions() {
            ig.add_node(var.clone());
        }
        for var in block.live_in().iter() {
            ig.add_node(var.clone());
        }
        for var in block.live_out().iter() {
            ig.add_node(var.clone());
        }
    }

    for block in blocks {
        // Current_Live(B) = LiveOut(B)
        let mut current_live = block.live_out().clone();
        trace_if!(TRACE_LIVENESS, "Block{}: live out {:?}", block.id(), current_live);

        if block.instructions().is_empty() {
            debug!("Block{}: has no instructions", block.id());
            continue;
        }

        // for every inst I in reverse order
        for (i, var) in block.instructions().iter().enumerate().rev() {
            // remove D from Current_Live
            current_live.remove(var);

            // add an interference from D to every element E in Current_Live
            for e in current_live.iter() {
                trace_if!(TRACE_LIVENESS, "Block{}: Inst{}: add interference between {} and {}", block.id(), i, var, e);
                ig.add_interference_edge(var, e);
            }

            // D is live above this instruction
            current_live.insert(var.clone());
        }

        if cfg!(debug_assertions) {
            let not_in_livein: Vec<&Variable> = current_live.iter().filter(|x| !block.live_in().contains(*x)).collect();
            if !not_in_livein.is_empty() {
                trace!("Block{}: live at entry but not in live in: {}", block.id(), vec_utils::as_str(&not_in_livein));
            }
        }
    }

    debug!("interference graph built: {} nodes, {} edges", ig.n_nodes(), ig.n_edges());

    ig
}
