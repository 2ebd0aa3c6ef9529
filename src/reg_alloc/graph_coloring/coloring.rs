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
use reg_alloc::graph_coloring::liveness::{InterferenceGraph, Node};
use reg_alloc::{Allocation, AllocationOutcome, AllocationResult, Assignment, RegAllocError};

use utils::LinkedHashSet;
use utils::vec_utils;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

const TRACE_COLORING: bool = true;

/// How Simplify picks the next node to remove.
///
/// Both policies scan for the node with the smallest residual degree, ties
/// broken by variable name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum SimplifyPolicy {
    /// only removes nodes whose residual degree is below the number of
    /// registers, gives up with SpillRequired when no such node is left
    Conservative,
    /// always removes the minimum degree node, spills are found in Select
    Optimistic
}

impl Default for SimplifyPolicy {
    fn default() -> SimplifyPolicy {
        SimplifyPolicy::Conservative
    }
}

impl FromStr for SimplifyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<SimplifyPolicy, String> {
        match s.to_lowercase().as_str() {
            "conservative" => Ok(SimplifyPolicy::Conservative),
            "optimistic" => Ok(SimplifyPolicy::Optimistic),
            _ => Err(format!("unknown simplify policy '{}' (expect conservative or optimistic)", s))
        }
    }
}

impl fmt::Display for SimplifyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SimplifyPolicy::Conservative => write!(f, "conservative"),
            SimplifyPolicy::Optimistic => write!(f, "optimistic")
        }
    }
}

/// Chaitin style simplify/select over a read-only interference graph.
///
/// Simplify works on its own degree map and `removed` set, the graph itself
/// is never touched, so Select can look up neighbors on the original graph.
pub struct GraphColoring<'a> {
    pub ig: &'a InterferenceGraph,
    palette: &'a RegisterPalette,
    policy: SimplifyPolicy,

    degree: HashMap<Node, usize>,
    removed: HashSet<Node>,

    select_stack: Vec<Node>,
    removal_order: Vec<Node>,

    colors: HashMap<Node, Register>,
    colored_nodes: Vec<Node>,
    // nodes Simplify could not remove (Conservative)
    stuck_nodes: Vec<Node>,
    // nodes Select could not color (Optimistic)
    spilled_nodes: Vec<Node>
}

impl<'a> GraphColoring<'a> {
    /// runs simplify and select on the graph
    pub fn start(ig: &'a InterferenceGraph, palette: &'a RegisterPalette, policy: SimplifyPolicy) -> Result<GraphColoring<'a>, RegAllocError> {
        trace!("Initializing coloring allocator ({} policy, {} registers)...", policy, palette.len());

        let coloring = GraphColoring::new(ig, palette, policy);

        coloring.regalloc()
    }

    /// Runs only Select, popping the given removal order from the back (the
    /// last variable is colored first). Variables that are not in the graph are
    /// ignored. The order has to cover every graph node, otherwise the result
    /// would claim success for a partial allocation.
    pub fn replay(ig: &'a InterferenceGraph, palette: &'a RegisterPalette, policy: SimplifyPolicy, removal_order: &[Variable]) -> Result<GraphColoring<'a>, RegAllocError> {
        let mut coloring = GraphColoring::new(ig, palette, policy);

        for var in removal_order {
            match ig.get_node(var) {
                Some(node) => {
                    if coloring.removed.insert(node) {
                        coloring.select_stack.push(node);
                        coloring.removal_order.push(node);
                    } else {
                        warn!("{} appears more than once in the removal order, ignored", var);
                    }
                }
                None => warn!("{} is not in the interference graph, ignored", var)
            }
        }

        let missing: Vec<Variable> = ig.nodes().into_iter()
            .filter(|n| !coloring.removed.contains(n))
            .map(|n| ig.get_temp_of(n).clone())
            .collect();
        if !missing.is_empty() {
            error!("removal order leaves out {}", vec_utils::as_str(&missing));
            return Err(RegAllocError::IncompleteRemovalOrder(missing));
        }

        coloring.assign_colors()?;

        Ok(coloring)
    }

    fn new(ig: &'a InterferenceGraph, palette: &'a RegisterPalette, policy: SimplifyPolicy) -> GraphColoring<'a> {
        GraphColoring {
            ig: ig,
            palette: palette,
            policy: policy,

            degree: HashMap::new(),
            removed: HashSet::new(),

            select_stack: Vec::new(),
            removal_order: Vec::new(),

            colors: HashMap::new(),
            colored_nodes: Vec::new(),
            stuck_nodes: Vec::new(),
            spilled_nodes: Vec::new()
        }
    }

    fn display_node(&self, node: Node) -> String {
        format!("{}", self.ig.get_temp_of(node))
    }

    fn n_regs(&self) -> usize {
        self.palette.len()
    }

    fn regalloc(mut self) -> Result<GraphColoring<'a>, RegAllocError> {
        for node in self.ig.nodes() {
            let outdegree = self.ig.outedges_of(node).len();
            self.degree.insert(node, outdegree);

            trace_if!(TRACE_COLORING, "{} has a degree of {}", self.display_node(node), outdegree);
        }

        self.simplify();

        if !self.stuck_nodes.is_empty() {
            debug!("simplify got stuck, spill required");
            if cfg!(debug_assertions) {
                trace!("nodes to be spilled:");
                for node in self.stuck_nodes.iter() {
                    trace!("{} (degree {})", self.display_node(*node), self.degree(*node));
                }
            }

            return Ok(self);
        }

        self.assign_colors()?;

        if !self.spilled_nodes.is_empty() {
            debug!("select found {} uncolorable node(s), spill required", self.spilled_nodes.len());
        }

        Ok(self)
    }

    fn simplify(&mut self) {
        trace!("---simplify---");

        while let Some((node, degree)) = self.min_degree_node() {
            if self.policy == SimplifyPolicy::Conservative && degree >= self.n_regs() {
                // every remaining node has degree >= K
                trace!("{} has the smallest degree {}, but K is {}", self.display_node(node), degree, self.n_regs());

                let mut stuck: Vec<Node> = self.ig.nodes().into_iter().filter(|n| !self.removed.contains(n)).collect();
                stuck.sort_by(|a, b| self.ig.get_temp_of(*a).cmp(self.ig.get_temp_of(*b)));
                self.stuck_nodes = stuck;

                return;
            }

            trace!("Simplifying {} (degree {})", self.display_node(node), degree);

            self.removed.insert(node);
            self.select_stack.push(node);
            self.removal_order.push(node);

            for m in self.adjacent(node) {
                self.decrement_degree(m);
            }
        }
    }

    /// linear scan for the remaining node with the smallest (degree, name)
    fn min_degree_node(&self) -> Option<(Node, usize)> {
        let mut ret: Option<(Node, usize)> = None;

        for node in self.ig.nodes() {
            if self.removed.contains(&node) {
                continue;
            }

            let degree = self.degree(node);
            ret = match ret {
                None => Some((node, degree)),
                Some((m, m_degree)) => {
                    if degree < m_degree
                        || (degree == m_degree && self.ig.get_temp_of(node) < self.ig.get_temp_of(m)) {
                        Some((node, degree))
                    } else {
                        Some((m, m_degree))
                    }
                }
            };
        }

        ret
    }

    /// neighbors that are still in the graph
    fn adjacent(&self, n: Node) -> Vec<Node> {
        self.ig.outedges_of(n).into_iter().filter(|m| !self.removed.contains(m)).collect()
    }

    fn degree(&self, n: Node) -> usize {
        match self.degree.get(&n) {
            Some(d) => *d,
            None => 0
        }
    }

    fn decrement_degree(&mut self, n: Node) {
        let d = self.degree(n);
        debug_assert!(d != 0);

        trace_if!(TRACE_COLORING, "decrement degree of {} to {}", self.display_node(n), d.saturating_sub(1));
        self.degree.insert(n, d.saturating_sub(1));
    }

    fn assign_colors(&mut self) -> Result<(), RegAllocError> {
        trace!("---select---");

        while let Some(n) = self.select_stack.pop() {
            trace!("Assigning color to {}", self.display_node(n));

            // registers held by neighbors that are already colored
            let mut forbidden: LinkedHashSet<Register> = LinkedHashSet::new();
            for w in self.ig.outedges_of(n) {
                if let Some(color) = self.colors.get(&w) {
                    forbidden.insert(color.clone());
                }
            }
            trace_if!(TRACE_COLORING, "forbidden colors: {:?}", forbidden);

            let first_available = self.palette.iter().find(|reg| !forbidden.contains(*reg)).cloned();

            match first_available {
                Some(reg) => {
                    trace!("Color {} as {}", self.display_node(n), reg);
                    self.colors.insert(n, reg);
                    self.colored_nodes.push(n);
                }
                None => {
                    match self.policy {
                        SimplifyPolicy::Optimistic => {
                            trace!("{} is a spilled node", self.display_node(n));
                            self.spilled_nodes.push(n);
                        }
                        SimplifyPolicy::Conservative => {
                            // simplify guaranteed a free register, the degree bookkeeping is broken
                            let variable = self.ig.get_temp_of(n).clone();
                            let forbidden = forbidden.to_vec();
                            error!("no free register for {}, neighbors hold {}", variable, vec_utils::as_str(&forbidden));

                            return Err(RegAllocError::NoFreeRegister {
                                variable: variable,
                                forbidden: forbidden
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn policy(&self) -> SimplifyPolicy {
        self.policy
    }

    /// variables in the order Simplify removed them
    pub fn removal_order(&self) -> Vec<Variable> {
        self.removal_order.iter().map(|n| self.ig.get_temp_of(*n).clone()).collect()
    }

    pub fn get_color_of(&self, var: &Variable) -> Option<&Register> {
        match self.ig.get_node(var) {
            Some(node) => self.colors.get(&node),
            None => None
        }
    }

    /// variables that need spilling, sorted by name
    pub fn spills(&self) -> Vec<Variable> {
        let mut spills: Vec<Variable> = self.stuck_nodes.iter()
            .chain(self.spilled_nodes.iter())
            .map(|n| self.ig.get_temp_of(*n).clone())
            .collect();
        spills.sort();

        spills
    }

    /// the allocation, sorted by variable name
    pub fn get_assignments(&self) -> Allocation {
        let mut entries: Vec<(Variable, Assignment)> = vec![];

        for n in self.colored_nodes.iter() {
            let reg = self.colors[n].clone();
            entries.push((self.ig.get_temp_of(*n).clone(), Assignment::Register(reg)));
        }
        for var in self.spills() {
            entries.push((var, Assignment::Spilled));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut allocation = Allocation::new();
        for (var, assignment) in entries {
            allocation.insert(var, assignment);
        }

        allocation
    }

    pub fn outcome(&self) -> AllocationOutcome {
        let spills = self.spills();

        if spills.is_empty() {
            AllocationOutcome::Success
        } else {
            AllocationOutcome::SpillRequired(spills)
        }
    }

    pub fn into_result(self) -> AllocationResult {
        AllocationResult {
            allocation: self.get_assignments(),
            outcome: self.outcome()
        }
    }
}
