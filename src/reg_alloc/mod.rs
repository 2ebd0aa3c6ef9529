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

//! Register allocation by graph coloring.
//!
//! The interference graph is built from per-block liveness
//! ([`build_interference_graph`](graph_coloring/fn.build_interference_graph.html)),
//! then colored with Chaitin's simplify/select ([`GraphColoring`](graph_coloring/struct.GraphColoring.html)).
//! Needing to spill is a normal outcome, not an error. An error means the
//! allocator itself is broken.

use ir::*;
use options::RegAllocOptions;
use utils::LinkedHashMap;
use utils::vec_utils;

use thiserror::Error;

use std::collections::BTreeMap;
use std::fmt;

pub mod graph_coloring;
pub mod validate;

pub use reg_alloc::graph_coloring::InterferenceGraph;
pub use reg_alloc::graph_coloring::GraphColoring;
pub use reg_alloc::graph_coloring::SimplifyPolicy;
pub use reg_alloc::graph_coloring::build_interference_graph;

/// where a variable ends up
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Assignment {
    Register(Register),
    /// no register, the variable has to live in memory
    Spilled
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Assignment::Register(ref reg) => write!(f, "{}", reg),
            Assignment::Spilled => write!(f, "spilled")
        }
    }
}

/// mapping from variables to assignments, one entry per variable
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
    map: LinkedHashMap<Variable, Assignment>
}

impl Allocation {
    pub fn new() -> Allocation {
        Allocation {
            map: LinkedHashMap::new()
        }
    }

    /// sets the assignment of a variable, replacing any earlier one
    pub fn insert(&mut self, var: Variable, assignment: Assignment) {
        self.map.insert(var, assignment);
    }

    pub fn get(&self, var: &Variable) -> Option<&Assignment> {
        self.map.get(var)
    }

    pub fn register_of(&self, var: &Variable) -> Option<&Register> {
        match self.map.get(var) {
            Some(&Assignment::Register(ref reg)) => Some(reg),
            _ => None
        }
    }

    pub fn is_spilled(&self, var: &Variable) -> bool {
        match self.map.get(var) {
            Some(&Assignment::Spilled) => true,
            _ => false
        }
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.map.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Assignment)> {
        self.map.iter()
    }

    /// variables that got a register, with their register
    pub fn registers(&self) -> BTreeMap<Variable, Register> {
        let mut ret = BTreeMap::new();
        for (var, assignment) in self.map.iter() {
            if let Assignment::Register(ref reg) = *assignment {
                ret.insert(var.clone(), reg.clone());
            }
        }
        ret
    }

    /// variables marked as spilled, in allocation order
    pub fn spilled(&self) -> Vec<Variable> {
        self.map.iter()
            .filter(|&(_, assignment)| *assignment == Assignment::Spilled)
            .map(|(var, _)| var.clone())
            .collect()
    }
}

impl Default for Allocation {
    fn default() -> Allocation {
        Allocation::new()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (var, assignment) in self.map.iter() {
            writeln!(f, "{} -> {}", var, assignment)?;
        }
        Ok(())
    }
}

/// outcome of one allocation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// every variable got a register
    Success,
    /// these variables (sorted by name) could not be colored, the caller has
    /// to insert spill code and run the allocator again
    SpillRequired(Vec<Variable>)
}

impl AllocationOutcome {
    pub fn is_success(&self) -> bool {
        *self == AllocationOutcome::Success
    }

    pub fn spills(&self) -> &[Variable] {
        match *self {
            AllocationOutcome::Success => &[],
            AllocationOutcome::SpillRequired(ref spills) => spills
        }
    }
}

impl fmt::Display for AllocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AllocationOutcome::Success => write!(f, "success"),
            AllocationOutcome::SpillRequired(ref spills) => write!(f, "spill required: {}", vec_utils::as_str(spills))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AllocationResult {
    pub allocation: Allocation,
    pub outcome: AllocationOutcome
}

/// Faults of the allocator itself. These are never used to report a spill.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegAllocError {
    /// Select ran out of registers after Conservative Simplify succeeded
    #[error("no free register for {variable} after simplify succeeded (neighbors hold {forbidden:?})")]
    NoFreeRegister {
        variable: Variable,
        forbidden: Vec<Register>
    },
    /// a replayed removal order does not cover every node of the graph
    #[error("removal order leaves out {}", vec_utils::as_str(.0))]
    IncompleteRemovalOrder(Vec<Variable>),
    /// the validator rejected an allocation
    #[error("register allocation validation failed: {0}")]
    ValidationFailed(String)
}

/// builds the interference graph for the given blocks
pub fn build(blocks: &[BasicBlock]) -> InterferenceGraph {
    build_interference_graph(blocks)
}

/// colors an interference graph with the given palette
pub fn allocate(graph: &InterferenceGraph, palette: &RegisterPalette, policy: SimplifyPolicy) -> Result<AllocationResult, RegAllocError> {
    let coloring = GraphColoring::start(graph, palette, policy)?;
    Ok(coloring.into_result())
}

/// The whole allocation pass: liveness to interference graph, coloring, and
/// (optionally) validation of the result.
pub struct RegisterAllocation {
    name: &'static str,
    palette: RegisterPalette,
    policy: SimplifyPolicy,
    validate: bool
}

impl RegisterAllocation {
    pub fn new(palette: RegisterPalette, policy: SimplifyPolicy) -> RegisterAllocation {
        RegisterAllocation {
            name: "Register Allocation",
            palette: palette,
            policy: policy,
            validate: true
        }
    }

    pub fn from_options(options: &RegAllocOptions) -> RegisterAllocation {
        let mut ret = RegisterAllocation::new(options.palette(), options.policy());
        ret.validate = !options.flag_disable_regalloc_validate;
        ret
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn palette(&self) -> &RegisterPalette {
        &self.palette
    }

    pub fn policy(&self) -> SimplifyPolicy {
        self.policy
    }

    pub fn set_validate(&mut self, validate: bool) {
        self.validate = validate;
    }

    pub fn run(&self, blocks: &[BasicBlock]) -> Result<AllocationResult, RegAllocError> {
        debug!("---{} for {} block(s)---", self.name, blocks.len());

        let ig = build_interference_graph(blocks);
        self.allocate_graph(&ig)
    }

    pub fn allocate_graph(&self, ig: &InterferenceGraph) -> Result<AllocationResult, RegAllocError> {
        ig.print();

        let coloring = GraphColoring::start(ig, &self.palette, self.policy)?;
        trace!("removal order: {}", vec_utils::as_str(&coloring.removal_order()));

        let result = coloring.into_result();

        if self.validate {
            validate::validate_regalloc(ig, &self.palette, &result)?;
        }

        match result.outcome {
            AllocationOutcome::Success => info!("allocated {} variable(s) to {}", result.allocation.len(), self.palette),
            AllocationOutcome::SpillRequired(ref spills) => info!("spill required for {}", vec_utils::as_str(spills))
        }
        debug!("---finish---");

        Ok(result)
    }
}
