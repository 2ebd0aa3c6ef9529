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
use reg_alloc::{AllocationOutcome, AllocationResult, Assignment, RegAllocError};
use reg_alloc::graph_coloring::InterferenceGraph;

/// Checks an allocation result against the graph it was computed from.
///
/// The graph has to be symmetric and free of self edges, registers have to
/// come from the palette, interfering variables never share a register, a
/// successful outcome covers every node, and the spill list matches the
/// variables marked as spilled.
pub fn validate_regalloc(ig: &InterferenceGraph, palette: &RegisterPalette, result: &AllocationResult) -> Result<(), RegAllocError> {
    debug!("---Validating register allocation results---");

    let mut errors: Vec<String> = vec![];

    let adjacency = ig.adjacency();

    debug!("checking interference graph...");
    for (var, adj) in adjacency.iter() {
        if adj.contains(var) {
            errors.push(format!("{} interferes with itself", var));
        }

        for w in adj.iter() {
            let symmetric = match adjacency.get(w) {
                Some(w_adj) => w_adj.contains(var),
                None => false
            };
            if !symmetric {
                errors.push(format!("edge {} - {} is not symmetric", var, w));
            }
        }
    }

    let ref allocation = result.allocation;

    debug!("checking assignments...");
    for (var, assignment) in allocation.iter() {
        if !ig.contains(var) {
            errors.push(format!("{} is allocated but not in the interference graph", var));
            continue;
        }

        if let Assignment::Register(ref reg) = *assignment {
            if !palette.contains(reg) {
                errors.push(format!("{} is assigned to {} which is not in the palette {}", var, reg, palette));
            }

            for w in ig.neighbors(var) {
                // report each conflicting edge once
                if *var < w && allocation.register_of(&w) == Some(reg) {
                    errors.push(format!("{} and {} interfere but both hold {}", var, w, reg));
                }
            }
        }
    }

    debug!("checking outcome {}...", result.outcome);
    match result.outcome {
        AllocationOutcome::Success => {
            for var in ig.temps() {
                if allocation.register_of(&var).is_none() {
                    errors.push(format!("allocation succeeded but {} has no register", var));
                }
            }
        }
        AllocationOutcome::SpillRequired(ref spills) => {
            if spills.is_empty() {
                errors.push("spill required but no variable to spill".to_string());
            }
            for var in spills.iter() {
                if !allocation.is_spilled(var) {
                    errors.push(format!("{} should be spilled but is not marked so", var));
                }
            }
            for var in allocation.spilled() {
                if !spills.contains(&var) {
                    errors.push(format!("{} is marked spilled but not reported", var));
                }
            }
        }
    }

    if errors.is_empty() {
        debug!("register allocation is valid");
        Ok(())
    } else {
        for e in errors.iter() {
            error!("{}", e);
        }
        Err(RegAllocError::ValidationFailed(errors.join("; ")))
    }
}
