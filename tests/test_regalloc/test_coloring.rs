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

use mu_regalloc::ir::*;
use mu_regalloc::logging;
use mu_regalloc::reg_alloc::*;
use mu_regalloc::reg_alloc::validate::validate_regalloc;

use common::*;

use proptest::prelude::*;

fn four_regs() -> RegisterPalette {
    RegisterPalette::from_names(&["R1", "R2", "R3", "R4"])
}

#[test]
fn test_two_blocks_conservative() {
    logging::start_logging_trace();

    let ig = build_interference_graph(&two_blocks());
    let palette = four_regs();

    let coloring = GraphColoring::start(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    // smallest (degree, name) first: a(2), c(1), b(2), d(1), e(0)
    assert_eq!(coloring.removal_order(), vec![var("a"), var("c"), var("b"), var("d"), var("e")]);

    let result = coloring.into_result();
    assert_eq!(result.outcome, AllocationOutcome::Success);
    assert_eq!(result.allocation.registers(), btreemap!{
        var("a") => reg("R2"),
        var("b") => reg("R3"),
        var("c") => reg("R1"),
        var("d") => reg("R2"),
        var("e") => reg("R1")
    });
    assert!(result.allocation.spilled().is_empty());

    assert_valid_coloring(&ig, &result.allocation);
    validate_regalloc(&ig, &palette, &result).unwrap();
}

#[test]
fn test_k5_conservative_spills_everything() {
    let ig = complete_graph(&["e", "d", "c", "b", "a"]);
    let palette = four_regs();

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    assert_eq!(result.outcome, AllocationOutcome::SpillRequired(vec![var("a"), var("b"), var("c"), var("d"), var("e")]));
    assert_eq!(result.allocation.len(), 5);
    assert!(result.allocation.registers().is_empty());
    for v in &["a", "b", "c", "d", "e"] {
        assert!(result.allocation.is_spilled(&var(v)));
    }

    validate_regalloc(&ig, &palette, &result).unwrap();
}

#[test]
fn test_k5_optimistic_spills_in_select() {
    let ig = complete_graph(&["a", "b", "c", "d", "e"]);
    let palette = four_regs();

    let coloring = GraphColoring::start(&ig, &palette, SimplifyPolicy::Optimistic).unwrap();
    assert_eq!(coloring.removal_order(), vec![var("a"), var("b"), var("c"), var("d"), var("e")]);

    let result = coloring.into_result();
    assert_eq!(result.outcome, AllocationOutcome::SpillRequired(vec![var("a")]));
    assert_eq!(result.allocation.registers(), btreemap!{
        var("b") => reg("R4"),
        var("c") => reg("R3"),
        var("d") => reg("R2"),
        var("e") => reg("R1")
    });
    assert!(result.allocation.is_spilled(&var("a")));

    assert_valid_coloring(&ig, &result.allocation);
    validate_regalloc(&ig, &palette, &result).unwrap();
}

#[test]
fn test_k4_fits_four_registers() {
    let ig = complete_graph(&["a", "b", "c", "d"]);
    let palette = four_regs();

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    assert!(result.outcome.is_success());
    assert_eq!(result.allocation.len(), 4);
    assert_valid_coloring(&ig, &result.allocation);
}

#[test]
fn test_isolated_live_out_variable_gets_register() {
    let blocks = vec![BasicBlock::from_names(1, &[], &[], &["z"])];
    let ig = build_interference_graph(&blocks);

    let result = allocate(&ig, &four_regs(), SimplifyPolicy::Conservative).unwrap();

    assert_eq!(result.outcome, AllocationOutcome::Success);
    assert_eq!(result.allocation.register_of(&var("z")), Some(&reg("R1")));
    assert!(!result.allocation.is_spilled(&var("z")));
}

#[test]
fn test_single_register_spills_connected_nodes() {
    let ig = graph_from_edges(&["a", "b", "c"], &[("a", "b")]);
    let palette = RegisterPalette::from_names(&["R1"]);

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    assert_eq!(result.outcome, AllocationOutcome::SpillRequired(vec![var("a"), var("b")]));
    // c was simplified but select never ran, so it has no entry
    assert!(!result.allocation.contains(&var("c")));
    validate_regalloc(&ig, &palette, &result).unwrap();
}

#[test]
fn test_single_register_without_edges() {
    let ig = graph_from_edges(&["a", "b", "c"], &[]);
    let palette = RegisterPalette::from_names(&["R1"]);

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    assert!(result.outcome.is_success());
    assert_eq!(result.allocation.registers(), btreemap!{
        var("a") => reg("R1"),
        var("b") => reg("R1"),
        var("c") => reg("R1")
    });
}

#[test]
fn test_empty_palette() {
    let ig = graph_from_edges(&["z"], &[]);
    let palette = RegisterPalette::new(vec![]);

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();
    assert_eq!(result.outcome, AllocationOutcome::SpillRequired(vec![var("z")]));

    let result = allocate(&ig, &palette, SimplifyPolicy::Optimistic).unwrap();
    assert_eq!(result.outcome, AllocationOutcome::SpillRequired(vec![var("z")]));
    assert!(result.allocation.is_spilled(&var("z")));
}

#[test]
fn test_empty_graph() {
    let ig = InterferenceGraph::new();

    let result = allocate(&ig, &four_regs(), SimplifyPolicy::Conservative).unwrap();

    assert_eq!(result.outcome, AllocationOutcome::Success);
    assert!(result.allocation.is_empty());
}

#[test]
fn test_high_degree_node_is_not_spilled() {
    // a star: the center has degree 5, but the leaves simplify first
    let ig = graph_from_edges(
        &["x", "l1", "l2", "l3", "l4", "l5"],
        &[("x", "l1"), ("x", "l2"), ("x", "l3"), ("x", "l4"), ("x", "l5")]
    );
    let palette = RegisterPalette::from_names(&["R1", "R2"]);

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    assert!(result.outcome.is_success());
    assert_eq!(result.allocation.register_of(&var("x")), Some(&reg("R1")));
    for leaf in &["l1", "l2", "l3", "l4", "l5"] {
        assert_eq!(result.allocation.register_of(&var(leaf)), Some(&reg("R2")));
    }
}

#[test]
fn test_stuck_core_is_reported() {
    // K4 on a, b, c, d plus a tail e - a, three registers:
    // e goes first, then every node left has degree 3
    let mut ig = complete_graph(&["a", "b", "c", "d"]);
    ig.add_interference_edge(&var("e"), &var("a"));
    let palette = RegisterPalette::from_names(&["R1", "R2", "R3"]);

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    assert_eq!(result.outcome, AllocationOutcome::SpillRequired(vec![var("a"), var("b"), var("c"), var("d")]));
    assert!(!result.allocation.contains(&var("e")));
}

#[test]
fn test_cycle_policies_differ() {
    // a 4-cycle is 2-colorable, but every node has degree 2
    let ig = graph_from_edges(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "a")]);
    let palette = RegisterPalette::from_names(&["R1", "R2"]);

    let conservative = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();
    assert_eq!(conservative.outcome, AllocationOutcome::SpillRequired(vec![var("a"), var("b"), var("c"), var("d")]));

    let optimistic = allocate(&ig, &palette, SimplifyPolicy::Optimistic).unwrap();
    assert_eq!(optimistic.outcome, AllocationOutcome::Success);
    assert_eq!(optimistic.allocation.registers(), btreemap!{
        var("a") => reg("R2"),
        var("b") => reg("R1"),
        var("c") => reg("R2"),
        var("d") => reg("R1")
    });
    assert_valid_coloring(&ig, &optimistic.allocation);
}

#[test]
fn test_palette_order_decides_register() {
    let ig = graph_from_edges(&["a", "b"], &[("a", "b")]);
    let palette = RegisterPalette::from_names(&["rbx", "rax"]);

    let result = allocate(&ig, &palette, SimplifyPolicy::Conservative).unwrap();

    // a goes first on the stack, so b is colored first and gets the first register
    assert_eq!(result.allocation.register_of(&var("b")), Some(&reg("rbx")));
    assert_eq!(result.allocation.register_of(&var("a")), Some(&reg("rax")));
}

#[test]
fn test_deterministic() {
    let ig = build_interference_graph(&two_blocks());
    let palette = four_regs();

    for policy in &[SimplifyPolicy::Conservative, SimplifyPolicy::Optimistic] {
        let first = allocate(&ig, &palette, *policy).unwrap();
        for _ in 0..10 {
            assert_eq!(allocate(&ig, &palette, *policy).unwrap(), first);
        }
    }
}

#[test]
fn test_replay_detects_broken_order() {
    // with this order a is colored last, after both neighbors took the two registers
    let ig = complete_graph(&["a", "b", "c"]);
    let palette = RegisterPalette::from_names(&["R1", "R2"]);
    let order = vec![var("a"), var("b"), var("c")];

    match GraphColoring::replay(&ig, &palette, SimplifyPolicy::Conservative, &order) {
        Err(RegAllocError::NoFreeRegister { variable, forbidden }) => {
            assert_eq!(variable, var("a"));
            assert_vector_no_order(&forbidden, &vec![reg("R1"), reg("R2")]);
        }
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("expected the allocator to report a fault")
    }

    // the same order under the optimistic policy is an ordinary spill
    let coloring = GraphColoring::replay(&ig, &palette, SimplifyPolicy::Optimistic, &order).unwrap();
    assert_eq!(coloring.outcome(), AllocationOutcome::SpillRequired(vec![var("a")]));
    assert_eq!(coloring.get_color_of(&var("c")), Some(&reg("R1")));
    assert_eq!(coloring.get_color_of(&var("b")), Some(&reg("R2")));
}

#[test]
fn test_replay_rejects_partial_order() {
    let ig = complete_graph(&["a", "b", "c"]);
    let palette = four_regs();

    match GraphColoring::replay(&ig, &palette, SimplifyPolicy::Conservative, &[var("a")]) {
        Err(RegAllocError::IncompleteRemovalOrder(missing)) => assert_eq!(missing, vec![var("b"), var("c")]),
        Err(e) => panic!("unexpected error {}", e),
        Ok(coloring) => panic!("partial order accepted with outcome {}", coloring.outcome())
    }

    // unknown and repeated variables are skipped, the order still covers the graph
    let order = vec![var("a"), var("zz"), var("b"), var("a"), var("c")];
    let coloring = GraphColoring::replay(&ig, &palette, SimplifyPolicy::Conservative, &order).unwrap();
    let result = coloring.into_result();

    assert!(result.outcome.is_success());
    validate_regalloc(&ig, &palette, &result).unwrap();
}

proptest! {
    #[test]
    fn test_random_graphs(edges in edges_strategy(), k in 0..5usize) {
        let ig = graph_of(&edges);
        let palette = palette_of_size(k);

        for policy in &[SimplifyPolicy::Conservative, SimplifyPolicy::Optimistic] {
            let result = allocate(&ig, &palette, *policy).unwrap();

            validate_regalloc(&ig, &palette, &result).unwrap();
            assert_valid_coloring(&ig, &result.allocation);

            if result.outcome.is_success() {
                prop_assert_eq!(result.allocation.len(), ig.n_nodes());
            }
        }
    }

    #[test]
    fn test_conservative_spills_exactly_the_k_core(edges in edges_strategy(), k in 0..5usize) {
        let ig = graph_of(&edges);
        let result = allocate(&ig, &palette_of_size(k), SimplifyPolicy::Conservative).unwrap();
        let core = k_core(&ig, k);

        if core.is_empty() {
            prop_assert_eq!(result.outcome, AllocationOutcome::Success);
        } else {
            prop_assert_eq!(result.allocation.spilled(), core.clone());
            prop_assert_eq!(result.outcome, AllocationOutcome::SpillRequired(core));
        }
    }
}
