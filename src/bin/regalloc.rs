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

extern crate mu_regalloc;

use mu_regalloc::ir;
use mu_regalloc::ir::BasicBlock;
use mu_regalloc::logging;
use mu_regalloc::options::{OptionsError, RegAllocOptions};
use mu_regalloc::reg_alloc;
use mu_regalloc::reg_alloc::{AllocationOutcome, RegisterAllocation};

use std::env;
use std::fs;
use std::process;

const EXIT_SPILL: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// the two blocks allocated when no input file is given
fn example_blocks() -> Vec<BasicBlock> {
    vec![
        BasicBlock::from_names(1, &["a", "b", "c"], &["a", "b"], &["c"]),
        BasicBlock::from_names(2, &["b", "d", "e"], &["b"], &["d", "e"])
    ]
}

fn load_blocks(path: &str) -> Result<Vec<BasicBlock>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
    ir::parse_blocks(&text).map_err(|e| format!("{}: {}", path, e))
}

fn main() {
    let options = match RegAllocOptions::try_init_argv(env::args()) {
        Ok(options) => options,
        Err(OptionsError::Docopt(e)) => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_ERROR);
        }
    };

    logging::start_logging(options.log_level());

    let blocks = match options.arg_file {
        Some(ref path) => match load_blocks(path) {
            Ok(blocks) => blocks,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(EXIT_ERROR);
            }
        },
        None => example_blocks()
    };

    let allocator = RegisterAllocation::from_options(&options);
    let ig = reg_alloc::build(&blocks);

    if options.flag_emit_dot {
        println!("{}", ig.to_dot());
    }

    match allocator.allocate_graph(&ig) {
        Ok(result) => {
            println!("Register Allocation:");
            print!("{}", result.allocation);
            println!("{}", result.outcome);

            if let AllocationOutcome::SpillRequired(_) = result.outcome {
                process::exit(EXIT_SPILL);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_ERROR);
        }
    }
}
