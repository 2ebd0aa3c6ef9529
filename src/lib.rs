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

//! # Graph coloring register allocator
//!
//! * `ir`: variables, registers, basic blocks with liveIn/liveOut sets
//! * `reg_alloc`: interference graph construction, Chaitin style
//!   simplify/select, validation
//! * `options`, `logging`: option strings and logger setup

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate docopt;
extern crate petgraph;
extern crate stderrlog;
extern crate thiserror;

#[macro_use]
extern crate mu_utils as utils;

pub mod ir;
pub mod reg_alloc;
pub mod options;
pub mod logging;
