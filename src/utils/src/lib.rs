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

//! # Utility crate that serves the register allocator
//!
//! It includes:
//!
//! * data structures
//!   * linked hashmap/set (insertion ordered, so iteration is deterministic)
//! * extra functions for existing types
//!   * vector
//! * conditional logging macro

extern crate linked_hash_map;

/// print trace!() log if condition is true (the condition should be a constant boolean)
#[macro_export]
macro_rules! trace_if {
    ($cond: expr, $($arg:tt)*) => {
        if $cond {
            trace!($($arg)*)
        }
    }
}

/// linked hashset implementation based on LinkedHashMap
mod linked_hashset;

// re-export these data structures

pub use linked_hash_map::LinkedHashMap;
pub use linked_hashset::LinkedHashSet;

/// vector utilities
pub mod vec_utils;
