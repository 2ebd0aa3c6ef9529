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

//! The input side of the allocator: variables, registers, basic blocks with
//! their live sets, and the register palette.

use utils::LinkedHashSet;
use utils::vec_utils;

use thiserror::Error;

use std::fmt;

/// a program value, identified by its name only
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(String);

impl Variable {
    pub fn new<S: Into<String>>(name: S) -> Variable {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for Variable {
    fn from(name: &'a str) -> Variable {
        Variable::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Variable {
        Variable(name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// a physical register (a color in the interference graph)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(String);

impl Register {
    pub fn new<S: Into<String>>(name: S) -> Register {
        Register(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for Register {
    fn from(name: &'a str) -> Register {
        Register::new(name)
    }
}

impl From<String> for Register {
    fn from(name: String) -> Register {
        Register(name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// A basic block as handed over by liveness analysis.
///
/// `instructions` lists the variable each instruction writes, in execution
/// order. `live_in` and `live_out` are sets; duplicates supplied by the caller
/// are dropped on construction. Blocks are immutable once built.
#[derive(Clone, Debug)]
pub struct BasicBlock {
    id: usize,
    instructions: Vec<Variable>,
    live_in: LinkedHashSet<Variable>,
    live_out: LinkedHashSet<Variable>
}

impl BasicBlock {
    pub fn new(id: usize, instructions: Vec<Variable>, live_in: Vec<Variable>, live_out: Vec<Variable>) -> BasicBlock {
        BasicBlock {
            id: id,
            instructions: instructions,
            live_in: LinkedHashSet::from_vec(live_in),
            live_out: LinkedHashSet::from_vec(live_out)
        }
    }

    /// shorthand for building blocks from variable names
    pub fn from_names(id: usize, instructions: &[&str], live_in: &[&str], live_out: &[&str]) -> BasicBlock {
        BasicBlock::new(
            id,
            instructions.iter().map(|x| Variable::from(*x)).collect(),
            live_in.iter().map(|x| Variable::from(*x)).collect(),
            live_out.iter().map(|x| Variable::from(*x)).collect()
        )
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn instructions(&self) -> &[Variable] {
        &self.instructions
    }

    pub fn live_in(&self) -> &LinkedHashSet<Variable> {
        &self.live_in
    }

    pub fn live_out(&self) -> &LinkedHashSet<Variable> {
        &self.live_out
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let live_in: Vec<&Variable> = self.live_in.iter().collect();
        let live_out: Vec<&Variable> = self.live_out.iter().collect();

        write!(f, "{}: {} ; in {} ; out {}",
               self.id,
               vec_utils::as_str(&self.instructions),
               vec_utils::as_str(&live_in),
               vec_utils::as_str(&live_out))
    }
}

/// The ordered set of registers available for allocation.
/// Select hands out registers in this order.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterPalette {
    regs: Vec<Register>
}

impl RegisterPalette {
    /// creates a palette, dropping repeated names (the first one wins)
    pub fn new(regs: Vec<Register>) -> RegisterPalette {
        let mut unique = Vec::with_capacity(regs.len());

        for reg in regs {
            if unique.contains(&reg) {
                warn!("register {} appears more than once in the palette, ignoring the duplicate", reg);
            } else {
                unique.push(reg);
            }
        }

        if unique.is_empty() {
            warn!("empty register palette, every variable will be spilled");
        }

        RegisterPalette { regs: unique }
    }

    pub fn from_names(names: &[&str]) -> RegisterPalette {
        RegisterPalette::new(names.iter().map(|x| Register::from(*x)).collect())
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    pub fn contains(&self, reg: &Register) -> bool {
        self.regs.contains(reg)
    }

    pub fn iter(&self) -> ::std::slice::Iter<Register> {
        self.regs.iter()
    }

    pub fn as_slice(&self) -> &[Register] {
        &self.regs
    }
}

impl Default for RegisterPalette {
    fn default() -> RegisterPalette {
        RegisterPalette::from_names(&["R1", "R2", "R3", "R4"])
    }
}

impl fmt::Display for RegisterPalette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", vec_utils::as_str(&self.regs))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String
}

/// Parses blocks in the text form used by the `regalloc` tool, one block per line:
///
/// ```text
/// # comment
/// 1: a b c ; in a b ; out c
/// ```
///
/// The `in` and `out` sections are optional.
pub fn parse_blocks(text: &str) -> Result<Vec<BasicBlock>, ParseError> {
    let mut ret = vec![];

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let block = parse_block(line, line_no)?;
        trace!("parsed block {}", block);
        ret.push(block);
    }

    Ok(ret)
}

fn parse_block(line: &str, line_no: usize) -> Result<BasicBlock, ParseError> {
    let error = |message: String| ParseError { line: line_no, message: message };

    let colon = match line.find(':') {
        Some(idx) => idx,
        None => return Err(error(format!("expected '<id>:' at the start of '{}'", line)))
    };

    let id_str = line[..colon].trim();
    let id = match id_str.parse::<usize>() {
        Ok(id) => id,
        Err(_) => return Err(error(format!("'{}' is not a block id", id_str)))
    };

    let mut sections = line[colon + 1..].split(';');
    let instructions = names(sections.next().unwrap_or(""));

    let mut live_in = vec![];
    let mut live_out = vec![];
    let mut seen_in = false;
    let mut seen_out = false;

    for section in sections {
        let mut words = section.split_whitespace();
        match words.next() {
            Some("in") if !seen_in => {
                seen_in = true;
                live_in = words.map(Variable::from).collect();
            }
            Some("out") if !seen_out => {
                seen_out = true;
                live_out = words.map(Variable::from).collect();
            }
            Some(other) => return Err(error(format!("unexpected section '{}' (expect one 'in' and one 'out')", other))),
            None => return Err(error("empty section".to_string()))
        }
    }

    Ok(BasicBlock::new(id, instructions, live_in, live_out))
}

fn names(section: &str) -> Vec<Variable> {
    section.split_whitespace().map(Variable::from).collect()
}
