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

use docopt;
use docopt::Docopt;
use thiserror::Error;

use ir::{Register, RegisterPalette};
use reg_alloc::SimplifyPolicy;

use std::default::Default;
use std::process;

const USAGE: &'static str = "
regalloc (graph coloring register allocator). Pass arguments as a string to init it.

Usage:
  regalloc [options] [<file>]

Logging:
  --log-level=<level>                   logging level: none, error, warn, info, debug, trace, env [default: env]

Allocator:
  --registers=<list>                    comma separated register palette, in allocation order [default: R1,R2,R3,R4]
  --simplify-policy=<policy>            node removal policy: conservative, optimistic [default: conservative]
  --disable-regalloc-validate           disable register allocation validation
  --emit-dot                            print the interference graph in dot format
";

/// program name docopt expects in front of the arguments
const PROGRAM_NAME: &'static str = "regalloc";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("{0}")]
    Docopt(#[from] docopt::Error),
    #[error("unrecognised log level '{0}'")]
    UnknownLogLevel(String)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegAllocOptions {
    // logging
    pub flag_log_level: RegAllocLogLevel,

    // allocator
    pub flag_registers: String,
    pub flag_simplify_policy: SimplifyPolicy,
    pub flag_disable_regalloc_validate: bool,
    pub flag_emit_dot: bool,

    // input for the command line tool, blocks in text form
    pub arg_file: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RegAllocLogLevel {
    None, Error, Warn, Info, Debug, Trace, Env
}

impl RegAllocLogLevel {
    pub fn from_string(s: &str) -> Result<RegAllocLogLevel, OptionsError> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(RegAllocLogLevel::None),
            "error" => Ok(RegAllocLogLevel::Error),
            "warn" => Ok(RegAllocLogLevel::Warn),
            "info" => Ok(RegAllocLogLevel::Info),
            "debug" => Ok(RegAllocLogLevel::Debug),
            "trace" => Ok(RegAllocLogLevel::Trace),
            "env" => Ok(RegAllocLogLevel::Env),
            _ => Err(OptionsError::UnknownLogLevel(s.to_string()))
        }
    }
}

impl RegAllocOptions {
    /// Parses options from a whitespace separated string, e.g.
    /// `"--registers=R1,R2 --simplify-policy=optimistic"`.
    /// Exits the process with the usage text if the string does not parse.
    pub fn init(str: &str) -> RegAllocOptions {
        match RegAllocOptions::try_init(str) {
            Ok(ret) => ret,
            Err(OptionsError::Docopt(e)) => e.exit(),
            Err(e) => {
                error!("{}", e);
                process::exit(1)
            }
        }
    }

    pub fn try_init(str: &str) -> Result<RegAllocOptions, OptionsError> {
        info!("init regalloc options with: {:?}", str);

        let argv = Some(PROGRAM_NAME).into_iter().chain(str.split_whitespace());
        RegAllocOptions::try_init_argv(argv)
    }

    /// parses options from an argument vector whose first element is the program name
    pub fn try_init_argv<I, S>(argv: I) -> Result<RegAllocOptions, OptionsError>
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        let ret: RegAllocOptions = Docopt::new(USAGE)
            .and_then(|d| d.argv(argv).deserialize())?;

        info!("parsed as {:?}", ret);

        Ok(ret)
    }

    /// the register palette given by --registers
    pub fn palette(&self) -> RegisterPalette {
        let regs: Vec<Register> = self.flag_registers.split(',')
            .map(|x| x.trim())
            .filter(|x| !x.is_empty())
            .map(Register::from)
            .collect();

        RegisterPalette::new(regs)
    }

    pub fn policy(&self) -> SimplifyPolicy {
        self.flag_simplify_policy
    }

    pub fn log_level(&self) -> RegAllocLogLevel {
        self.flag_log_level
    }
}

impl RegAllocOptions {
    /// the defaults of the usage text, without going through docopt
    fn builtin_defaults() -> RegAllocOptions {
        RegAllocOptions {
            flag_log_level: RegAllocLogLevel::Env,
            flag_registers: "R1,R2,R3,R4".to_string(),
            flag_simplify_policy: SimplifyPolicy::default(),
            flag_disable_regalloc_validate: false,
            flag_emit_dot: false,
            arg_file: None
        }
    }
}

impl Default for RegAllocOptions {
    fn default() -> RegAllocOptions {
        match RegAllocOptions::try_init("") {
            Ok(ret) => ret,
            Err(e) => {
                error!("failed to parse default options: {}, using built-in defaults", e);
                RegAllocOptions::builtin_defaults()
            }
        }
    }
}
