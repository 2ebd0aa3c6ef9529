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

use log::Level;
use stderrlog;

use options::RegAllocLogLevel;

use std::env;

/// environment variable read when the log level is `env`
pub const LOG_LEVEL_ENV: &'static str = "REGALLOC_LOG_LEVEL";

pub fn start_logging(level: RegAllocLogLevel) {
    match level {
        RegAllocLogLevel::None  => {},
        RegAllocLogLevel::Error => start_logging_internal(Level::Error),
        RegAllocLogLevel::Warn  => start_logging_internal(Level::Warn),
        RegAllocLogLevel::Info  => start_logging_internal(Level::Info),
        RegAllocLogLevel::Debug => start_logging_internal(Level::Debug),
        RegAllocLogLevel::Trace => start_logging_internal(Level::Trace),
        RegAllocLogLevel::Env => {
            match env::var(LOG_LEVEL_ENV) {
                Ok(s) => match RegAllocLogLevel::from_string(&s) {
                    // env pointing at env would loop forever
                    Ok(RegAllocLogLevel::Env) => {},
                    Ok(level) => start_logging(level),
                    Err(e) => eprintln!("{}: {}, logging disabled", LOG_LEVEL_ENV, e)
                },
                _ => {} // Don't log
            }
        }
    }
}

pub fn start_logging_trace() {
    start_logging_internal(Level::Trace)
}

pub fn start_logging_env() {
    start_logging(RegAllocLogLevel::Env)
}

fn start_logging_internal(level: Level) {
    let verbose = match level {
        Level::Error => 0,
        Level::Warn  => 1,
        Level::Info  => 2,
        Level::Debug => 3,
        Level::Trace => 4,
    };

    match stderrlog::new().verbosity(verbose).init() {
        Ok(()) => info!("logger initialized"),
        Err(e) => error!("failed to init logger, probably already initialized: {:?}", e)
    }
}
