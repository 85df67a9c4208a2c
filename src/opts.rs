use std::path::PathBuf;

use argh::FromArgs;
use log::LevelFilter;

use crate::dialect::DialectKind;
use crate::passes::{DebugMode, DEFAULT_MAX_ROUNDS};

/// Optimiser for Yul code.
#[derive(FromArgs)]
pub struct Opts {
    /// input file
    #[argh(positional)]
    pub file: Option<PathBuf>,

    /// output file
    #[argh(option, short = 'o')]
    pub output: Option<PathBuf>,

    /// target dialect (evm, wasm or generic)
    #[argh(option, default = "DialectKind::Evm")]
    pub dialect: DialectKind,

    /// custom step sequence replacing the default one
    #[argh(option)]
    pub steps: Option<String>,

    /// identifier that must not be renamed or removed
    #[argh(option)]
    pub reserve: Vec<String>,

    /// compress stack usage more aggressively
    #[argh(switch)]
    pub optimize_stack_allocation: bool,

    /// expected number of executions, used to price constants
    #[argh(option, default = "200")]
    pub runs: usize,

    /// price constants for creation code
    #[argh(switch)]
    pub creation: bool,

    /// round limit of every stability loop
    #[argh(option, default = "DEFAULT_MAX_ROUNDS")]
    pub max_rounds: usize,

    /// step tracing (none, steps or changes)
    #[argh(option, default = "DebugMode::None")]
    pub debug: DebugMode,

    /// logging level
    #[argh(option, long = "log", default = "LevelFilter::Warn")]
    pub log_level: LevelFilter,
}

impl Opts {
    /// Parse options from `env::args`.
    pub fn parse() -> Opts {
        argh::from_env()
    }
}
