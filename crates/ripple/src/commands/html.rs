//! `html` subcommand: CLI-surface completeness only (spec §6 lists it
//! among the three subcommands). HTML/event-handler script extraction is
//! explicitly out of scope for this engine (spec §1, "external
//! collaborators") — it returns a typed error rather than silently
//! mis-extracting HTML.

use clap::Args;
use std::path::PathBuf;

use ripple_core::{RippleError, RippleResult};

#[derive(Args)]
pub struct HtmlArgs {
    pub path: PathBuf,
    pub line: u32,
    #[arg(long = "fn-index", default_value_t = 0)]
    pub fn_index: usize,
    #[arg(long = "save-output")]
    pub save_output: Option<PathBuf>,
}

pub fn run(_args: HtmlArgs) -> RippleResult<()> {
    Err(RippleError::InvalidInput(
        "html driver not implemented by this engine; extract <script> blocks and use \
         `standalone`/`configuration` instead"
            .to_string(),
    ))
}
