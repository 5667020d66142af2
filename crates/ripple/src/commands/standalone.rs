//! `standalone` subcommand: the `javascript` driver (spec §6) run
//! directly off the command line, with no configuration document.

use clap::Args;
use std::path::PathBuf;

use ripple_core::RippleResult;
use ripple_report::ReportModel;
use ripple_trace::{Engine, EngineOptions};

use crate::ignore_spec::{apply_ignore, IgnoreSpec};
use crate::output::emit_document;

#[derive(Args)]
pub struct StandaloneArgs {
    /// Entry-point JavaScript file to seed from.
    pub path: PathBuf,
    /// Line the seed function starts on.
    pub line: u32,
    /// Index among function-like nodes at `line` (spec §6
    /// `functionNodeFromLine`); 0 is the first.
    #[arg(long = "fn-index", default_value_t = 0)]
    pub fn_index: usize,
    /// Additional files to append to the same source buffer before
    /// `path`, e.g. other modules the seed's call graph spans.
    #[arg(long = "script")]
    pub scripts: Vec<PathBuf>,
    /// `path:line:type:index` entries to mark ignored before
    /// propagation (spec §4.4). May be repeated.
    #[arg(long = "ignore")]
    pub ignore: Vec<IgnoreSpec>,
    /// Write the JSON report here instead of stdout.
    #[arg(long = "save-output")]
    pub save_output: Option<PathBuf>,
}

pub fn run(args: StandaloneArgs) -> RippleResult<()> {
    let root = args
        .path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));

    let mut engine = Engine::new(root, EngineOptions::default());
    for extra in &args.scripts {
        append_relative(&mut engine, root, extra)?;
    }
    append_relative(&mut engine, root, &args.path)?;

    engine.parse()?;

    for spec in &args.ignore {
        apply_ignore(&mut engine, spec)?;
    }

    let file_name = relative_name(root, &args.path);
    let seed = engine.function_node_from_line(&file_name, args.line, args.fn_index)?;

    let model = ReportModel::new(&engine, seed)?;
    let document = model.to_document()?;
    emit_document(&document, args.save_output.as_deref())
}

fn append_relative(engine: &mut Engine, root: &std::path::Path, path: &std::path::Path) -> RippleResult<()> {
    let relative = relative_name(root, path);
    engine.append_file(&relative)
}

fn relative_name(root: &std::path::Path, path: &std::path::Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
