//! Emits a [`ReportDocument`] as pretty JSON, to stdout or a file
//! (spec §6 `--save-output`).

use std::path::Path;

use ripple_core::{RippleError, RippleResult};
use ripple_report::ReportDocument;

pub fn emit_document(document: &ReportDocument, save_output: Option<&Path>) -> RippleResult<()> {
    let json = serde_json::to_string_pretty(document)
        .map_err(|e| RippleError::InvalidInput(format!("failed to serialize report: {e}")))?;

    match save_output {
        Some(path) => std::fs::write(path, json).map_err(|source| RippleError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
