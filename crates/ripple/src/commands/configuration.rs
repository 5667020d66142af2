//! `configuration` subcommand: loads the JSON document of spec §6 and
//! dispatches to the driver it names.

use clap::Args;
use std::path::PathBuf;

use ripple_core::{RippleError, RippleResult};
use ripple_report::ReportModel;
use ripple_trace::{Engine, EngineOptions};

use crate::config::{load_config, DriverConfig};
use crate::ignore_spec::{apply_ignore, IgnoreSpec};
use crate::output::emit_document;

#[derive(Args)]
pub struct ConfigurationArgs {
    /// Path to the JSON configuration document.
    pub file: PathBuf,
    /// Write the JSON report here instead of stdout; overrides whatever
    /// the document's own `serializer.options` might later grow.
    #[arg(long = "save-output")]
    pub save_output: Option<PathBuf>,
}

pub fn run(args: ConfigurationArgs) -> RippleResult<()> {
    let config = load_config(&args.file);

    match config.driver.r#type.as_str() {
        "javascript" => run_javascript(&config.driver, args.save_output.as_deref()),
        "html" => Err(RippleError::InvalidInput(
            "html driver not implemented by this engine; extract <script> blocks and use \
             `standalone`/`configuration` instead"
                .to_string(),
        )),
        other => Err(RippleError::InvalidInput(format!("unknown driver.type {other:?}"))),
    }
}

fn run_javascript(driver: &DriverConfig, save_output: Option<&std::path::Path>) -> RippleResult<()> {
    let mark_async = driver.mark_async.as_ref().ok_or_else(|| {
        RippleError::InvalidInput("configuration is missing driver.markAsync".to_string())
    })?;

    let mut engine = Engine::new(&driver.root, EngineOptions::default());
    for script in &driver.scripts {
        engine.append_file(script)?;
    }
    engine.parse()?;

    for entry in &driver.ignore {
        let spec = IgnoreSpec {
            path: entry.path.clone(),
            line: entry.line,
            node_type: entry.r#type.clone(),
            index: entry.index,
        };
        apply_ignore(&mut engine, &spec)?;
    }

    let seed = engine.function_node_from_line(&mark_async.path, mark_async.line, mark_async.function_index)?;
    let model = ReportModel::new(&engine, seed)?;
    let document = model.to_document()?;
    emit_document(&document, save_output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn runs_end_to_end_from_a_configuration_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "function a() { b(); }\n").unwrap();
        std::fs::write(dir.path().join("b.js"), "function b() {}\n").unwrap();

        let config_path = dir.path().join("ripple.config.json");
        let mut f = std::fs::File::create(&config_path).unwrap();
        write!(
            f,
            r#"{{
                "driver": {{
                    "type": "javascript",
                    "root": {root:?},
                    "scripts": ["a.js", "b.js"],
                    "markAsync": {{ "path": "b.js", "line": 1, "functionIndex": 0 }}
                }}
            }}"#,
            root = dir.path().to_string_lossy()
        )
        .unwrap();

        let output_path = dir.path().join("report.json");
        run(ConfigurationArgs { file: config_path, save_output: Some(output_path.clone()) }).unwrap();

        let report = std::fs::read_to_string(output_path).unwrap();
        assert!(report.contains("\"seed_name\": \"b\""));
        assert!(report.contains("a.js"));
    }

    #[test]
    fn html_driver_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("ripple.config.json");
        std::fs::write(&config_path, r#"{"driver": {"type": "html"}}"#).unwrap();

        let err = run(ConfigurationArgs { file: config_path, save_output: None }).unwrap_err();
        assert!(matches!(err, RippleError::InvalidInput(_)));
    }
}
