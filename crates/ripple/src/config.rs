//! On-disk configuration document (spec §6): describes which driver
//! populates the `SourceBuffer`, which files to append, which nodes to
//! ignore, and which function to seed. Loading it is a CLI collaborator
//! concern — the shape itself is part of the interface the core exposes
//! (spec §6), so it lives in this crate rather than in `ripple_trace`.
//!
//! Grounded on `vize`'s `config.rs`: `serde_json`-backed, unknown keys
//! ignored (`#[serde(default)]` throughout), warn-and-default on a parse
//! error rather than a hard failure at the CLI boundary.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration document (spec §6).
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RippleConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub serializer: SerializerConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverConfig {
    /// Which extractor populates the `SourceBuffer`: `"javascript"` or
    /// `"html"`. Defaults to `"javascript"` when omitted.
    #[serde(default = "default_driver_type")]
    pub r#type: String,
    /// Filesystem root relative paths below are resolved against.
    #[serde(default = "default_root")]
    pub root: String,
    /// Relative paths to append (javascript driver).
    #[serde(default)]
    pub scripts: Vec<String>,
    /// HTML entry point (html driver; not implemented by this engine,
    /// see `commands::html`).
    #[serde(rename = "pathToHTML", default, skip_serializing_if = "Option::is_none")]
    pub path_to_html: Option<String>,
    #[serde(default)]
    pub ignore: Vec<IgnoreEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_async: Option<MarkAsync>,
}

fn default_driver_type() -> String {
    "javascript".to_string()
}

fn default_root() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IgnoreEntry {
    pub path: String,
    pub line: u32,
    pub r#type: String,
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsync {
    pub path: String,
    pub line: u32,
    #[serde(default)]
    pub function_index: usize,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SerializerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default)]
    pub options: serde_json::Value,
}

/// Load a configuration document from `path`. A parse failure is a
/// warning, not a hard error (mirrors `vize::config::load_config`'s
/// warn-and-default policy) — the caller gets an empty, default
/// configuration back rather than the CLI aborting on a malformed file.
pub fn load_config(path: &Path) -> RippleConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("warning: failed to parse {}: {e}", path.display());
                RippleConfig::default()
            }
        },
        Err(e) => {
            eprintln!("warning: failed to read {}: {e}", path.display());
            RippleConfig::default()
        }
    }
}
