//! Parses and applies `path:line:type:index` ignore entries (spec §4.4,
//! §6) shared by the `standalone` and `configuration` subcommands.

use std::str::FromStr;

use ripple_core::{RippleError, RippleResult};
use ripple_trace::Engine;

/// One parsed `--ignore path:line:type:index` argument.
#[derive(Debug, Clone)]
pub struct IgnoreSpec {
    pub path: String,
    pub line: u32,
    pub node_type: String,
    pub index: usize,
}

impl FromStr for IgnoreSpec {
    type Err = RippleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.rsplitn(4, ':').collect();
        if parts.len() != 4 {
            return Err(RippleError::InvalidInput(format!(
                "expected path:line:type:index, got {s:?}"
            )));
        }
        // `rsplitn` yields pieces in reverse order.
        let (index, node_type, line, path) = (parts[0], parts[1], parts[2], parts[3]);
        Ok(IgnoreSpec {
            path: path.to_string(),
            line: line
                .parse()
                .map_err(|_| RippleError::InvalidInput(format!("bad line in {s:?}")))?,
            node_type: node_type.to_string(),
            index: index
                .parse()
                .map_err(|_| RippleError::InvalidInput(format!("bad index in {s:?}")))?,
        })
    }
}

/// Locate the node a spec names and mark it ignored on `engine`.
/// `node_type` is matched against [`ripple_trace::NodeKind::label`].
pub fn apply_ignore(engine: &mut Engine, spec: &IgnoreSpec) -> RippleResult<()> {
    let node_type = spec.node_type.clone();
    let node = engine.node_by_line_filter_index(&spec.path, spec.line, spec.index, |arena, id| {
        arena.get(id).kind.label() == node_type
    })?;
    engine.mark_ignored(node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_separated_spec() {
        let spec: IgnoreSpec = "fixture.js:3:CallExpression:0".parse().unwrap();
        assert_eq!(spec.path, "fixture.js");
        assert_eq!(spec.line, 3);
        assert_eq!(spec.node_type, "CallExpression");
        assert_eq!(spec.index, 0);
    }

    #[test]
    fn rejects_malformed_spec() {
        assert!("fixture.js:3".parse::<IgnoreSpec>().is_err());
    }
}
