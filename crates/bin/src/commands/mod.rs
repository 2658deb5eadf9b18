//! Subcommand implementations.

use std::path::Path;

use nestmap::{MapOptions, NestedMap};

pub mod entries;
pub mod replay;

/// Load a JSON document from `file` into a map.
pub fn load_map(file: &Path, options: MapOptions) -> Result<NestedMap, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let map = NestedMap::from_json(&json, options)?;
    tracing::info!(
        file = %file.display(),
        values = map.size(),
        "Loaded document"
    );
    Ok(map)
}
