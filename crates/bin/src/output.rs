//! Output formatting helpers for human-readable and JSON output.

use nestmap::{ContainerKind, PathBuf, event::Added, map::NodeRef};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  ").trim_end());

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

/// Kind label of a traversal node.
pub fn node_kind(node: &NodeRef<'_>) -> ContainerKind {
    match node {
        NodeRef::Value(_) => ContainerKind::Value,
        NodeRef::Set(_) => ContainerKind::Set,
        NodeRef::Map(_) => ContainerKind::Map,
    }
}

/// Short human description of a traversal node.
pub fn describe_node(node: &NodeRef<'_>) -> String {
    match node {
        NodeRef::Value(value) => value.to_string(),
        NodeRef::Set(set) => {
            let values: Vec<String> = set.values().map(ToString::to_string).collect();
            format!("{{{}}}", values.join(", "))
        }
        NodeRef::Map(map) => format!("{} values", map.size()),
    }
}

/// JSON form of a traversal node.
pub fn node_json(path: &PathBuf, node: &NodeRef<'_>) -> serde_json::Value {
    let value = match node {
        NodeRef::Value(value) => serde_json::Value::from(*value),
        NodeRef::Set(set) => set.values().map(serde_json::Value::from).collect(),
        NodeRef::Map(map) => serde_json::Value::from(map.size()),
    };
    serde_json::json!({
        "path": path,
        "kind": node_kind(node).to_string(),
        "value": value,
    })
}

/// Short human description of what an add event inserted.
pub fn describe_added(added: &Added) -> String {
    match added {
        Added::Value(value) => value.to_string(),
        Added::Set(values) => format!("set of {}", values.len()),
        Added::Map(entries) => format!("map of {}", entries.len()),
    }
}
