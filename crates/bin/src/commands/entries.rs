//! Entries command - loads a document and lists its contents.

use nestmap::{MapOptions, Resolve};

use crate::cli::EntriesArgs;
use crate::commands::load_map;
use crate::output::{OutputFormat, describe_node, node_json, node_kind, print_table};

/// Run the entries command
pub fn run(
    args: &EntriesArgs,
    options: MapOptions,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let map = load_map(&args.file, options)?;
    let resolve = Resolve::new(!args.shallow_maps, !args.shallow_sets);

    match format {
        OutputFormat::Human => {
            if map.child_count() == 0 {
                println!("No entries found.");
                return Ok(());
            }

            let rows: Vec<Vec<String>> = map
                .entries(resolve)
                .map(|(path, node)| {
                    vec![
                        path.to_string(),
                        node_kind(&node).to_string(),
                        describe_node(&node),
                    ]
                })
                .collect();
            print_table(&["PATH", "KIND", "VALUE"], &rows);
            println!();
            println!("Total values: {}", map.size());
        }
        OutputFormat::Json => {
            for (path, node) in map.entries(resolve) {
                println!("{}", serde_json::to_string(&node_json(&path, &node))?);
            }
        }
    }

    Ok(())
}
