//! Replay command - applies a list of mutations and reports the events.

use std::{cell::RefCell, iter::Peekable, rc::Rc};

use nestmap::{Event, EventKinds, MapOptions, NestedMap, Observable, PathBuf, Value};

use crate::cli::ReplayArgs;
use crate::commands::load_map;
use crate::output::{OutputFormat, describe_added, describe_node, print_table};

const KEYWORDS: [&str; 5] = ["add", "set", "delete", "clear", "purge"];

/// Errors in the operation list given on the command line.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("unknown operation '{0}', expected one of add, set, delete, clear, purge")]
    Unknown(String),

    #[error("'{op}' needs an argument")]
    MissingArgument { op: &'static str },

    #[error("'{op}' expects PATH=VALUE, got '{arg}'")]
    MissingValue { op: &'static str, arg: String },

    #[error("invalid path '{input}': {source}")]
    Path {
        input: String,
        source: nestmap::Error,
    },

    #[error("invalid value '{input}': {source}")]
    Value {
        input: String,
        source: nestmap::Error,
    },
}

/// A single mutation to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Add(PathBuf, Value),
    Set(PathBuf, Value),
    Delete(PathBuf, Option<Value>),
    Clear(PathBuf),
    Purge,
}

/// Parse a path: a JSON array when it starts with `[`, dotted otherwise.
fn parse_path(input: &str) -> Result<PathBuf, OpError> {
    if !input.starts_with('[') {
        return Ok(PathBuf::normalize(input));
    }
    let parsed = serde_json::from_str::<serde_json::Value>(input)
        .map_err(nestmap::Error::from)
        .and_then(|json| PathBuf::try_from(&json).map_err(nestmap::Error::from));
    parsed.map_err(|source| OpError::Path {
        input: input.to_string(),
        source,
    })
}

/// Parse a value: a JSON scalar, or the raw text if it is not JSON.
fn parse_value(input: &str) -> Result<Value, OpError> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(input) else {
        return Ok(Value::from(input));
    };
    Value::try_from(&json).map_err(|err| OpError::Value {
        input: input.to_string(),
        source: err.into(),
    })
}

/// Split `PATH=VALUE`, respecting `=` inside a JSON array path.
fn split_assignment(arg: &str) -> (&str, Option<&str>) {
    if arg.starts_with('[') {
        return match arg.find("]=") {
            Some(end) => (&arg[..=end], Some(&arg[end + 2..])),
            None => (arg, None),
        };
    }
    match arg.split_once('=') {
        Some((path, value)) => (path, Some(value)),
        None => (arg, None),
    }
}

fn next_argument<'a, I>(tokens: &mut Peekable<I>, op: &'static str) -> Result<&'a str, OpError>
where
    I: Iterator<Item = &'a str>,
{
    tokens.next().ok_or(OpError::MissingArgument { op })
}

fn parse_assignment(arg: &str, op: &'static str) -> Result<(PathBuf, Value), OpError> {
    match split_assignment(arg) {
        (path, Some(value)) => Ok((parse_path(path)?, parse_value(value)?)),
        (_, None) => Err(OpError::MissingValue {
            op,
            arg: arg.to_string(),
        }),
    }
}

/// Parse the operation list.
pub fn parse_ops<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<Vec<Op>, OpError> {
    let mut tokens = tokens.into_iter().peekable();
    let mut ops = Vec::new();

    while let Some(keyword) = tokens.next() {
        let op = match keyword {
            "add" => {
                let (path, value) = parse_assignment(next_argument(&mut tokens, "add")?, "add")?;
                Op::Add(path, value)
            }
            "set" => {
                let (path, value) = parse_assignment(next_argument(&mut tokens, "set")?, "set")?;
                Op::Set(path, value)
            }
            "delete" => {
                let arg = next_argument(&mut tokens, "delete")?;
                let (path, value) = split_assignment(arg);
                Op::Delete(parse_path(path)?, value.map(parse_value).transpose()?)
            }
            "clear" => match tokens.next_if(|token| !KEYWORDS.contains(token)) {
                Some(path) => Op::Clear(parse_path(path)?),
                None => Op::Clear(PathBuf::new()),
            },
            "purge" => Op::Purge,
            other => return Err(OpError::Unknown(other.to_string())),
        };
        ops.push(op);
    }
    Ok(ops)
}

fn apply(map: &mut NestedMap, op: Op) -> nestmap::Result<()> {
    tracing::debug!(?op, "Applying operation");
    match op {
        Op::Add(path, value) => map.add(path, value)?,
        Op::Set(path, value) => map.set(path, value)?,
        Op::Delete(path, None) => {
            map.delete(path);
        }
        Op::Delete(path, Some(value)) => {
            map.delete_value(path, &value);
        }
        Op::Clear(path) => {
            map.clear(path);
        }
        Op::Purge => {
            let purged = map.purge_empty_containers();
            tracing::info!(purged, "Purged empty containers");
        }
    }
    Ok(())
}

fn event_row(event: &Event) -> Vec<String> {
    let value = match (event.added(), event.value()) {
        (Some(added), _) => describe_added(added),
        (None, Some(value)) => value.to_string(),
        (None, None) => String::new(),
    };
    let deleted = match event.deleted().len() {
        0 => String::new(),
        n => n.to_string(),
    };
    vec![
        event.kind().to_string(),
        event.path().to_string(),
        value,
        deleted,
    ]
}

/// Run the replay command
pub fn run(
    args: &ReplayArgs,
    options: MapOptions,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let ops = parse_ops(args.ops.iter().map(String::as_str))?;
    let mut map = load_map(&args.file, options)?;

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    map.subscribe(EventKinds::ALL, move |event| {
        sink.borrow_mut().push(event.clone())
    });

    for op in ops {
        apply(&mut map, op)?;
    }

    let events = events.borrow();
    match format {
        OutputFormat::Human => {
            if events.is_empty() {
                println!("No events fired.");
            } else {
                let rows: Vec<Vec<String>> = events.iter().map(event_row).collect();
                print_table(&["EVENT", "PATH", "VALUE", "DELETED"], &rows);
            }
            println!();
            println!("Total values: {}", map.size());

            if args.show_entries {
                println!();
                let rows: Vec<Vec<String>> = map
                    .paths(true)
                    .filter_map(|path| {
                        let set = map.get_set(&path)?;
                        let node = nestmap::map::NodeRef::Set(set);
                        Some(vec![path.to_string(), describe_node(&node)])
                    })
                    .collect();
                print_table(&["PATH", "VALUES"], &rows);
            }
        }
        OutputFormat::Json => {
            for event in events.iter() {
                println!("{}", serde_json::to_string(event)?);
            }
            if args.show_entries {
                for (path, value) in map.leaves() {
                    let line = serde_json::json!({"path": path, "value": value});
                    println!("{}", serde_json::to_string(&line)?);
                }
            }
        }
    }

    Ok(())
}
