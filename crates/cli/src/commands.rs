//! Command execution against an in-memory map.

use anyhow::Result;
use prio_buckets::PriorityBucketMap;
use serde_json::Value;
use tracing::info;

use crate::cli::Command;

pub type ValueMap = PriorityBucketMap<Value>;

/// Parse a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Apply `command` to `map`, returning the lines to print.
pub fn execute(map: &ValueMap, command: &Command) -> Result<Vec<String>> {
    let mut out = Vec::new();
    match command {
        Command::Stats => {
            let order = map
                .order()
                .kind()
                .map_or_else(|| "custom".to_string(), |kind| kind.to_string());
            out.push(format!("order:      {order}"));
            out.push(format!("elements:   {}", map.count()));
            out.push(format!("unique:     {}", map.unique_count()));
            out.push(format!("duplicates: {}", map.contains_duplicates()));
            if let (Some(min), Some(max)) = (map.min_bucket_size(), map.max_bucket_size()) {
                out.push(format!("bucket len: min={min} max={max}"));
            }
            for (priority, len) in map.priority_counts() {
                out.push(format!("  {priority:>6}: {len}"));
            }
        }
        Command::Show => {
            for (priority, items) in map.snapshot() {
                let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
                out.push(format!("{priority}: [{}]", rendered.join(", ")));
            }
        }
        Command::Drain => {
            while let Ok(item) = map.remove_highest() {
                out.push(item.to_string());
            }
        }
        Command::Add { priority, value, unique } => {
            let value = parse_value(value);
            if *unique {
                if !map.add_or_update(value, *priority) {
                    out.push(format!("already present at priority {priority}"));
                }
            } else {
                map.add(value, *priority);
            }
        }
        Command::Remove { value } => {
            let value = parse_value(value);
            if map.is_empty() || !map.remove_element(&value)? {
                out.push(format!("not found: {value}"));
            }
        }
        Command::Move { from, to } => map.move_priority(*from, *to),
        Command::Merge { sources, into } => map.merge_priorities(sources, *into),
        Command::ClearPriority { priority } => {
            if map.is_empty() || !map.clear_priority(*priority)? {
                out.push(format!("no bucket at priority {priority}"));
            }
        }
        Command::Reverse => map.reverse_order(),
    }
    info!(?command, remaining = map.count(), "Command applied");
    Ok(out)
}
