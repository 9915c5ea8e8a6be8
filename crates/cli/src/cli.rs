use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect and reorganise a JSON-encoded priority bucket map.
///
/// Elements are arbitrary JSON values. Mutating commands write the result
/// back to FILE unless `--out` is given.
#[derive(Parser, Debug)]
#[command(name = "prio-cli", about = "Inspect and edit priority bucket maps")]
pub struct CliArgs {
    /// JSON file holding the map (`{"buckets": {"<priority>": [..]}}`)
    pub file: PathBuf,

    /// Write the result here instead of overwriting FILE
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print counts and bucket statistics
    Stats,
    /// Print every bucket in priority order
    Show,
    /// Pop elements highest priority first and print them
    Drain,
    /// Append a value to a bucket
    Add {
        #[arg(long, allow_hyphen_values = true)]
        priority: i32,
        /// Value as JSON (bare words are taken as strings)
        #[arg(long)]
        value: String,
        /// Skip the value if an equal one is already in the bucket
        #[arg(long)]
        unique: bool,
    },
    /// Remove every occurrence of a value
    Remove {
        #[arg(long)]
        value: String,
    },
    /// Move one bucket onto the back of another
    Move {
        #[arg(long, allow_hyphen_values = true)]
        from: i32,
        #[arg(long, allow_hyphen_values = true)]
        to: i32,
    },
    /// Merge several buckets into one, in the listed order
    Merge {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        sources: Vec<i32>,
        #[arg(long, allow_hyphen_values = true)]
        into: i32,
    },
    /// Drop a whole bucket
    ClearPriority {
        #[arg(long, allow_hyphen_values = true)]
        priority: i32,
    },
    /// Reverse element order inside every bucket
    Reverse,
}

impl Command {
    /// Whether the command changes the map and needs writing back.
    pub fn mutates(&self) -> bool {
        !matches!(self, Command::Stats | Command::Show)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_merge_sources() {
        let args = CliArgs::parse_from([
            "prio-cli", "map.json", "merge", "--sources", "1,-2,3", "--into", "7",
        ]);
        assert_eq!(
            args.command,
            Command::Merge { sources: vec![1, -2, 3], into: 7 }
        );
        assert!(args.out.is_none());
    }

    #[test]
    fn parse_add_with_out() {
        let args = CliArgs::parse_from([
            "prio-cli", "map.json", "--out", "next.json", "add", "--priority", "-4", "--value", "42",
            "--unique",
        ]);
        assert_eq!(args.out, Some(PathBuf::from("next.json")));
        assert!(matches!(
            args.command,
            Command::Add { priority: -4, unique: true, .. }
        ));
    }

    #[test]
    fn read_only_commands() {
        assert!(!Command::Stats.mutates());
        assert!(!Command::Show.mutates());
        assert!(Command::Reverse.mutates());
        assert!(Command::Drain.mutates());
    }
}
