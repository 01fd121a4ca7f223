//! Command-line argument parsing.

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub const USAGE: &str = "\
Usage: lookupcache [--verbose] <command> [args...]

Commands:
  fetch <table>...                 Fetch tables and print their records
  create <table> <json>            Create a record, then print the reloaded table
  update <table> <id> <json>       Update a record, then print the reloaded table
  delete <table> <id>              Delete a record, then print the reloaded table
  status <table>...                Fetch tables and print cache ages and status
  login <username>                 Store an API token in the OS keychain
  logout <username>                Remove a stored API token

Options:
  -v, --verbose                    Print every applied action to stderr

Environment:
  LOOKUPCACHE_API_URL, LOOKUPCACHE_TOKEN, LOOKUPCACHE_TIMEOUT_SECS, RUST_LOG";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch { tables: Vec<String> },
    Create { table: String, record: Value },
    Update { table: String, id: String, record: Value },
    Delete { table: String, id: String },
    Status { tables: Vec<String> },
    Login { username: String },
    Logout { username: String },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    pub verbose: bool,
}

/// Parse arguments (without the program name).
pub fn parse(args: &[String]) -> Result<Invocation> {
    let mut verbose = false;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => {
                return Ok(Invocation {
                    command: Command::Help,
                    verbose,
                })
            }
            flag if flag.starts_with('-') && flag.len() > 1 => bail!("Unknown option: {}", flag),
            _ => positional.push(arg.as_str()),
        }
    }

    let Some((&name, rest)) = positional.split_first() else {
        return Ok(Invocation {
            command: Command::Help,
            verbose,
        });
    };

    let command = match (name, rest) {
        ("fetch", tables) if !tables.is_empty() => Command::Fetch {
            tables: owned(tables),
        },
        ("status", tables) if !tables.is_empty() => Command::Status {
            tables: owned(tables),
        },
        ("create", [table, record]) => Command::Create {
            table: table.to_string(),
            record: parse_record(record)?,
        },
        ("update", [table, id, record]) => Command::Update {
            table: table.to_string(),
            id: id.to_string(),
            record: parse_record(record)?,
        },
        ("delete", [table, id]) => Command::Delete {
            table: table.to_string(),
            id: id.to_string(),
        },
        ("login", [username]) => Command::Login {
            username: username.to_string(),
        },
        ("logout", [username]) => Command::Logout {
            username: username.to_string(),
        },
        ("help", _) => Command::Help,
        ("fetch" | "status" | "create" | "update" | "delete" | "login" | "logout", _) => {
            bail!("Wrong number of arguments for '{}'\n\n{}", name, USAGE)
        }
        _ => bail!("Unknown command: {}\n\n{}", name, USAGE),
    };

    Ok(Invocation { command, verbose })
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn parse_record(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Record is not valid JSON: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_fetch_many_tables() {
        let inv = parse(&args(&["fetch", "Country", "Gender"])).unwrap();
        assert_eq!(
            inv.command,
            Command::Fetch {
                tables: vec!["Country".to_string(), "Gender".to_string()]
            }
        );
        assert!(!inv.verbose);
    }

    #[test]
    fn test_parse_verbose_anywhere() {
        let inv = parse(&args(&["delete", "Country", "7", "--verbose"])).unwrap();
        assert!(inv.verbose);
        assert_eq!(
            inv.command,
            Command::Delete {
                table: "Country".to_string(),
                id: "7".to_string()
            }
        );
    }

    #[test]
    fn test_parse_update_record_json() {
        let inv = parse(&args(&["update", "Gender", "4", r#"{"name":"Other"}"#])).unwrap();
        assert_eq!(
            inv.command,
            Command::Update {
                table: "Gender".to_string(),
                id: "4".to_string(),
                record: json!({"name": "Other"}),
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        let err = parse(&args(&["create", "Gender", "{name"])).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_parse_arity_and_unknown() {
        assert!(parse(&args(&["fetch"])).is_err());
        assert!(parse(&args(&["delete", "Country"])).is_err());
        assert!(parse(&args(&["frobnicate"])).is_err());
        assert!(parse(&args(&["--bogus", "fetch", "x"])).is_err());
    }

    #[test]
    fn test_parse_empty_is_help() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
        assert_eq!(parse(&args(&["-h"])).unwrap().command, Command::Help);
    }
}
