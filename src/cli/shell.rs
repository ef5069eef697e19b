//! Line commands for the interactive `shell` session.

use std::path::PathBuf;

/// Help text printed by `help`.
pub const SHELL_HELP: &str = "\
Commands:
  next                      show a random quote from the selected category
  add <text> | <category>   add a quote
  filter <category>         select a category (\"all\" resets)
  categories                list categories
  list                      list quotes in the selected category
  last                      show the last displayed quote
  status                    show store and sync status
  sync                      sync with the remote now
  export [path]             write quotes.json (or the given path)
  import <path>             import quotes from a JSON file
  help                      show this help
  quit                      leave the shell";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Next,
    Add { text: String, category: String },
    Filter(String),
    Categories,
    List,
    Last,
    Status,
    Sync,
    Export(Option<PathBuf>),
    Import(PathBuf),
    Help,
    Quit,
}

/// Parse a shell line. Errors are user-facing messages.
pub fn parse_shell_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let command = match word.to_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "next" | "n" | "show" => ShellCommand::Next,
        "add" => {
            let (text, category) = rest
                .split_once('|')
                .ok_or_else(|| "Usage: add <text> | <category>".to_string())?;
            ShellCommand::Add {
                text: text.to_string(),
                category: category.to_string(),
            }
        }
        "filter" => {
            if rest.is_empty() {
                return Err("Usage: filter <category>".into());
            }
            ShellCommand::Filter(rest.to_string())
        }
        "categories" | "cats" => ShellCommand::Categories,
        "list" | "ls" => ShellCommand::List,
        "last" => ShellCommand::Last,
        "status" => ShellCommand::Status,
        "sync" => ShellCommand::Sync,
        "export" => ShellCommand::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "import" => {
            if rest.is_empty() {
                return Err("Usage: import <path>".into());
            }
            ShellCommand::Import(PathBuf::from(rest))
        }
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("Unknown command: {other}. Type 'help'.")),
    };

    Ok(command)
}
