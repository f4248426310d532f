//! CLI utilities shared by `covcmp-cli` subcommands: reading a request
//! from a file, inline argument, or stdin, and writing JSON output to a
//! file or stdout.

use crate::error::{ErrorContext, FoundationError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Reads input from a file, an inline string, or stdin, in that priority
/// order.
pub fn read_input<P: AsRef<Path>>(file: Option<P>, inline: Option<String>) -> Result<String> {
    if let Some(path) = file {
        let path = path.as_ref();
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    } else if let Some(content) = inline {
        Ok(content)
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("reading stdin")?;
        Ok(buffer)
    }
}

/// Reads and parses JSON from a file path.
pub fn read_json<T: DeserializeOwned>(path_str: &str) -> Result<T> {
    let content = fs::read_to_string(path_str).with_context(|| format!("reading {path_str}"))?;
    serde_json::from_str(&content).map_err(FoundationError::Serialization)
}

/// Writes content to a file, or to stdout if `path` is `None`.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(file_path) => {
            fs::write(file_path, content).with_context(|| format!("writing {}", file_path.display()))
        }
        None => io::stdout().write_all(content.as_bytes()).context("writing stdout"),
    }
}

/// Pretty-prints a value as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(FoundationError::Serialization)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_input_prefers_inline_over_stdin() {
        let result = read_input::<&str>(None, Some("hello".to_string())).unwrap();
        assert_eq!(result, "hello");
    }

    #[test]
    fn read_input_reads_file_when_given() {
        let dir = std::env::temp_dir();
        let path = dir.join("covcmp_cli_test_input.txt");
        fs::write(&path, "from file").unwrap();

        let result = read_input(Some(&path), None).unwrap();
        assert_eq!(result, "from file");

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn read_json_parses_file_contents() {
        let dir = std::env::temp_dir();
        let path = dir.join("covcmp_cli_test_input.json");
        fs::write(&path, r#"{"a": 1}"#).unwrap();

        let value: serde_json::Value = read_json(path.to_str().unwrap()).unwrap();
        assert_eq!(value["a"], 1);

        fs::remove_file(path).unwrap();
    }
}
