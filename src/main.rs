use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use colored::Colorize;
use oplex::{InnerNode, Node};
use std::io::Read;
use std::process;

#[derive(ClapParser)]
#[command(
    name = "oplex",
    about = "Lexes and parses an indentation-sensitive, bracket-delimited dynamic language",
    version,
    long_about = "Reads source text from stdin, tokenizes and parses it with an \
                  operator-precedence grammar, and prints the resulting parse tree as JSON.\n\n\
                  The parser never rejects input: malformed or partial source still produces \
                  a tree, built from whatever follower/bracket/precedence relations apply."
)]
struct Cli {
    /// Pretty-print the JSON output instead of emitting it compactly.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {e:#}", "error".red().bold());
        process::exit(2);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("failed to read source from stdin")?;

    let tree = oplex::parse_source(&source);
    let value = node_to_json(&tree);

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .expect("serde_json::Value is always serialisable");

    println!("{rendered}");
    Ok(())
}

/// `InnerNode`s become JSON arrays of their children; `Token`s become their
/// text.
fn node_to_json(node: &Node) -> serde_json::Value {
    match node {
        Node::Token(t) => serde_json::Value::String(t.text().to_string()),
        Node::Inner(InnerNode { children, .. }) => {
            serde_json::Value::Array(children.iter().map(node_to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bare_atom_as_string() {
        let tree = oplex::parse_source("x\n");
        let value = node_to_json(&tree);
        assert!(value.is_array());
    }
}
