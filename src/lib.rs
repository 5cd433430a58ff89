//! Zero-copy lexer and operator-precedence parser for an
//! indentation-sensitive, bracket-delimited dynamic language.
//!
//! ```
//! let tree = oplex::parse_source("if x:\n    y\n");
//! assert!(matches!(tree, oplex::Node::Inner(_)));
//! ```

pub mod lexer;
pub mod ops;
pub mod parser;
pub mod preparser;

pub use lexer::{Lexer, Token, lex};
pub use ops::{Assoc, OpKind, Operator};
pub use parser::{InnerNode, Node, parse};
pub use preparser::preparse;

/// Lexes, preparses, and parses a complete source text in one call.
pub fn parse_source(source: &str) -> Node<'_> {
    parse(preparse(lex(source)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_composes_the_pipeline() {
        let tree = parse_source("x = 1\n");
        match tree {
            Node::Inner(n) => assert!(!n.children.is_empty()),
            Node::Token(_) => panic!("expected an inner node for an assignment"),
        }
    }
}
