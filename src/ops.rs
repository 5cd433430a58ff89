//! Static operator table and the precedence relations used by the parser.
//!
//! The table, the lambda/comma exception, and the `can_nest` relation are
//! transcribed from the reference operator-precedence grammar; see
//! `DESIGN.md` for the mapping.

use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Prefix,
    Infix,
    Postfix,
    /// Reserved for the two sentinels below; never produced by `lookup_operators`.
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug)]
pub struct Operator {
    pub tok: &'static str,
    pub kind: OpKind,
    pub prec: i32,
    pub assoc: Option<Assoc>,
    pub followers: &'static [&'static str],
}

impl Operator {
    const fn new(tok: &'static str, kind: OpKind, prec: i32) -> Self {
        Operator {
            tok,
            kind,
            prec,
            assoc: if matches!(kind, OpKind::Infix) {
                Some(Assoc::Left)
            } else {
                None
            },
            followers: &[],
        }
    }

    const fn with_assoc(mut self, assoc: Assoc) -> Self {
        self.assoc = Some(assoc);
        self
    }

    const fn with_followers(mut self, followers: &'static [&'static str]) -> Self {
        self.followers = followers;
        self
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
impl Eq for Operator {}

/// A parse-tree node in the process of being built. See `parser.rs`.
pub struct OperatorStackElement<'src> {
    pub op: &'static Operator,
    pub node: Vec<crate::parser::Node<'src>>,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl<'src> OperatorStackElement<'src> {
    pub fn new(op: &'static Operator) -> Self {
        OperatorStackElement {
            op,
            node: Vec::new(),
            left: None,
            right: None,
        }
    }
}

pub const OPEN_BRACKETS: [&str; 4] = ["(", "[", "{", ">>>"];
pub const CLOSE_BRACKETS: [&str; 4] = [")", "]", "}", "<<<"];

pub fn is_open_bracket(s: &str) -> bool {
    matches!(s, "(" | "[" | "{" | ">>>")
}

pub fn is_close_bracket(s: &str) -> bool {
    matches!(s, ")" | "]" | "}" | "<<<")
}

pub fn bracket_pair(open: &str) -> Option<&'static str> {
    match open {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        ">>>" => Some("<<<"),
        _ => None,
    }
}

pub static ROOT_OPERATOR: Operator = Operator::new("", OpKind::Prefix, -100);
pub static NOT_AN_OPERATOR: Operator = Operator {
    tok: "",
    kind: OpKind::Token,
    prec: 100,
    assoc: None,
    followers: &[],
};

macro_rules! op {
    ($tok:expr, $kind:expr, $prec:expr) => {
        Operator::new($tok, $kind, $prec)
    };
    ($tok:expr, $kind:expr, $prec:expr, assoc = $assoc:expr) => {
        Operator::new($tok, $kind, $prec).with_assoc($assoc)
    };
    ($tok:expr, $kind:expr, $prec:expr, followers = $followers:expr) => {
        Operator::new($tok, $kind, $prec).with_followers($followers)
    };
}

pub static OPERATORS: LazyLock<Vec<Operator>> = LazyLock::new(|| {
    vec![
        op!("else", OpKind::Infix, -4, assoc = Assoc::Right),
        op!("elif", OpKind::Infix, -4, assoc = Assoc::Right),
        op!("except", OpKind::Infix, -4, assoc = Assoc::Right),
        op!("finally", OpKind::Infix, -4, assoc = Assoc::Right),
        op!(">>>", OpKind::Infix, -3, assoc = Assoc::Right),
        op!("def", OpKind::Prefix, -2),
        op!("for", OpKind::Prefix, -2),
        op!("if", OpKind::Prefix, -2),
        op!("assert", OpKind::Prefix, -2),
        op!("return", OpKind::Prefix, -2),
        op!("while", OpKind::Prefix, -2),
        op!("yield", OpKind::Prefix, -2),
        op!("\n", OpKind::Postfix, -2),
        op!(":", OpKind::Infix, -1, assoc = Assoc::Right),
        op!(":", OpKind::Prefix, -1),
        op!(",", OpKind::Infix, 0, assoc = Assoc::Right),
        op!("for", OpKind::Infix, 1, followers = &["in"]),
        op!("=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("+=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("-=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("*=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("/=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("//=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("%=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("@=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("&=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("|=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("^=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!(">>=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("<<=", OpKind::Infix, 1, assoc = Assoc::Right),
        op!("**=", OpKind::Infix, 1, assoc = Assoc::Right),
        // Special-cased in `open_bracket_count`/`can_nest`: lambda can contain
        // commas that separate formals, so it stays "open" until a `:` child
        // is seen.
        op!("lambda", OpKind::Prefix, 2, followers = &[":"]),
        op!("if", OpKind::Infix, 3, followers = &["else"]),
        op!("or", OpKind::Infix, 4),
        op!("and", OpKind::Infix, 5),
        op!("not", OpKind::Prefix, 6),
        op!("in", OpKind::Infix, 7),
        op!("is", OpKind::Infix, 7),
        op!("not in", OpKind::Infix, 7),
        op!("is not", OpKind::Infix, 7),
        op!("<", OpKind::Infix, 7),
        op!("<=", OpKind::Infix, 7),
        op!(">", OpKind::Infix, 7),
        op!(">=", OpKind::Infix, 7),
        op!("==", OpKind::Infix, 7),
        op!("!=", OpKind::Infix, 7),
        op!("|", OpKind::Infix, 8),
        op!("^", OpKind::Infix, 9),
        op!("&", OpKind::Infix, 10),
        op!("<<", OpKind::Infix, 11),
        op!(">>", OpKind::Infix, 11),
        op!("+", OpKind::Infix, 12),
        op!("-", OpKind::Infix, 12),
        op!("*", OpKind::Infix, 13),
        op!("@", OpKind::Infix, 13),
        op!("/", OpKind::Infix, 13),
        op!("//", OpKind::Infix, 13),
        op!("%", OpKind::Infix, 13),
        op!("+", OpKind::Prefix, 14),
        op!("-", OpKind::Prefix, 14),
        op!("~", OpKind::Prefix, 14),
        op!("**", OpKind::Infix, 15),
        op!("await", OpKind::Prefix, 16),
        op!("[", OpKind::Infix, 17),
        op!("(", OpKind::Infix, 17),
        op!(".", OpKind::Infix, 17),
        op!("[", OpKind::Prefix, 18),
        op!("(", OpKind::Prefix, 18),
        op!("{", OpKind::Prefix, 18),
    ]
});

static GROUPED_OPERATORS: LazyLock<HashMap<(&'static str, OpKind), Vec<&'static Operator>>> =
    LazyLock::new(|| {
        let mut map: HashMap<(&'static str, OpKind), Vec<&'static Operator>> = HashMap::new();
        for operator in OPERATORS.iter() {
            map.entry((operator.tok, operator.kind))
                .or_default()
                .push(operator);
        }
        map
    });

static FOLLOWER_MAP: LazyLock<HashMap<&'static str, Vec<&'static Operator>>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, Vec<&'static Operator>> = HashMap::new();
    for operator in OPERATORS.iter() {
        for follower in operator.followers {
            let bucket = map.entry(*follower).or_default();
            if !bucket.iter().any(|o| std::ptr::eq(*o, operator)) {
                bucket.push(operator);
            }
        }
    }
    map
});

/// A list of operators with the given token text and kind.
pub fn lookup_operators(tok: &str, kind: OpKind) -> &'static [&'static Operator] {
    static EMPTY: &[&Operator] = &[];
    GROUPED_OPERATORS
        .iter()
        .find(|((t, k), _)| *t == tok && *k == kind)
        .map(|(_, v)| v.as_slice())
        .unwrap_or(EMPTY)
}

/// A maximal set of operators `o` such that `tok` is in `o.followers`.
pub fn followed_by(tok: &str) -> &'static [&'static Operator] {
    static EMPTY: &[&Operator] = &[];
    FOLLOWER_MAP
        .get(tok)
        .map(|v| v.as_slice())
        .unwrap_or(EMPTY)
}

/// True for stack elements that consist solely of a zero-argument operator.
/// This language has none, so this always returns false (kept as its own
/// function since the parser's disposition loop calls it by name).
pub fn is_nullary(_stack_el: &OperatorStackElement) -> bool {
    false
}

/// The count of open brackets minus the count of close brackets among a
/// stack element's children so far, with the `lambda` special case: a
/// lambda stays open (count 1) until a `:` child has been seen.
pub fn open_bracket_count(stack_el: &OperatorStackElement) -> i32 {
    if stack_el.op.tok == "lambda" {
        for child in &stack_el.node {
            if let crate::parser::Node::Token(t) = child {
                if t.text.as_ref() == ":" {
                    return 0;
                }
            }
        }
        return 1;
    }
    if !OPEN_BRACKETS.contains(&stack_el.op.tok) {
        return 0;
    }
    let mut count = 0i32;
    for child in &stack_el.node {
        if let crate::parser::Node::Token(t) = child {
            if is_close_bracket(t.text.as_ref()) {
                count -= 1;
            } else if is_open_bracket(t.text.as_ref()) {
                count += 1;
            }
        }
    }
    count
}

/// A node "needs" a close bracket if it has an open bracket like `(`
/// without a corresponding `)`. Extra closes (`()` )`) do not count.
pub fn needs_close_bracket(stack_el: &OperatorStackElement) -> bool {
    open_bracket_count(stack_el) > 0
}

/// True iff the operator stack element `inner` can nest inside `outer`.
pub fn can_nest(outer: &OperatorStackElement, inner: &OperatorStackElement) -> bool {
    if outer.op.tok == "lambda" && open_bracket_count(outer) > 0 && inner.op.tok == "," {
        return true;
    }
    if std::ptr::eq(inner.op, &ROOT_OPERATOR) {
        return false;
    }
    if OPEN_BRACKETS.contains(&outer.op.tok) && !outer.node.is_empty() {
        return needs_close_bracket(outer);
    }
    if outer.op.prec < inner.op.prec {
        return true;
    }
    if outer.op.prec == inner.op.prec
        && (outer.op.assoc != Some(Assoc::Right)
            || (inner.op.kind == OpKind::Infix && inner.node.is_empty()))
    {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_infix_plus() {
        let ops = lookup_operators("+", OpKind::Infix);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].prec, 12);
    }

    #[test]
    fn lookup_finds_both_prefix_and_infix_minus() {
        assert_eq!(lookup_operators("-", OpKind::Prefix).len(), 1);
        assert_eq!(lookup_operators("-", OpKind::Infix).len(), 1);
    }

    #[test]
    fn unknown_token_has_no_operators() {
        assert!(lookup_operators("%%%", OpKind::Infix).is_empty());
    }

    #[test]
    fn lambda_follower_is_colon() {
        let followers = followed_by(":");
        assert!(followers.iter().any(|o| o.tok == "lambda"));
    }

    #[test]
    fn bracket_pairs_resolve() {
        assert_eq!(bracket_pair("("), Some(")"));
        assert_eq!(bracket_pair(">>>"), Some("<<<"));
        assert_eq!(bracket_pair("x"), None);
    }
}
