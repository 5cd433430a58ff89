//! The operator-precedence parser: five dispositions tried per token in
//! strict priority order — follower attachment, close bracket,
//! postfix-then-infix, prefix, bare atom — each committing the operator
//! stack before the token is placed.
//!
//! Transcribed from the reference `parse()` function; see `DESIGN.md`.

use crate::lexer::Token;
use crate::ops::{self, NOT_AN_OPERATOR, OpKind, Operator, OperatorStackElement, ROOT_OPERATOR};

/// A node of the parse tree: either a source token or an inner node built
/// around an operator.
#[derive(Debug, Clone)]
pub enum Node<'src> {
    Token(Token<'src>),
    Inner(InnerNode<'src>),
}

impl<'src> Node<'src> {
    pub fn left(&self) -> u32 {
        match self {
            Node::Token(t) => t.left,
            Node::Inner(n) => n.left,
        }
    }

    pub fn right(&self) -> u32 {
        match self {
            Node::Token(t) => t.right,
            Node::Inner(n) => n.right,
        }
    }
}

/// An inner parse-tree node. Leaves are always tokens.
#[derive(Debug, Clone)]
pub struct InnerNode<'src> {
    pub op: &'static Operator,
    pub children: Vec<Node<'src>>,
    pub left: u32,
    pub right: u32,
}

fn index_of_token<'src>(children: &[Node<'src>], tok: &str, start: usize) -> Option<usize> {
    children
        .iter()
        .enumerate()
        .skip(start)
        .find_map(|(i, c)| match c {
            Node::Token(t) if t.text() == tok => Some(i),
            _ => None,
        })
}

struct Builder<'src> {
    stack: Vec<OperatorStackElement<'src>>,
}

impl<'src> Builder<'src> {
    fn new() -> Self {
        Builder {
            stack: vec![OperatorStackElement::new(&ROOT_OPERATOR)],
        }
    }

    fn commit_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            let el = self.stack.pop().unwrap();
            let parent = self.stack.last_mut().unwrap();
            Self::add_node_to(el, parent);
        }
    }

    fn add_node_to(el: OperatorStackElement<'src>, parent: &mut OperatorStackElement<'src>) {
        let (left, right) = (el.left.unwrap_or(0), el.right.unwrap_or(0));
        Self::update_position_metadata(parent, left, right);
        parent.node.push(Node::Inner(InnerNode {
            op: el.op,
            children: el.node,
            left,
            right,
        }));
    }

    fn add_token_to(token: Token<'src>, el: &mut OperatorStackElement<'src>) {
        let (left, right) = (token.left, token.right);
        el.node.push(Node::Token(token));
        Self::update_position_metadata(el, left, right);
    }

    fn update_position_metadata(el: &mut OperatorStackElement<'src>, left: u32, right: u32) {
        el.left = Some(el.left.map_or(left, |l| l.min(left)));
        el.right = Some(el.right.map_or(right, |r| r.max(right)));
    }

    /// Disposition 1: attach `token` as a follower of some operator still
    /// open on the stack (e.g. the `else` that follows an `if`'s `:`).
    fn try_follower(&mut self, token: &Token<'src>) -> Option<usize> {
        let follows = ops::followed_by(token.text());
        if follows.is_empty() {
            return None;
        }
        let mut i = self.stack.len();
        while i > 0 {
            i -= 1;
            let el = &self.stack[i];
            if follows.iter().any(|o| std::ptr::eq(*o, el.op)) {
                let mut tok_index: i64 = index_of_token(&el.node, el.op.tok, 0)
                    .map(|x| x as i64)
                    .unwrap_or(-1);
                let mut max_follower_seen: i64 = -1;
                for (fi, follower) in el.op.followers.iter().enumerate() {
                    let start = (tok_index + 1).max(0) as usize;
                    if let Some(ti) = index_of_token(&el.node, follower, start) {
                        max_follower_seen = fi as i64;
                        tok_index = ti as i64;
                    }
                }
                let search_from = (max_follower_seen + 1).max(0) as usize;
                let found = el
                    .op
                    .followers
                    .get(search_from..)
                    .is_some_and(|s| s.iter().any(|f| *f == token.text()));
                if found {
                    return Some(i);
                }
            }
            if ops::needs_close_bracket(el) {
                break;
            }
        }
        None
    }

    /// Disposition 2: `token` closes the innermost open bracket it matches.
    fn try_close_bracket(&self, token: &Token<'src>) -> Option<usize> {
        if !ops::is_close_bracket(token.text()) {
            return None;
        }
        let mut i = self.stack.len();
        while i > 0 {
            i -= 1;
            let el = &self.stack[i];
            if let Some(partner) = ops::bracket_pair(el.op.tok) {
                if partner == token.text() && ops::needs_close_bracket(el) {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Disposition 3: `token` is a postfix or infix operator binding an
    /// existing stack element as its left operand.
    fn try_infix_or_postfix(&mut self, token: &Token<'src>) -> Option<(usize, &'static Operator)> {
        for kind in [OpKind::Postfix, OpKind::Infix] {
            for op in ops::lookup_operators(token.text(), kind) {
                let candidate = OperatorStackElement::new(op);
                let mut left_depth = None;
                let mut i = self.stack.len();
                while i > 0 {
                    i -= 1;
                    if ops::needs_close_bracket(&self.stack[i]) {
                        break;
                    }
                    if ops::can_nest(&candidate, &self.stack[i])
                        && i > 0
                        && ops::can_nest(&self.stack[i - 1], &candidate)
                    {
                        left_depth = Some(i);
                    }
                }
                if let Some(depth) = left_depth {
                    return Some((depth, op));
                }
            }
        }
        None
    }

    /// Disposition 4: `token` is a prefix operator opening a new element.
    fn try_prefix(&mut self, token: &Token<'src>) -> Option<(usize, &'static Operator)> {
        for op in ops::lookup_operators(token.text(), OpKind::Prefix) {
            let candidate = OperatorStackElement::new(op);
            let mut i = self.stack.len();
            while i > 0 {
                i -= 1;
                let el = &self.stack[i];
                if el.op.kind != OpKind::Postfix && ops::can_nest(el, &candidate) {
                    return Some((i, op));
                }
            }
        }
        None
    }

    fn handle_token(&mut self, token: Token<'src>) {
        if let Some(i) = self.try_follower(&token) {
            self.commit_to(i + 1);
            Self::add_token_to(token, &mut self.stack[i]);
            return;
        }

        if let Some(i) = self.try_close_bracket(&token) {
            self.commit_to(i + 1);
            Self::add_token_to(token, &mut self.stack[i]);
            return;
        }

        if let Some((depth, op)) = self.try_infix_or_postfix(&token) {
            self.commit_to(depth + 1);
            let el = self.stack.pop().unwrap();
            let mut candidate = OperatorStackElement::new(op);
            Self::add_node_to(el, &mut candidate);
            Self::add_token_to(token, &mut candidate);
            self.stack.push(candidate);
            return;
        }

        if let Some((i, op)) = self.try_prefix(&token) {
            self.commit_to(i + 1);
            let mut candidate = OperatorStackElement::new(op);
            Self::add_token_to(token, &mut candidate);
            self.stack.push(candidate);
            return;
        }

        // Disposition 5: bare atom, possibly merged with an existing
        // adjacent bare-atom element at the top of the stack.
        let probe = OperatorStackElement::new(&NOT_AN_OPERATOR);
        let mut close_to = None;
        let mut i = self.stack.len();
        while i > 0 {
            i -= 1;
            let el = &self.stack[i];
            if el.op.kind != OpKind::Postfix && ops::can_nest(el, &probe) {
                break;
            }
            close_to = Some(i);
        }
        if let Some(depth) = close_to {
            self.commit_to(depth);
        }

        let top_is_bare_atom = std::ptr::eq(self.stack.last().unwrap().op, &NOT_AN_OPERATOR);
        if top_is_bare_atom {
            let top = self.stack.last_mut().unwrap();
            Self::add_token_to(token, top);
        } else {
            let mut candidate = OperatorStackElement::new(&NOT_AN_OPERATOR);
            Self::add_token_to(token, &mut candidate);
            self.stack.push(candidate);
        }
    }

    fn finish(mut self) -> Node<'src> {
        self.commit_to(1);
        let root = self.stack.pop().unwrap();
        if root.node.len() == 1 && matches!(root.node[0], Node::Inner(_)) {
            return root.node.into_iter().next().unwrap();
        }
        Node::Inner(InnerNode {
            op: &ROOT_OPERATOR,
            left: root.left.unwrap_or(0),
            right: root.right.unwrap_or(0),
            children: root.node,
        })
    }
}

/// Parses a stream of (already lexed and preparsed) tokens into a tree such
/// that the leaves in a prefix traversal reproduce the token sequence.
pub fn parse<'src, I>(tokens: I) -> Node<'src>
where
    I: Iterator<Item = Token<'src>>,
{
    let mut builder = Builder::new();
    for token in tokens {
        builder.handle_token(token);
    }
    builder.finish()
}
