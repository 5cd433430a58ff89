//! Token-stream cleanup between the lexer and the parser: drops newlines
//! that can't separate statements, and fuses `is not` / `not in` into one
//! token.
//!
//! Grounded on the reference lexer's `preparse` function; see `DESIGN.md`.

use crate::lexer::Token;
use std::borrow::Cow;

struct Trie {
    next: &'static [(&'static str, bool)],
}

const ROOT_TRIE: Trie = Trie {
    next: &[("is", false), ("not", false)],
};
const IS_TRIE: Trie = Trie {
    next: &[("not", true)],
};
const NOT_TRIE: Trie = Trie {
    next: &[("in", true)],
};

fn step(trie: &'static Trie, tok: &str) -> Option<(&'static Trie, bool)> {
    trie.next.iter().find(|(t, _)| *t == tok).map(|&(t, done)| {
        (
            match t {
                "is" => &IS_TRIE,
                "not" if done => &ROOT_TRIE, // unreachable; done handled by caller
                "not" => &NOT_TRIE,
                _ => &ROOT_TRIE,
            },
            done,
        )
    })
}

/// Produces a stream of tokens ready for `parse`, given a stream of lexer
/// tokens.
pub fn preparse<'src, I>(tokens: I) -> impl Iterator<Item = Token<'src>>
where
    I: Iterator<Item = Token<'src>>,
{
    Preparse {
        inner: tokens,
        last_tok: None,
        delayed: Vec::new(),
        trie: &ROOT_TRIE,
        out: std::collections::VecDeque::new(),
        inner_done: false,
    }
}

struct Preparse<'src, I> {
    inner: I,
    last_tok: Option<String>,
    delayed: Vec<Token<'src>>,
    trie: &'static Trie,
    out: std::collections::VecDeque<Token<'src>>,
    inner_done: bool,
}

impl<'src, I> Preparse<'src, I> {
    fn pop_out(&mut self) -> Option<Token<'src>> {
        let tok = self.out.pop_front()?;
        self.last_tok = Some(tok.text().to_string());
        Some(tok)
    }
}

impl<'src, I> Iterator for Preparse<'src, I>
where
    I: Iterator<Item = Token<'src>>,
{
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        loop {
            if let Some(tok) = self.pop_out() {
                return Some(tok);
            }
            if self.inner_done {
                return None;
            }

            let Some(token) = self.inner.next() else {
                self.inner_done = true;
                self.out.extend(self.delayed.drain(..));
                continue;
            };

            if token.text() == "\n"
                && matches!(
                    self.last_tok.as_deref(),
                    None | Some("\n") | Some(Token::INDENT_TEXT) | Some(":")
                )
            {
                continue;
            }

            if let Some((next_trie, done)) = step(self.trie, token.text()) {
                self.trie = next_trie;
                self.delayed.push(token);
                if done {
                    let left = self.delayed.iter().map(|t| t.left).min().unwrap();
                    let right = self.delayed.iter().map(|t| t.right).max().unwrap();
                    let text = self
                        .delayed
                        .drain(..)
                        .map(|t| t.text().to_string())
                        .collect::<Vec<_>>()
                        .join(" ");
                    self.trie = &ROOT_TRIE;
                    self.out.push_back(Token {
                        text: Cow::Owned(text),
                        left,
                        right,
                        special: false,
                    });
                }
                continue;
            }

            if !self.delayed.is_empty() {
                self.out.extend(self.delayed.drain(..));
                self.trie = &ROOT_TRIE;
            }
            self.out.push_back(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn texts(src: &str) -> Vec<String> {
        preparse(lex(src)).map(|t| t.text().to_string()).collect()
    }

    #[test]
    fn fuses_is_not() {
        assert_eq!(texts("x is not y\n"), vec!["x", "is not", "y", "\n"]);
    }

    #[test]
    fn fuses_not_in() {
        assert_eq!(texts("x not in y\n"), vec!["x", "not in", "y", "\n"]);
    }

    #[test]
    fn leaves_bare_is_and_not_alone() {
        assert_eq!(texts("x is y\n"), vec!["x", "is", "y", "\n"]);
        assert_eq!(texts("not x\n"), vec!["not", "x", "\n"]);
    }

    #[test]
    fn suppresses_newline_after_colon() {
        let toks = texts("if x:\n    pass\n");
        // The newline right after ':' is swallowed; INDENT follows directly.
        let colon_idx = toks.iter().position(|t| t == ":").unwrap();
        assert_eq!(toks[colon_idx + 1], Token::INDENT_TEXT);
    }

    #[test]
    fn suppresses_leading_newline_at_start_of_input() {
        let toks = texts("\n\nx\n");
        assert_eq!(toks, vec!["x", "\n"]);
    }
}
