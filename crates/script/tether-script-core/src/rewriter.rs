//! Source-to-source rewriting of binding expressions into function literals.
//!
//! A binding such as `x + 1` becomes `(function name() { return x + 1 })`, a block's
//! last statement gets the implicit `return`, and raw line breaks inside string
//! literals are escaped so the result is ordinary script.

use crate::ast::{Stmt, StmtKind};
use crate::error::ParseError;
use crate::lexer::{tokenize, TokenKind};
use crate::parser::{parse_program_at, parse_statement_at};

/// Text edit against the original source, in local offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Edit {
    at: usize,
    remove: usize,
    text: String,
}

#[derive(Default)]
struct EditList(Vec<Edit>);

impl EditList {
    fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.0.push(Edit {
            at,
            remove: 0,
            text: text.into(),
        });
    }

    fn replace(&mut self, at: usize, remove: usize, text: impl Into<String>) {
        self.0.push(Edit {
            at,
            remove,
            text: text.into(),
        });
    }

    /// Apply in offset order; edits at the same offset keep their insertion order.
    fn apply(mut self, source: &str) -> String {
        self.0.sort_by_key(|e| e.at);
        let mut out = String::with_capacity(source.len() + 32);
        let mut cursor = 0;
        for edit in self.0 {
            if edit.at > cursor {
                out.push_str(&source[cursor..edit.at]);
                cursor = edit.at;
            }
            out.push_str(&edit.text);
            cursor = cursor.max(edit.at + edit.remove);
        }
        if cursor < source.len() {
            out.push_str(&source[cursor..]);
        }
        out
    }
}

/// Rewrites one binding into a named, zero-argument function literal.
#[derive(Debug)]
pub struct RewriteBinding {
    name: String,
}

impl RewriteBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Rewrite `source`, whose first byte sits at offset `base` of the enclosing file.
    pub fn rewrite(&self, source: &str, base: usize) -> Result<String, ParseError> {
        let stmt = parse_statement_at(source, base).map_err(not_parseable)?;
        let mut visitor = ReturnInserter {
            base,
            in_loop: 0,
            edits: EditList::default(),
        };
        visitor.statement(&stmt);
        let mut edits = visitor.edits;
        escape_multiline_strings(source, base, &mut edits)?;
        let (start, end) = (stmt.span.start - base, stmt.span.end - base);
        // Earlier inserts at the same offset come first, so the wrapper precedes any `return `.
        let mut framed = EditList::default();
        framed.insert(start, format!("(function {}() {{ ", self.name));
        framed.0.append(&mut edits.0);
        framed.insert(end, " })");
        Ok(framed.apply(source))
    }
}

/// Rewrites a signal handler body: same framing and string escaping, no implicit returns.
#[derive(Debug)]
pub struct RewriteSignalHandler {
    name: String,
    params: Vec<String>,
}

impl RewriteSignalHandler {
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn rewrite(&self, source: &str, base: usize) -> Result<String, ParseError> {
        let body = parse_program_at(source, base).map_err(not_parseable)?;
        let start = body.first().map(|s| s.span.start - base).unwrap_or(0);
        let end = body.last().map(|s| s.span.end - base).unwrap_or(0);
        let mut edits = EditList::default();
        edits.insert(start, format!("(function {}({}) {{ ", self.name, self.params.join(", ")));
        escape_multiline_strings(source, base, &mut edits)?;
        edits.insert(end, " })");
        Ok(edits.apply(source))
    }
}

fn not_parseable(e: ParseError) -> ParseError {
    ParseError {
        message: format!("not parseable: {}", e.message),
        ..e
    }
}

struct ReturnInserter {
    base: usize,
    in_loop: usize,
    edits: EditList,
}

impl ReturnInserter {
    fn statement(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(_) => {
                if self.in_loop == 0 {
                    self.edits.insert(stmt.span.start - self.base, "return ");
                }
            }
            StmtKind::Block(body) => {
                if let Some(last) = body.last() {
                    self.statement(last);
                }
            }
            StmtKind::If {
                consequent,
                alternate,
                ..
            } => {
                self.statement(consequent);
                if let Some(alt) = alternate {
                    self.statement(alt);
                }
            }
            StmtKind::For { body, .. }
            | StmtKind::ForIn { body, .. }
            | StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. } => {
                self.in_loop += 1;
                self.statement(body);
                self.in_loop -= 1;
            }
            StmtKind::Switch { cases, .. } => {
                let last = cases.len().saturating_sub(1);
                for (i, case) in cases.iter().enumerate() {
                    self.clause(&case.body, i == last);
                }
            }
            _ => {}
        }
    }

    /// A statement directly followed by `break` yields the switch's value; so does the
    /// final statement of the final clause.
    fn clause(&mut self, body: &[Stmt], rewrite_last: bool) {
        for (i, stmt) in body.iter().enumerate() {
            let next = body.get(i + 1);
            let before_break = matches!(next.map(|s| &s.kind), Some(StmtKind::Break));
            if before_break || (next.is_none() && rewrite_last) {
                self.statement(stmt);
                break;
            }
        }
    }
}

/// Replace raw line breaks inside string literals by their two-character escapes.
fn escape_multiline_strings(source: &str, base: usize, edits: &mut EditList) -> Result<(), ParseError> {
    for token in tokenize(source, base)? {
        let TokenKind::Str { multiline: true, .. } = token.kind else {
            continue;
        };
        let raw = &source[token.span.start..token.span.end];
        // `\r` alone is left as is; it is only escaped alongside a `\n`.
        if !raw.contains('\n') {
            continue;
        }
        let escaped = raw.replace('\n', "\\n").replace('\r', "\\r");
        edits.replace(token.span.start, raw.len(), escaped);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_same_offset_keep_order() {
        let mut edits = EditList::default();
        edits.insert(0, "A");
        edits.insert(0, "B");
        edits.replace(1, 1, "X");
        assert_eq!(edits.apply("abc"), "ABaXc");
    }
}
