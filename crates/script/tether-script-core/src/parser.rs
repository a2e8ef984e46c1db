//! Recursive-descent parser for the binding dialect.

use std::sync::Arc;

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};

const RESERVED: &[&str] = &[
    "break", "case", "const", "continue", "default", "do", "else", "for", "function", "if", "in",
    "let", "new", "return", "switch", "throw", "typeof", "var", "void", "while",
];

/// Statements and sub-expressions may nest this deep before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parse exactly one statement (a trailing `;` belongs to it).
pub fn parse_statement(source: &str) -> Result<Stmt, ParseError> {
    parse_statement_at(source, 0)
}

/// Like [`parse_statement`], with every span shifted by `base`.
pub fn parse_statement_at(source: &str, base: usize) -> Result<Stmt, ParseError> {
    let mut parser = Parser::new(source, base)?;
    let stmt = parser.statement()?;
    if !parser.at_eof() {
        return Err(parser.error_here("unexpected token after statement"));
    }
    Ok(stmt)
}

/// Parse a sequence of statements up to the end of input.
pub fn parse_program_at(source: &str, base: usize) -> Result<Vec<Stmt>, ParseError> {
    let mut parser = Parser::new(source, base)?;
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(body)
}

struct Parser<'a> {
    source: &'a str,
    base: usize,
    tokens: Vec<Token>,
    pos: usize,
    /// Local end offset of the most recently consumed token.
    prev_end: usize,
    depth: usize,
}

type PResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    fn new(source: &'a str, base: usize) -> PResult<Self> {
        Ok(Self {
            source,
            base,
            tokens: tokenize(source, base)?,
            pos: 0,
            prev_end: 0,
            depth: 0,
        })
    }

    fn cur(&self) -> &Token {
        // The token stream always ends with Eof and the parser never steps past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        matches!(self.cur().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.cur().clone();
        if !matches!(tok.kind, TokenKind::Eof) {
            self.pos += 1;
            self.prev_end = tok.span.end;
        }
        tok
    }

    fn start(&self) -> usize {
        self.cur().span.start
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.base + start, self.base + self.prev_end)
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, self.cur().span.start, self.base, message)
    }

    /// Run one level of recursive descent, refusing input nested past the limit.
    fn nested<T>(&mut self, f: fn(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_here("nesting too deep"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn eat(&mut self, p: &str) -> bool {
        if self.cur().is_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, k: &str) -> bool {
        if self.cur().is_ident(k) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, p: &str) -> PResult<()> {
        if self.eat(p) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected '{p}'")))
        }
    }

    fn identifier(&mut self) -> PResult<String> {
        match &self.cur().kind {
            TokenKind::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here("expected identifier")),
        }
    }

    /// Statement terminator with automatic insertion before `}`, end of input or a line break.
    fn semicolon(&mut self) -> PResult<()> {
        if self.eat(";") {
            return Ok(());
        }
        let tok = self.cur();
        if tok.is_punct("}") || matches!(tok.kind, TokenKind::Eof) || tok.newline_before {
            Ok(())
        } else {
            Err(self.error_here("expected ';'"))
        }
    }

    fn statement(&mut self) -> PResult<Stmt> {
        let start = self.start();
        let kind = self.nested(Self::statement_kind)?;
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    fn statement_kind(&mut self) -> PResult<StmtKind> {
        let tok = self.cur().clone();
        match &tok.kind {
            TokenKind::Punct("{") => Ok(StmtKind::Block(self.block()?)),
            TokenKind::Punct(";") => {
                self.advance();
                Ok(StmtKind::Empty)
            }
            TokenKind::Ident(word) => match word.as_str() {
                "var" | "let" | "const" => {
                    let kind = self.decl_kind();
                    let decls = self.declarators()?;
                    self.semicolon()?;
                    Ok(StmtKind::Var(kind, decls))
                }
                "function" if matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Ident(_))) => {
                    Ok(StmtKind::Function(self.function()?))
                }
                "if" => {
                    self.advance();
                    self.expect("(")?;
                    let test = self.expression()?;
                    self.expect(")")?;
                    let consequent = Box::new(self.statement()?);
                    let alternate = if self.eat_keyword("else") {
                        Some(Box::new(self.statement()?))
                    } else {
                        None
                    };
                    Ok(StmtKind::If {
                        test,
                        consequent,
                        alternate,
                    })
                }
                "for" => self.for_statement(),
                "while" => {
                    self.advance();
                    self.expect("(")?;
                    let test = self.expression()?;
                    self.expect(")")?;
                    let body = Box::new(self.statement()?);
                    Ok(StmtKind::While { test, body })
                }
                "do" => {
                    self.advance();
                    let body = Box::new(self.statement()?);
                    if !self.eat_keyword("while") {
                        return Err(self.error_here("expected 'while'"));
                    }
                    self.expect("(")?;
                    let test = self.expression()?;
                    self.expect(")")?;
                    self.eat(";");
                    Ok(StmtKind::DoWhile { body, test })
                }
                "switch" => self.switch_statement(),
                "break" => {
                    self.advance();
                    self.semicolon()?;
                    Ok(StmtKind::Break)
                }
                "continue" => {
                    self.advance();
                    self.semicolon()?;
                    Ok(StmtKind::Continue)
                }
                "return" => {
                    self.advance();
                    let next = self.cur();
                    let bare = next.is_punct(";")
                        || next.is_punct("}")
                        || matches!(next.kind, TokenKind::Eof)
                        || next.newline_before;
                    let value = if bare { None } else { Some(self.expression()?) };
                    self.semicolon()?;
                    Ok(StmtKind::Return(value))
                }
                "throw" => {
                    self.advance();
                    let value = self.expression()?;
                    self.semicolon()?;
                    Ok(StmtKind::Throw(value))
                }
                _ => self.expression_statement(),
            },
            _ => self.expression_statement(),
        }
    }

    fn expression_statement(&mut self) -> PResult<StmtKind> {
        let expr = self.expression()?;
        self.semicolon()?;
        Ok(StmtKind::Expr(expr))
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect("{")?;
        let mut body = Vec::new();
        while !self.cur().is_punct("}") {
            if self.at_eof() {
                return Err(self.error_here("expected '}'"));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn decl_kind(&mut self) -> DeclKind {
        let kind = match &self.cur().kind {
            TokenKind::Ident(k) if k == "let" => DeclKind::Let,
            TokenKind::Ident(k) if k == "const" => DeclKind::Const,
            _ => DeclKind::Var,
        };
        self.advance();
        kind
    }

    fn declarators(&mut self) -> PResult<Vec<Declarator>> {
        let mut decls = Vec::new();
        loop {
            let name = self.identifier()?;
            decls.push(self.declarator_rest(name)?);
            if !self.eat(",") {
                return Ok(decls);
            }
        }
    }

    fn declarator_rest(&mut self, name: String) -> PResult<Declarator> {
        let init = if self.eat("=") {
            Some(self.assignment()?)
        } else {
            None
        };
        Ok(Declarator { name, init })
    }

    fn for_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.expect("(")?;
        let mut init = None;
        if matches!(&self.cur().kind, TokenKind::Ident(k) if k == "var" || k == "let" || k == "const") {
            let kind = self.decl_kind();
            let name = self.identifier()?;
            if let Some(of) = self.for_in_keyword() {
                return self.for_in_rest(Some(kind), name, of);
            }
            let mut decls = vec![self.declarator_rest(name)?];
            while self.eat(",") {
                let name = self.identifier()?;
                decls.push(self.declarator_rest(name)?);
            }
            init = Some(ForInit::Decl(kind, decls));
        } else if !self.cur().is_punct(";") {
            let expr = self.expression()?;
            if let Some(of) = self.for_in_keyword() {
                return match expr.kind {
                    ExprKind::Ident(name) => self.for_in_rest(None, name, of),
                    _ => Err(self.error_here("invalid for-in target")),
                };
            }
            init = Some(ForInit::Expr(expr));
        }
        self.expect(";")?;
        let test = if self.cur().is_punct(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;
        let update = if self.cur().is_punct(")") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(")")?;
        let body = Box::new(self.statement()?);
        Ok(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn for_in_keyword(&mut self) -> Option<bool> {
        if self.eat_keyword("in") {
            Some(false)
        } else if self.eat_keyword("of") {
            Some(true)
        } else {
            None
        }
    }

    fn for_in_rest(&mut self, decl: Option<DeclKind>, name: String, of: bool) -> PResult<StmtKind> {
        let object = self.expression()?;
        self.expect(")")?;
        let body = Box::new(self.statement()?);
        Ok(StmtKind::ForIn {
            decl,
            name,
            object,
            body,
            of,
        })
    }

    fn switch_statement(&mut self) -> PResult<StmtKind> {
        self.advance();
        self.expect("(")?;
        let discriminant = self.expression()?;
        self.expect(")")?;
        self.expect("{")?;
        let mut cases = Vec::new();
        while !self.eat("}") {
            let start = self.start();
            let test = if self.eat_keyword("case") {
                Some(self.expression()?)
            } else if self.eat_keyword("default") {
                None
            } else {
                return Err(self.error_here("expected 'case' or 'default'"));
            };
            self.expect(":")?;
            let mut body = Vec::new();
            while !(self.cur().is_ident("case") || self.cur().is_ident("default") || self.cur().is_punct("}")) {
                if self.at_eof() {
                    return Err(self.error_here("expected '}'"));
                }
                body.push(self.statement()?);
            }
            cases.push(SwitchCase {
                test,
                body,
                span: self.span_from(start),
            });
        }
        Ok(StmtKind::Switch {
            discriminant,
            cases,
        })
    }

    fn function(&mut self) -> PResult<Arc<FunctionDef>> {
        let start = self.start();
        self.advance();
        let name = match &self.cur().kind {
            TokenKind::Ident(_) => Some(self.identifier()?),
            _ => None,
        };
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.eat(")") {
            loop {
                params.push(self.identifier()?);
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        let body = self.block()?;
        Ok(Arc::new(FunctionDef {
            name,
            params,
            body,
            span: self.span_from(start),
        }))
    }

    // ---- expressions ----

    fn node(&self, start: usize, kind: ExprKind) -> Expr {
        Expr {
            kind,
            span: self.span_from(start),
        }
    }

    pub(crate) fn expression(&mut self) -> PResult<Expr> {
        let start = self.start();
        let first = self.assignment()?;
        if !self.cur().is_punct(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(",") {
            items.push(self.assignment()?);
        }
        Ok(self.node(start, ExprKind::Sequence(items)))
    }

    fn assignment(&mut self) -> PResult<Expr> {
        self.nested(Self::assignment_expr)
    }

    fn assignment_expr(&mut self) -> PResult<Expr> {
        let start = self.start();
        let target = self.conditional()?;
        let op = match &self.cur().kind {
            TokenKind::Punct("=") => None,
            TokenKind::Punct("+=") => Some(BinaryOp::Add),
            TokenKind::Punct("-=") => Some(BinaryOp::Sub),
            TokenKind::Punct("*=") => Some(BinaryOp::Mul),
            TokenKind::Punct("/=") => Some(BinaryOp::Div),
            TokenKind::Punct("%=") => Some(BinaryOp::Rem),
            _ => return Ok(target),
        };
        if !matches!(
            target.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        ) {
            return Err(self.error_here("invalid assignment target"));
        }
        self.advance();
        let value = self.assignment()?;
        Ok(self.node(
            start,
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
        ))
    }

    fn conditional(&mut self) -> PResult<Expr> {
        let start = self.start();
        let test = self.logical_or()?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.assignment()?;
        self.expect(":")?;
        let alternate = self.assignment()?;
        Ok(self.node(
            start,
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
        ))
    }

    fn logical_or(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut left = self.logical_and()?;
        while self.eat("||") {
            let right = self.logical_and()?;
            left = self.node(
                start,
                ExprKind::Logical {
                    op: LogicalOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut left = self.equality()?;
        while self.eat("&&") {
            let right = self.equality()?;
            left = self.node(
                start,
                ExprKind::Logical {
                    op: LogicalOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn binary_level(
        &mut self,
        table: &[(&str, BinaryOp)],
        next: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        let start = self.start();
        let mut left = next(self)?;
        'outer: loop {
            for (p, op) in table {
                if self.eat(p) {
                    let right = next(self)?;
                    left = self.node(
                        start,
                        ExprKind::Binary {
                            op: *op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                    );
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn equality(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[
                ("===", BinaryOp::StrictEq),
                ("!==", BinaryOp::StrictNotEq),
                ("==", BinaryOp::Eq),
                ("!=", BinaryOp::NotEq),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> PResult<Expr> {
        self.binary_level(&[("+", BinaryOp::Add), ("-", BinaryOp::Sub)], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[("*", BinaryOp::Mul), ("/", BinaryOp::Div), ("%", BinaryOp::Rem)],
            Self::unary,
        )
    }

    fn unary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let op = match &self.cur().kind {
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("-") => Some(UnaryOp::Minus),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Ident(k) if k == "typeof" => Some(UnaryOp::TypeOf),
            TokenKind::Ident(k) if k == "void" => Some(UnaryOp::Void),
            TokenKind::Punct(p @ ("++" | "--")) => {
                let delta = if *p == "++" { 1.0 } else { -1.0 };
                self.advance();
                let target = self.nested(Self::unary)?;
                return self.update(start, delta, true, target);
            }
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let expr = self.nested(Self::unary)?;
                Ok(self.node(
                    start,
                    ExprKind::Unary {
                        op,
                        expr: Box::new(expr),
                    },
                ))
            }
            None => self.postfix(),
        }
    }

    fn update(&mut self, start: usize, delta: f64, prefix: bool, target: Expr) -> PResult<Expr> {
        if !matches!(
            target.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        ) {
            return Err(ParseError::at(
                self.source,
                start,
                self.base,
                "invalid increment target",
            ));
        }
        Ok(self.node(
            start,
            ExprKind::Update {
                delta,
                prefix,
                target: Box::new(target),
            },
        ))
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let start = self.start();
        let expr = self.call_member()?;
        let tok = self.cur();
        if !tok.newline_before && (tok.is_punct("++") || tok.is_punct("--")) {
            let delta = if tok.is_punct("++") { 1.0 } else { -1.0 };
            self.advance();
            return self.update(start, delta, false, expr);
        }
        Ok(expr)
    }

    fn call_member(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                let property = match &self.cur().kind {
                    TokenKind::Ident(name) => name.clone(),
                    _ => return Err(self.error_here("expected property name")),
                };
                self.advance();
                expr = self.node(
                    start,
                    ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                );
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = self.node(
                    start,
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                );
            } else if self.eat("(") {
                let mut args = Vec::new();
                if !self.eat(")") {
                    loop {
                        args.push(self.assignment()?);
                        if self.eat(")") {
                            break;
                        }
                        self.expect(",")?;
                    }
                }
                expr = self.node(
                    start,
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let tok = self.cur().clone();
        let kind = match tok.kind {
            TokenKind::Number(n) => {
                self.advance();
                ExprKind::Number(n)
            }
            TokenKind::Str { value, .. } => {
                self.advance();
                ExprKind::String(value)
            }
            TokenKind::Punct("(") => {
                self.advance();
                let inner = self.expression()?;
                self.expect(")")?;
                return Ok(Expr {
                    kind: inner.kind,
                    span: self.span_from(start),
                });
            }
            TokenKind::Punct("[") => {
                self.advance();
                let mut items = Vec::new();
                while !self.eat("]") {
                    items.push(self.assignment()?);
                    if !self.eat(",") {
                        self.expect("]")?;
                        break;
                    }
                }
                ExprKind::Array(items)
            }
            TokenKind::Punct("{") => {
                self.advance();
                let mut props = Vec::new();
                while !self.eat("}") {
                    let key = match self.advance().kind {
                        TokenKind::Ident(name) => name,
                        TokenKind::Str { value, .. } => value,
                        TokenKind::Number(n) => tether_api_core::coercion::number_to_string(n),
                        _ => return Err(self.error_here("expected property key")),
                    };
                    self.expect(":")?;
                    props.push((key, self.assignment()?));
                    if !self.eat(",") {
                        self.expect("}")?;
                        break;
                    }
                }
                ExprKind::Object(props)
            }
            TokenKind::Ident(ref word) => match word.as_str() {
                "true" => {
                    self.advance();
                    ExprKind::Bool(true)
                }
                "false" => {
                    self.advance();
                    ExprKind::Bool(false)
                }
                "null" => {
                    self.advance();
                    ExprKind::Null
                }
                "this" => {
                    self.advance();
                    ExprKind::This
                }
                "function" => ExprKind::Function(self.function()?),
                _ => ExprKind::Ident(self.identifier()?),
            },
            TokenKind::Eof => return Err(self.error_here("unexpected end of input")),
            TokenKind::Punct(p) => return Err(self.error_here(format!("unexpected token '{p}'"))),
        };
        Ok(self.node(start, kind))
    }
}
