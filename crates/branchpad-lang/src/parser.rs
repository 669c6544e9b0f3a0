//! Recursive-descent parser for Pad
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons, `+ -`,
//! `* / // %`, unary `- +`, then calls, attributes and indexing.

use crate::ast::{BinOp, CmpOp, Expr, Program, Stmt, UnOp};
use crate::error::{PadError, PadResult};
use crate::lexer::{Lexer, Token, TokenKind};
use branchpad_core::Value;

/// Parse Pad source into a [`Program`]
///
/// # Errors
/// Returns `PadError::Syntax` describing the first problem found.
pub fn parse_program(source: &str) -> PadResult<Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser { tokens, pos: 0 }.program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> PadResult<T> {
        let tok = self.current();
        Err(PadError::syntax(message, tok.line, tok.col))
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> PadResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            self.error(format!("expected {what}"))
        }
    }

    fn identifier(&mut self, what: &str) -> PadResult<String> {
        if let TokenKind::Identifier(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            self.error(format!("expected {what}"))
        }
    }

    fn dotted_name(&mut self) -> PadResult<String> {
        let mut name = self.identifier("module name")?;
        while self.eat(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.identifier("module name")?);
        }
        Ok(name)
    }

    fn program(mut self) -> PadResult<Program> {
        let mut body = Vec::new();
        loop {
            while self.eat(&TokenKind::Newline) {}
            if *self.peek() == TokenKind::Eof {
                return Ok(Program { body });
            }
            body.push(self.statement()?);
            match self.peek() {
                TokenKind::Newline | TokenKind::Eof => {}
                _ => return self.error("invalid syntax"),
            }
        }
    }

    fn statement(&mut self) -> PadResult<Stmt> {
        match self.peek() {
            TokenKind::Import => {
                self.advance();
                let mut modules = vec![self.dotted_name()?];
                while self.eat(&TokenKind::Comma) {
                    modules.push(self.dotted_name()?);
                }
                Ok(Stmt::Import(modules))
            }
            TokenKind::From => {
                self.advance();
                let module = self.dotted_name()?;
                self.expect(&TokenKind::Import, "'import'")?;
                let mut names = vec![self.identifier("imported name")?];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.identifier("imported name")?);
                }
                Ok(Stmt::FromImport { module, names })
            }
            TokenKind::Raise => {
                self.advance();
                self.raise()
            }
            TokenKind::Del => {
                self.advance();
                let mut names = vec![self.identifier("name")?];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.identifier("name")?);
                }
                Ok(Stmt::Del(names))
            }
            TokenKind::Identifier(name) => {
                let target = name.clone();
                let aug = match self.peek_at(1) {
                    TokenKind::Assign => None,
                    TokenKind::PlusAssign => Some(BinOp::Add),
                    TokenKind::MinusAssign => Some(BinOp::Sub),
                    TokenKind::StarAssign => Some(BinOp::Mul),
                    _ => return Ok(Stmt::Expr(self.expression()?)),
                };
                self.advance();
                self.advance();
                let value = self.expression()?;
                Ok(match aug {
                    None => Stmt::Assign { target, value },
                    Some(op) => Stmt::AugAssign { target, op, value },
                })
            }
            _ => Ok(Stmt::Expr(self.expression()?)),
        }
    }

    fn raise(&mut self) -> PadResult<Stmt> {
        match self.peek().clone() {
            TokenKind::Newline | TokenKind::Eof => Ok(Stmt::Raise {
                kind: "RuntimeError".to_string(),
                message: Some(Expr::Literal(Value::Str(
                    "No active exception to reraise".to_string(),
                ))),
            }),
            TokenKind::Identifier(kind) if *self.peek_at(1) == TokenKind::LParen => {
                self.advance();
                self.advance();
                let message = if self.eat(&TokenKind::RParen) {
                    None
                } else {
                    let expr = self.expression()?;
                    self.expect(&TokenKind::RParen, "')'")?;
                    Some(expr)
                };
                Ok(Stmt::Raise { kind, message })
            }
            TokenKind::Identifier(kind)
                if matches!(self.peek_at(1), TokenKind::Newline | TokenKind::Eof) =>
            {
                self.advance();
                Ok(Stmt::Raise {
                    kind,
                    message: None,
                })
            }
            _ => Ok(Stmt::Raise {
                kind: "Exception".to_string(),
                message: Some(self.expression()?),
            }),
        }
    }

    fn expression(&mut self) -> PadResult<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> PadResult<Expr> {
        let mut lhs = self.and_expr()?;
        while self.eat(&TokenKind::Or) {
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> PadResult<Expr> {
        let mut lhs = self.not_expr()?;
        while self.eat(&TokenKind::And) {
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> PadResult<Expr> {
        if self.eat(&TokenKind::Not) {
            let operand = self.not_expr()?;
            return Ok(Expr::Unary {
                op: UnOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> PadResult<Expr> {
        let first = self.additive()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::Ne => CmpOp::Ne,
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::Le => CmpOp::Le,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::Ge => CmpOp::Ge,
                _ => break,
            };
            self.advance();
            rest.push((op, self.additive()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn additive(&mut self) -> PadResult<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn multiplicative(&mut self) -> PadResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> PadResult<Expr> {
        let op = match self.peek() {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Plus => UnOp::Pos,
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> PadResult<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.eat(&TokenKind::LParen) {
                let args = self.sequence(&TokenKind::RParen, "')'")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.eat(&TokenKind::Dot) {
                let name = self.identifier("attribute name")?;
                expr = Expr::Attribute {
                    object: Box::new(expr),
                    name,
                };
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.expression()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed
    fn sequence(&mut self, close: &TokenKind, what: &str) -> PadResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close, what)?;
                break;
            }
        }
        Ok(items)
    }

    fn atom(&mut self) -> PadResult<Expr> {
        let expr = match self.peek().clone() {
            TokenKind::Int(i) => Expr::Literal(Value::Int(i)),
            TokenKind::Float(f) => Expr::Literal(Value::Float(f)),
            TokenKind::String(s) => Expr::Literal(Value::Str(s)),
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            TokenKind::None => Expr::Literal(Value::None),
            TokenKind::Identifier(name) => Expr::Name(name),
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance();
                return Ok(Expr::List(self.sequence(&TokenKind::RBracket, "']'")?));
            }
            TokenKind::Eof | TokenKind::Newline => {
                return self.error("unexpected end of statement")
            }
            _ => return self.error("invalid syntax"),
        };
        self.advance();
        Ok(expr)
    }
}
