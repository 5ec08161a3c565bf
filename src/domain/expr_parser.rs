//! Condition expression parser.
//!
//! Recursive descent parser for the condition grammar. Converts text to an
//! [`Expr`] with error messages carrying the character offset.
//!
//! ```text
//! or_expr    := and_expr (("or" | "||" | "|") and_expr)*
//! and_expr   := comparison (("and" | "&&" | "&") comparison)*
//! comparison := additive (("<" | "<=" | ">" | ">=" | "==" | "!=") additive)?
//! additive   := term (("+" | "-") term)*
//! term       := unary (("*" | "/") unary)*
//! unary      := "-" unary | primary
//! primary    := number | identifier | "(" or_expr ")"
//! ```
//!
//! Keywords are case-insensitive. Types are checked after parsing: arithmetic
//! and comparison need numbers, `and`/`or` need booleans, and the whole
//! condition must be boolean.

use crate::domain::error::ParseError;
use crate::domain::expr::{ArithOp, CompareOp, Expr, ValueType};

const MAX_DEPTH: usize = 64;
/// Bound on operators per condition. Binary chains build left-deep trees, so
/// this also bounds the depth the evaluator recurses to.
const MAX_OPERATORS: usize = 256;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            operators: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn peek_word(&self) -> &'a str {
        let rest = self.remaining();
        let end = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    fn describe_next(&self) -> String {
        let word = self.peek_word();
        if !word.is_empty() {
            word.to_string()
        } else {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        }
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_word().eq_ignore_ascii_case(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn consume_exact(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn count_operator(&mut self, op_pos: usize) -> Result<(), ParseError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(ParseError {
                message: format!("expression has more than {} operators", MAX_OPERATORS),
                position: op_pos,
            });
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let mut items = vec![self.parse_and()?];
        loop {
            self.skip_whitespace();
            let op_pos = self.pos;
            if self.consume_keyword("or") || self.consume_exact("||") || self.consume_exact("|") {
                self.count_operator(op_pos)?;
                let rhs = self.parse_and()?;
                require_boolean(&items[items.len() - 1], start, "or")?;
                require_boolean(&rhs, op_pos, "or")?;
                items.push(rhs);
            } else {
                break;
            }
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let mut items = vec![self.parse_comparison()?];
        loop {
            self.skip_whitespace();
            let op_pos = self.pos;
            if self.consume_keyword("and") || self.consume_exact("&&") || self.consume_exact("&") {
                self.count_operator(op_pos)?;
                let rhs = self.parse_comparison()?;
                require_boolean(&items[items.len() - 1], start, "and")?;
                require_boolean(&rhs, op_pos, "and")?;
                items.push(rhs);
            } else {
                break;
            }
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::And(items)
        })
    }

    fn parse_compare_op(&mut self) -> Option<CompareOp> {
        self.skip_whitespace();
        for (text, op) in [
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
        ] {
            if self.consume_exact(text) {
                return Some(op);
            }
        }
        None
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let left = self.parse_additive()?;
        let op_pos = self.pos;
        let Some(op) = self.parse_compare_op() else {
            self.skip_whitespace();
            if self.peek() == Some('=') {
                return Err(self.error("expected comparison operator, found '=' (use '==')"));
            }
            return Ok(left);
        };
        self.count_operator(op_pos)?;

        let right = self.parse_additive()?;
        require_number(&left, start, op.symbol())?;
        require_number(&right, op_pos, op.symbol())?;

        let after = self.pos;
        if self.parse_compare_op().is_some() {
            return Err(ParseError {
                message: "chained comparisons are not supported, combine them with 'and'"
                    .to_string(),
                position: after,
            });
        }
        self.pos = after;

        Ok(Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('+') => ArithOp::Add,
                Some('-') => ArithOp::Sub,
                _ => break,
            };
            let op_pos = self.pos;
            self.advance();
            self.count_operator(op_pos)?;
            let right = self.parse_term()?;
            left = arith(op, left, right, op_pos)?;
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('*') => ArithOp::Mul,
                Some('/') => ArithOp::Div,
                _ => break,
            };
            let op_pos = self.pos;
            self.advance();
            self.count_operator(op_pos)?;
            let right = self.parse_unary()?;
            left = arith(op, left, right, op_pos)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        if self.peek() == Some('-') {
            let op_pos = self.pos;
            self.advance();
            self.count_operator(op_pos)?;
            self.enter()?;
            let inner = self.parse_unary()?;
            self.leave();
            require_number(&inner, op_pos, "-")?;
            return Ok(match inner {
                Expr::Number(v) => Expr::Number(-v),
                other => Expr::Neg(Box::new(other)),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => {
                self.advance();
                self.enter()?;
                let inner = self.parse_or()?;
                self.leave();
                self.skip_whitespace();
                match self.peek() {
                    Some(')') => {
                        self.advance();
                        Ok(inner)
                    }
                    _ => Err(self.error(format!("expected ')', found '{}'", self.describe_next()))),
                }
            }
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.parse_number().map(Expr::Number),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let word = self.peek_word();
                if ["and", "or", "not"]
                    .iter()
                    .any(|k| word.eq_ignore_ascii_case(k))
                {
                    return Err(self.error(format!("expected operand, found keyword '{}'", word)));
                }
                self.pos += word.len();
                Ok(Expr::Column(word.to_string()))
            }
            _ => Err(self.error(format!("expected operand, found '{}'", self.describe_next()))),
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            let exp_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            if self.pos == exp_start {
                self.pos = mark;
            }
        }

        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(self.error(format!("unexpected '{}' after number", self.describe_next())));
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }
}

fn arith(op: ArithOp, left: Expr, right: Expr, op_pos: usize) -> Result<Expr, ParseError> {
    require_number(&left, op_pos, op.symbol())?;
    require_number(&right, op_pos, op.symbol())?;
    Ok(Expr::Arith {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn require_number(expr: &Expr, position: usize, op: &str) -> Result<(), ParseError> {
    match expr.value_type() {
        ValueType::Number => Ok(()),
        ValueType::Boolean => Err(ParseError {
            message: format!("operator '{}' needs a number, found condition '{}'", op, expr),
            position,
        }),
    }
}

fn require_boolean(expr: &Expr, position: usize, op: &str) -> Result<(), ParseError> {
    match expr.value_type() {
        ValueType::Boolean => Ok(()),
        ValueType::Number => Err(ParseError {
            message: format!("operator '{}' needs a condition, found number '{}'", op, expr),
            position,
        }),
    }
}

/// Parse a condition. The result is always boolean-typed.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input);
    parser.skip_whitespace();
    if parser.peek().is_none() {
        return Err(parser.error("expected condition, found end of input"));
    }

    let expr = parser.parse_or()?;

    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(parser.error(format!(
            "unexpected input after condition: '{}'",
            parser.remaining()
        )));
    }

    if expr.value_type() != ValueType::Boolean {
        return Err(ParseError {
            message: format!("expected a condition, found number '{}'", expr),
            position: 0,
        });
    }

    Ok(expr)
}
