// Copyright 2025 Streamsel Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Expression parsing (Pratt parser)
//!
//! Implemented as an impl block on [`Parser`]. Prefix forms build a node
//! from the current token; infix forms combine a parsed left side with
//! whatever the current operator introduces, honoring precedence.

use crate::core::{parse_timestamp, Value};

use super::ast::{ArithOp, ColumnRef, CompareOp, ExprId, ExprNode, LogicalOp};
use super::error::ParseError;
use super::parser::Parser;
use super::precedence::Precedence;
use super::token::TokenType;

impl Parser {
    /// Parse one expression at the given minimum precedence
    pub(super) fn parse_expression(
        &mut self,
        precedence: Precedence,
    ) -> Result<ExprId, ParseError> {
        let mut left = self.parse_prefix()?;

        while precedence < self.current_infix_precedence() {
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    /// Precedence of the operator the current token would introduce
    fn current_infix_precedence(&self) -> Precedence {
        match self.current_token.token_type {
            TokenType::Operator => Precedence::for_operator(&self.current_token.literal),
            TokenType::Keyword => match self.current_token.literal.as_str() {
                "AND" | "OR" | "IS" | "BETWEEN" | "IN" | "LIKE" => {
                    Precedence::for_operator(&self.current_token.literal)
                }
                // NOT is infix only in `x NOT BETWEEN/IN/LIKE ...`
                "NOT" => match self.peek_token.literal.as_str() {
                    "BETWEEN" | "IN" | "LIKE" => Precedence::Equals,
                    _ => Precedence::Lowest,
                },
                _ => Precedence::Lowest,
            },
            _ => Precedence::Lowest,
        }
    }

    // =========================================================================
    // Prefix forms
    // =========================================================================

    fn parse_prefix(&mut self) -> Result<ExprId, ParseError> {
        self.bail_if_error_token()?;

        match self.current_token.token_type {
            TokenType::Integer => {
                let value: i64 = self
                    .current_token
                    .literal
                    .parse()
                    .map_err(|_| self.error_here("integer literal out of range"))?;
                self.advance();
                Ok(self.arena.alloc(ExprNode::Literal(Value::Integer(value))))
            }
            TokenType::Float => {
                let value: f64 = self
                    .current_token
                    .literal
                    .parse()
                    .map_err(|_| self.error_here("malformed float literal"))?;
                self.advance();
                Ok(self.arena.alloc(ExprNode::Literal(Value::Float(value))))
            }
            TokenType::String => {
                let value = Value::text(self.current_token.literal.clone());
                self.advance();
                Ok(self.arena.alloc(ExprNode::Literal(value)))
            }
            // Backtick literals try to be timestamps, silently falling back
            // to plain strings
            TokenType::Backtick => {
                let literal = self.current_token.literal.clone();
                let value = match parse_timestamp(&literal) {
                    Ok(ts) => Value::Timestamp(ts),
                    Err(_) => Value::text(literal),
                };
                self.advance();
                Ok(self.arena.alloc(ExprNode::Literal(value)))
            }
            TokenType::Keyword => match self.current_token.literal.as_str() {
                "TRUE" => {
                    self.advance();
                    Ok(self.arena.alloc(ExprNode::Literal(Value::Boolean(true))))
                }
                "FALSE" => {
                    self.advance();
                    Ok(self.arena.alloc(ExprNode::Literal(Value::Boolean(false))))
                }
                "NULL" => {
                    self.advance();
                    Ok(self.arena.alloc(ExprNode::Literal(Value::null_unknown())))
                }
                "NOT" => {
                    self.advance();
                    let operand = self.parse_expression(Precedence::Not)?;
                    Ok(self.arena.alloc(ExprNode::Not(operand)))
                }
                "CASE" => self.parse_case(),
                other => Err(self.error_here(format!("unexpected keyword {}", other))),
            },
            TokenType::Operator => match self.current_token.literal.as_str() {
                "-" => {
                    self.advance();
                    let operand = self.parse_expression(Precedence::Prefix)?;
                    Ok(self.arena.alloc(ExprNode::Neg(operand)))
                }
                "+" => {
                    self.advance();
                    self.parse_expression(Precedence::Prefix)
                }
                "*" => {
                    self.advance();
                    Ok(self.arena.alloc(ExprNode::Column(ColumnRef::Star)))
                }
                other => Err(self.error_here(format!("unexpected operator '{}'", other))),
            },
            TokenType::Punctuator if self.current_token.literal == "(" => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_punctuator(")")?;
                Ok(expr)
            }
            TokenType::Identifier => self.parse_identifier_expression(),
            _ => Err(self.error_here(format!(
                "unexpected token {}",
                self.current_token.token_type
            ))),
        }
    }

    /// Identifier-led forms: function call, positional column, name or
    /// dotted JSON path
    fn parse_identifier_expression(&mut self) -> Result<ExprId, ParseError> {
        let name = self.current_token.literal.clone();

        if self.peek_token.is_punctuator("(") {
            return self.parse_function_call(name);
        }
        self.advance();

        // Positional column: _N, one-based in query text
        if let Some(position) = parse_positional(&name) {
            if position == 0 {
                return Err(self.error_here("column position _0 is invalid, positions start at _1"));
            }
            return Ok(self
                .arena
                .alloc(ExprNode::Column(ColumnRef::Position(position - 1))));
        }

        // Dotted path: a.b[3].c - kept as one identifier, bound later
        let mut path = name;
        loop {
            if self.current_token.is_punctuator(".")
                && self.peek_token.token_type == TokenType::Identifier
            {
                self.advance();
                path.push('.');
                path.push_str(&self.current_token.literal);
                self.advance();
            } else if self.current_token.is_punctuator("[")
                && self.peek_token.token_type == TokenType::Integer
            {
                self.advance();
                path.push('[');
                path.push_str(&self.current_token.literal);
                path.push(']');
                self.advance();
                self.expect_punctuator("]")?;
            } else {
                break;
            }
        }

        Ok(self.arena.alloc(ExprNode::Identifier(path)))
    }

    /// Parse `name(args...)`
    ///
    /// `extract(part FROM expr)` gets its special call form rewritten into
    /// a two-argument call with the part as a string literal.
    fn parse_function_call(&mut self, name: String) -> Result<ExprId, ParseError> {
        let name = name.to_lowercase();
        self.advance(); // function name
        self.advance(); // opening paren

        if name == "extract" {
            return self.parse_extract_call();
        }

        let mut args = Vec::new();

        // date_add(day, n, ts) / date_diff(day, a, b) take a bare date-part
        // word first; it is carried as a string literal like extract() does
        if matches!(name.as_str(), "date_add" | "date_diff")
            && matches!(
                self.current_token.token_type,
                TokenType::Identifier | TokenType::Keyword
            )
            && self.peek_token.is_punctuator(",")
        {
            let part = self.current_token.literal.to_lowercase();
            args.push(self.arena.alloc(ExprNode::Literal(Value::text(part))));
            self.advance();
            self.advance(); // comma
        }

        if !self.current_token.is_punctuator(")") {
            loop {
                args.push(self.parse_expression(Precedence::Lowest)?);
                if self.current_token.is_punctuator(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_punctuator(")")?;

        Ok(self.arena.alloc(ExprNode::Function { name, args }))
    }

    /// `extract(year FROM expr)` - the part becomes a string literal arg
    fn parse_extract_call(&mut self) -> Result<ExprId, ParseError> {
        let part = match self.current_token.token_type {
            TokenType::Identifier | TokenType::Keyword => self.current_token.literal.to_lowercase(),
            _ => return Err(self.error_here("expected date part in extract()")),
        };
        self.advance();
        self.expect_keyword("FROM")?;
        let source = self.parse_expression(Precedence::Lowest)?;
        self.expect_punctuator(")")?;

        let part_id = self.arena.alloc(ExprNode::Literal(Value::text(part)));
        Ok(self.arena.alloc(ExprNode::Function {
            name: "extract".to_string(),
            args: vec![part_id, source],
        }))
    }

    /// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
    fn parse_case(&mut self) -> Result<ExprId, ParseError> {
        self.advance(); // CASE

        let operand = if self.current_token.is_keyword("WHEN") {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };

        let mut branches = Vec::new();
        while self.current_token.is_keyword("WHEN") {
            self.advance();
            let when = self.parse_expression(Precedence::Lowest)?;
            self.expect_keyword("THEN")?;
            let then = self.parse_expression(Precedence::Lowest)?;
            branches.push((when, then));
        }
        if branches.is_empty() {
            return Err(self.error_here("CASE requires at least one WHEN branch"));
        }

        let else_expr = if self.current_token.is_keyword("ELSE") {
            self.advance();
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };

        self.expect_keyword("END")?;

        Ok(self.arena.alloc(ExprNode::Case {
            operand,
            branches,
            else_expr,
        }))
    }

    // =========================================================================
    // Infix forms
    // =========================================================================

    fn parse_infix(&mut self, left: ExprId) -> Result<ExprId, ParseError> {
        if self.current_token.token_type == TokenType::Operator {
            return self.parse_binary_operator(left);
        }

        match self.current_token.literal.as_str() {
            "AND" | "OR" => {
                let op = if self.current_token.is_keyword("AND") {
                    LogicalOp::And
                } else {
                    LogicalOp::Or
                };
                let precedence = self.current_infix_precedence();
                self.advance();
                let rhs = self.parse_expression(precedence)?;
                Ok(self.arena.alloc(ExprNode::Logical { op, lhs: left, rhs }))
            }
            "IS" => self.parse_is(left),
            "BETWEEN" => self.parse_between(left, false),
            "IN" => self.parse_in(left, false),
            "LIKE" => self.parse_like(left, false),
            "NOT" => {
                self.advance();
                match self.current_token.literal.as_str() {
                    "BETWEEN" => self.parse_between(left, true),
                    "IN" => self.parse_in(left, true),
                    "LIKE" => self.parse_like(left, true),
                    other => Err(self.error_here(format!(
                        "expected BETWEEN, IN or LIKE after NOT, found {}",
                        other
                    ))),
                }
            }
            other => Err(self.error_here(format!("unexpected token {} in expression", other))),
        }
    }

    fn parse_binary_operator(&mut self, left: ExprId) -> Result<ExprId, ParseError> {
        let op_literal = self.current_token.literal.clone();
        let precedence = self.current_infix_precedence();
        self.advance();
        let rhs = self.parse_expression(precedence)?;

        let node = match op_literal.as_str() {
            "+" => ExprNode::Arith {
                op: ArithOp::Add,
                lhs: left,
                rhs,
            },
            "-" => ExprNode::Arith {
                op: ArithOp::Sub,
                lhs: left,
                rhs,
            },
            "*" => ExprNode::Arith {
                op: ArithOp::Mul,
                lhs: left,
                rhs,
            },
            "/" => ExprNode::Arith {
                op: ArithOp::Div,
                lhs: left,
                rhs,
            },
            "%" => ExprNode::Arith {
                op: ArithOp::Mod,
                lhs: left,
                rhs,
            },
            "^" => ExprNode::Arith {
                op: ArithOp::Pow,
                lhs: left,
                rhs,
            },
            "=" | "==" => ExprNode::Compare {
                op: CompareOp::Eq,
                lhs: left,
                rhs,
            },
            "!=" | "<>" => ExprNode::Compare {
                op: CompareOp::Ne,
                lhs: left,
                rhs,
            },
            "<" => ExprNode::Compare {
                op: CompareOp::Lt,
                lhs: left,
                rhs,
            },
            "<=" => ExprNode::Compare {
                op: CompareOp::Le,
                lhs: left,
                rhs,
            },
            ">" => ExprNode::Compare {
                op: CompareOp::Gt,
                lhs: left,
                rhs,
            },
            ">=" => ExprNode::Compare {
                op: CompareOp::Ge,
                lhs: left,
                rhs,
            },
            other => {
                return Err(self.error_here(format!("operator '{}' is not supported", other)));
            }
        };

        Ok(self.arena.alloc(node))
    }

    /// `expr IS [NOT] NULL`
    fn parse_is(&mut self, left: ExprId) -> Result<ExprId, ParseError> {
        self.advance(); // IS
        let negated = if self.current_token.is_keyword("NOT") {
            self.advance();
            true
        } else {
            false
        };
        self.expect_keyword("NULL")?;
        Ok(self.arena.alloc(ExprNode::IsNull {
            expr: left,
            negated,
        }))
    }

    /// `expr [NOT] BETWEEN low AND high`
    ///
    /// The bounds parse at Equals precedence so the separating AND is not
    /// swallowed as a logical operator.
    fn parse_between(&mut self, left: ExprId, negated: bool) -> Result<ExprId, ParseError> {
        self.advance(); // BETWEEN
        let low = self.parse_expression(Precedence::Equals)?;
        self.expect_keyword("AND")?;
        let high = self.parse_expression(Precedence::Equals)?;
        Ok(self.arena.alloc(ExprNode::Between {
            expr: left,
            low,
            high,
            negated,
        }))
    }

    /// `expr [NOT] IN (item, ...)`
    fn parse_in(&mut self, left: ExprId, negated: bool) -> Result<ExprId, ParseError> {
        self.advance(); // IN
        self.expect_punctuator("(")?;
        let mut list = Vec::new();
        loop {
            list.push(self.parse_expression(Precedence::Lowest)?);
            if self.current_token.is_punctuator(",") {
                self.advance();
            } else {
                break;
            }
        }
        self.expect_punctuator(")")?;
        Ok(self.arena.alloc(ExprNode::InList {
            expr: left,
            list,
            negated,
        }))
    }

    /// `expr [NOT] LIKE pattern [ESCAPE ch]`
    fn parse_like(&mut self, left: ExprId, negated: bool) -> Result<ExprId, ParseError> {
        self.advance(); // LIKE
        let pattern = self.parse_expression(Precedence::Equals)?;
        let escape = if self.current_token.is_keyword("ESCAPE") {
            self.advance();
            Some(self.parse_expression(Precedence::Equals)?)
        } else {
            None
        };
        Ok(self.arena.alloc(ExprNode::Like {
            expr: left,
            pattern,
            escape,
            negated,
        }))
    }
}

/// Recognize `_N` positional column names; returns the one-based position
fn parse_positional(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional() {
        assert_eq!(parse_positional("_1"), Some(1));
        assert_eq!(parse_positional("_42"), Some(42));
        assert_eq!(parse_positional("_0"), Some(0));
        assert_eq!(parse_positional("_"), None);
        assert_eq!(parse_positional("_1a"), None);
        assert_eq!(parse_positional("name"), None);
    }
}
