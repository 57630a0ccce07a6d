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

//! Statement-level parsing and the semantic pass
//!
//! [`Parser`] owns the token cursor and the expression arena. Statement
//! structure (SELECT ... FROM ... WHERE ... LIMIT) is parsed here;
//! expression parsing lives in `expressions.rs`. After a syntactically
//! valid parse, [`validate`] runs the semantic checks: aggregate placement,
//! alias uniqueness and `*` usage. No partially checked query ever leaves
//! this module.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{Error, Result};
use crate::functions::is_aggregate_name;

use super::ast::{
    ColumnRef, ExprArena, ExprId, ExprNode, FromClause, ParsedQuery, Projection,
};
use super::error::ParseError;
use super::lexer::Lexer;
use super::precedence::Precedence;
use super::token::{Token, TokenType};

/// Query parser
pub struct Parser {
    lexer: Lexer,
    pub(super) current_token: Token,
    pub(super) peek_token: Token,
    pub(super) arena: ExprArena,
}

impl Parser {
    /// Create a parser over the given query text
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        let peek_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            peek_token,
            arena: ExprArena::new(),
        }
    }

    /// Move the cursor one token forward
    pub(super) fn advance(&mut self) {
        self.current_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    /// Fail if the lexer produced an error token at the cursor
    pub(super) fn bail_if_error_token(&self) -> std::result::Result<(), ParseError> {
        if self.current_token.is_error() {
            let message = self
                .current_token
                .error
                .clone()
                .unwrap_or_else(|| "invalid token".to_string());
            return Err(ParseError::new(message, self.current_token.position));
        }
        Ok(())
    }

    /// Build a parse error at the current token position
    pub(super) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current_token.position)
    }

    /// Consume the expected keyword or fail
    pub(super) fn expect_keyword(&mut self, keyword: &str) -> std::result::Result<(), ParseError> {
        self.bail_if_error_token()?;
        if self.current_token.is_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected {}, found '{}'",
                keyword, self.current_token.literal
            )))
        }
    }

    /// Consume the expected punctuator or fail
    pub(super) fn expect_punctuator(&mut self, punct: &str) -> std::result::Result<(), ParseError> {
        self.bail_if_error_token()?;
        if self.current_token.is_punctuator(punct) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected '{}', found '{}'",
                punct, self.current_token.literal
            )))
        }
    }

    /// Consume an identifier, returning its text
    pub(super) fn expect_identifier(&mut self) -> std::result::Result<String, ParseError> {
        self.bail_if_error_token()?;
        if self.current_token.token_type == TokenType::Identifier {
            let literal = self.current_token.literal.clone();
            self.advance();
            Ok(literal)
        } else {
            Err(self.error_here(format!(
                "expected identifier, found '{}'",
                self.current_token.literal
            )))
        }
    }

    /// Parse one full SELECT statement
    ///
    /// Consumes the whole input; trailing tokens after the statement (or
    /// its optional `;`) are a syntax error.
    pub fn parse_statement(&mut self) -> std::result::Result<ParsedQuery, ParseError> {
        self.expect_keyword("SELECT")?;

        let projections = self.parse_projections()?;

        self.expect_keyword("FROM")?;
        let from = self.parse_from_clause()?;

        let predicate = if self.current_token.is_keyword("WHERE") {
            self.advance();
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };

        let limit = if self.current_token.is_keyword("LIMIT") {
            self.advance();
            self.bail_if_error_token()?;
            if self.current_token.token_type != TokenType::Integer {
                return Err(self.error_here("expected integer after LIMIT"));
            }
            let n: u64 = self
                .current_token
                .literal
                .parse()
                .map_err(|_| self.error_here("LIMIT value out of range"))?;
            self.advance();
            Some(n)
        } else {
            None
        };

        if self.current_token.is_punctuator(";") {
            self.advance();
        }
        self.bail_if_error_token()?;
        if !self.current_token.is_eof() {
            return Err(self.error_here(format!(
                "unexpected input after statement: '{}'",
                self.current_token.literal
            )));
        }

        Ok(ParsedQuery {
            arena: std::mem::take(&mut self.arena),
            projections,
            predicate,
            from,
            limit,
            aliases: FxHashMap::default(),
            aggregate: false,
        })
    }

    /// Parse the SELECT list
    fn parse_projections(&mut self) -> std::result::Result<Vec<Projection>, ParseError> {
        // Bare `select * from ...`
        if self.current_token.is_operator("*") && self.peek_token.is_keyword("FROM") {
            self.advance();
            let expr = self.arena.alloc(ExprNode::Column(ColumnRef::Star));
            return Ok(vec![Projection { expr, alias: None }]);
        }

        let mut projections = Vec::new();
        loop {
            let expr = self.parse_expression(Precedence::Lowest)?;
            let alias = self.parse_optional_alias()?;
            projections.push(Projection { expr, alias });
            if self.current_token.is_punctuator(",") {
                self.advance();
            } else {
                break;
            }
        }
        Ok(projections)
    }

    /// `AS name` or a bare trailing identifier
    fn parse_optional_alias(&mut self) -> std::result::Result<Option<String>, ParseError> {
        if self.current_token.is_keyword("AS") {
            self.advance();
            return Ok(Some(self.expect_identifier()?));
        }
        if self.current_token.token_type == TokenType::Identifier {
            let literal = self.current_token.literal.clone();
            self.advance();
            return Ok(Some(literal));
        }
        Ok(None)
    }

    /// `FROM object`, `FROM object[*]`, `FROM object[*].a.b`
    fn parse_from_clause(&mut self) -> std::result::Result<FromClause, ParseError> {
        let root = self.expect_identifier()?;

        let wildcard_array = if self.current_token.is_punctuator("[") {
            self.advance();
            if !self.current_token.is_operator("*") {
                return Err(self.error_here("expected '*' inside '[]' in the FROM clause"));
            }
            self.advance();
            self.expect_punctuator("]")?;
            true
        } else {
            false
        };

        let mut prefix = Vec::new();
        while self.current_token.is_punctuator(".") {
            self.advance();
            prefix.push(self.expect_identifier()?);
        }

        Ok(FromClause {
            root,
            wildcard_array,
            prefix,
        })
    }
}

// =============================================================================
// Semantic pass
// =============================================================================

/// Run the semantic checks and fill in the alias table and aggregate flag
pub fn validate(query: &mut ParsedQuery) -> Result<()> {
    // Alias table, case-insensitive, duplicates rejected
    let mut aliases = FxHashMap::default();
    for projection in &query.projections {
        if let Some(alias) = &projection.alias {
            let key = alias.to_lowercase();
            if aliases.insert(key, projection.expr).is_some() {
                return Err(Error::DuplicateAlias(alias.clone()));
            }
        }
    }
    query.aliases = aliases;

    query.aggregate = query
        .projections
        .iter()
        .any(|p| contains_aggregate(&query.arena, p.expr));

    for projection in &query.projections {
        check_no_nested_aggregate(&query.arena, projection.expr, false)?;
        if query.aggregate {
            check_no_column_outside_aggregate(&query.arena, &query.aliases, projection.expr)?;
        }
        check_star_usage(&query.arena, projection.expr, true)?;
    }

    if let Some(predicate) = query.predicate {
        if contains_aggregate(&query.arena, predicate) {
            return Err(Error::AggregateInPredicate);
        }
        check_star_usage(&query.arena, predicate, false)?;
    }

    Ok(())
}

fn node_children(node: &ExprNode) -> SmallVec<[ExprId; 4]> {
    let mut children = SmallVec::new();
    node.for_each_child(|id| children.push(id));
    children
}

/// True if any node of the subtree is an aggregate call
pub fn contains_aggregate(arena: &ExprArena, id: ExprId) -> bool {
    let node = arena.node(id);
    if let ExprNode::Function { name, .. } = node {
        if is_aggregate_name(name) {
            return true;
        }
    }
    node_children(node)
        .into_iter()
        .any(|child| contains_aggregate(arena, child))
}

/// Reject aggregate calls nested inside aggregate arguments
fn check_no_nested_aggregate(arena: &ExprArena, id: ExprId, inside: bool) -> Result<()> {
    let node = arena.node(id);
    let is_aggregate = matches!(node, ExprNode::Function { name, .. } if is_aggregate_name(name));
    if is_aggregate && inside {
        return Err(Error::NestedAggregate);
    }
    for child in node_children(node) {
        check_no_nested_aggregate(arena, child, inside || is_aggregate)?;
    }
    Ok(())
}

/// In aggregate mode, a projection may touch row data only through an
/// aggregate call (or an alias of an aggregate projection)
fn check_no_column_outside_aggregate(
    arena: &ExprArena,
    aliases: &FxHashMap<String, ExprId>,
    id: ExprId,
) -> Result<()> {
    let node = arena.node(id);
    match node {
        ExprNode::Function { name, .. } if is_aggregate_name(name) => Ok(()),
        ExprNode::Column(_) => Err(Error::ColumnBesideAggregate),
        ExprNode::Identifier(name) => match aliases.get(&name.to_lowercase()) {
            Some(target) if contains_aggregate(arena, *target) => Ok(()),
            _ => Err(Error::ColumnBesideAggregate),
        },
        _ => {
            for child in node_children(node) {
                check_no_column_outside_aggregate(arena, aliases, child)?;
            }
            Ok(())
        }
    }
}

/// `*` is valid only as a whole projection or as the sole count() argument
fn check_star_usage(arena: &ExprArena, id: ExprId, is_projection_root: bool) -> Result<()> {
    let node = arena.node(id);
    match node {
        ExprNode::Column(ColumnRef::Star) => {
            if is_projection_root {
                Ok(())
            } else {
                Err(Error::syntax(
                    "select list",
                    "'*' is only valid as a lone projection or inside count(*)",
                ))
            }
        }
        ExprNode::Function { name, args } if name == "count" && args.len() == 1 => {
            match arena.node(args[0]) {
                ExprNode::Column(ColumnRef::Star) => Ok(()),
                _ => check_star_usage(arena, args[0], false),
            }
        }
        _ => {
            for child in node_children(node) {
                check_star_usage(arena, child, false)?;
            }
            Ok(())
        }
    }
}
