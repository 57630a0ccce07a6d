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

//! Arena-allocated expression tree
//!
//! Expressions are stored flat in an [`ExprArena`] and addressed by
//! [`ExprId`]. The arena is immutable once parsing completes; all run-time
//! state (resolved columns, function instances, aggregate accumulators)
//! lives in the executor in side tables indexed by `ExprId`. Dropping a
//! query drops one Vec, never a recursive tree.

use rustc_hash::FxHashMap;
use std::fmt;

use crate::core::Value;

/// Index of an expression node in an [`ExprArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

impl ExprId {
    /// The node's position in the arena
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Pow => "^",
        };
        write!(f, "{}", s)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// Binary logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A column reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Positional reference, zero-based (`_1` in query text is position 0)
    Position(usize),
    /// Named reference into the header schema
    Name(String),
    /// `*` - every column of the row
    Star,
}

/// One expression node
///
/// Child links are `ExprId`s into the same arena. `Identifier` is an
/// unresolved name: at evaluation time it resolves to a projection alias,
/// a header column, or a JSON variable path, in that order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// Literal constant
    Literal(Value),
    /// Column reference, already resolved to position/name/star form
    Column(ColumnRef),
    /// Unresolved name (alias, header column, or dotted JSON path)
    Identifier(String),
    /// Binary arithmetic
    Arith {
        op: ArithOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Unary arithmetic negation
    Neg(ExprId),
    /// Binary comparison
    Compare {
        op: CompareOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// AND / OR
    Logical {
        op: LogicalOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Logical NOT
    Not(ExprId),
    /// `expr [NOT] BETWEEN low AND high`
    Between {
        expr: ExprId,
        low: ExprId,
        high: ExprId,
        negated: bool,
    },
    /// `expr [NOT] IN (list)`
    InList {
        expr: ExprId,
        list: Vec<ExprId>,
        negated: bool,
    },
    /// `expr [NOT] LIKE pattern [ESCAPE ch]`
    Like {
        expr: ExprId,
        pattern: ExprId,
        escape: Option<ExprId>,
        negated: bool,
    },
    /// `expr IS [NOT] NULL`
    IsNull { expr: ExprId, negated: bool },
    /// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
    Case {
        operand: Option<ExprId>,
        branches: Vec<(ExprId, ExprId)>,
        else_expr: Option<ExprId>,
    },
    /// Scalar or aggregate function call
    Function { name: String, args: Vec<ExprId> },
}

impl ExprNode {
    /// Visit every direct child of this node
    pub fn for_each_child(&self, mut f: impl FnMut(ExprId)) {
        match self {
            ExprNode::Literal(_) | ExprNode::Column(_) | ExprNode::Identifier(_) => {}
            ExprNode::Arith { lhs, rhs, .. }
            | ExprNode::Compare { lhs, rhs, .. }
            | ExprNode::Logical { lhs, rhs, .. } => {
                f(*lhs);
                f(*rhs);
            }
            ExprNode::Neg(e) | ExprNode::Not(e) => f(*e),
            ExprNode::Between {
                expr, low, high, ..
            } => {
                f(*expr);
                f(*low);
                f(*high);
            }
            ExprNode::InList { expr, list, .. } => {
                f(*expr);
                for id in list {
                    f(*id);
                }
            }
            ExprNode::Like {
                expr,
                pattern,
                escape,
                ..
            } => {
                f(*expr);
                f(*pattern);
                if let Some(e) = escape {
                    f(*e);
                }
            }
            ExprNode::IsNull { expr, .. } => f(*expr),
            ExprNode::Case {
                operand,
                branches,
                else_expr,
            } => {
                if let Some(op) = operand {
                    f(*op);
                }
                for (when, then) in branches {
                    f(*when);
                    f(*then);
                }
                if let Some(e) = else_expr {
                    f(*e);
                }
            }
            ExprNode::Function { args, .. } => {
                for id in args {
                    f(*id);
                }
            }
        }
    }
}

/// Flat arena owning every expression node of one query
#[derive(Debug, Clone, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
}

impl ExprArena {
    /// Create an empty arena
    pub fn new() -> Self {
        ExprArena { nodes: Vec::new() }
    }

    /// Append a node, returning its id
    pub fn alloc(&mut self, node: ExprNode) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Fetch a node by id
    #[inline]
    pub fn node(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node has been allocated
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One projection list entry: an expression with an optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expr: ExprId,
    pub alias: Option<String>,
}

/// The FROM clause target
///
/// For delimited text only `root` matters; for JSON the optional `[*]`
/// wildcard and key prefix select which nested objects become rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    /// Object name, e.g. `stdin` or `s3object`
    pub root: String,
    /// `root[*]` - iterate the elements of the root-level array
    pub wildcard_array: bool,
    /// Trailing `.a.b` key prefix under the root
    pub prefix: Vec<String>,
}

impl FromClause {
    pub fn object(root: impl Into<String>) -> Self {
        FromClause {
            root: root.into(),
            wildcard_array: false,
            prefix: Vec::new(),
        }
    }
}

/// A fully parsed and semantically checked query
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// All expression nodes
    pub arena: ExprArena,
    /// SELECT list in declaration order
    pub projections: Vec<Projection>,
    /// WHERE predicate, if present
    pub predicate: Option<ExprId>,
    /// FROM target
    pub from: FromClause,
    /// LIMIT bound, if present
    pub limit: Option<u64>,
    /// Alias name (lower-cased) to the aliased projection expression
    pub aliases: FxHashMap<String, ExprId>,
    /// True if any projection contains an aggregate call
    pub aggregate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_alloc_and_fetch() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(ExprNode::Literal(Value::Integer(1)));
        let b = arena.alloc(ExprNode::Literal(Value::Integer(2)));
        let sum = arena.alloc(ExprNode::Arith {
            op: ArithOp::Add,
            lhs: a,
            rhs: b,
        });
        assert_eq!(arena.len(), 3);
        assert!(matches!(arena.node(sum), ExprNode::Arith { .. }));
        assert!(matches!(
            arena.node(a),
            ExprNode::Literal(Value::Integer(1))
        ));
    }

    #[test]
    fn test_for_each_child() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(ExprNode::Literal(Value::Integer(1)));
        let b = arena.alloc(ExprNode::Literal(Value::Integer(2)));
        let c = arena.alloc(ExprNode::Literal(Value::Integer(3)));
        let between = ExprNode::Between {
            expr: a,
            low: b,
            high: c,
            negated: false,
        };
        let mut children = Vec::new();
        between.for_each_child(|id| children.push(id));
        assert_eq!(children, vec![a, b, c]);

        let mut none = Vec::new();
        ExprNode::Identifier("x".to_string()).for_each_child(|id| none.push(id));
        assert!(none.is_empty());
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(ArithOp::Pow.to_string(), "^");
        assert_eq!(CompareOp::Ne.to_string(), "!=");
    }
}
