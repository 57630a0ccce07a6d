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

//! Expression evaluation
//!
//! The arena produced by the parser is immutable; all per-query runtime
//! state (function instances, alias resolution, per-row caches, aggregate
//! accumulators) lives here in side tables indexed by `ExprId`.
//!
//! Three-valued logic throughout: a comparison against NULL is NULL, and
//! arithmetic with a NULL operand is NULL. Aggregate calls accumulate
//! while rows stream and only produce their result on the final pass.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::core::{DataType, Error, Result, RowContext, Value};
use crate::functions::{global_registry, AggregateFunction, ScalarFunction};
use crate::parser::{
    ArithOp, ColumnRef, CompareOp, ExprArena, ExprId, ExprNode, LogicalOp, ParsedQuery,
};

// ============================================================================
// LIKE patterns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum LikeToken {
    Literal(char),
    AnyOne,
    AnyRun,
}

/// A compiled `LIKE` pattern
#[derive(Debug, Clone)]
struct LikePattern {
    tokens: Vec<LikeToken>,
}

impl LikePattern {
    /// Compile a pattern; an escape character protects the following
    /// character from its wildcard meaning
    fn compile(pattern: &str, escape: Option<char>) -> Result<Self> {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(ch) = chars.next() {
            if Some(ch) == escape {
                match chars.next() {
                    Some(next) => tokens.push(LikeToken::Literal(next)),
                    None => {
                        return Err(Error::invalid_argument(
                            "LIKE pattern ends with a dangling escape",
                        ))
                    }
                }
            } else if ch == '%' {
                // collapse adjacent runs
                if tokens.last() != Some(&LikeToken::AnyRun) {
                    tokens.push(LikeToken::AnyRun);
                }
            } else if ch == '_' {
                tokens.push(LikeToken::AnyOne);
            } else {
                tokens.push(LikeToken::Literal(ch));
            }
        }
        Ok(LikePattern { tokens })
    }

    fn matches(&self, text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        match_tokens(&self.tokens, &chars)
    }
}

fn match_tokens(tokens: &[LikeToken], chars: &[char]) -> bool {
    match tokens.first() {
        None => chars.is_empty(),
        Some(LikeToken::AnyRun) => {
            (0..=chars.len()).any(|skip| match_tokens(&tokens[1..], &chars[skip..]))
        }
        Some(LikeToken::AnyOne) => !chars.is_empty() && match_tokens(&tokens[1..], &chars[1..]),
        Some(LikeToken::Literal(c)) => {
            chars.first() == Some(c) && match_tokens(&tokens[1..], &chars[1..])
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Runtime evaluator for one parsed query
///
/// Owns one scalar/aggregate function instance per `Function` node and a
/// per-row alias cache. `begin_row` must be called before each row;
/// `set_final_pass(true)` switches aggregate calls from accumulation to
/// result production.
pub struct Evaluator {
    scalars: Vec<Option<Box<dyn ScalarFunction>>>,
    aggregates: Vec<Option<Box<dyn AggregateFunction>>>,
    /// For `Identifier` nodes naming a projection alias: the aliased expression
    alias_targets: Vec<Option<ExprId>>,
    /// Pre-compiled patterns for `Like` nodes with a literal pattern
    like_patterns: Vec<Option<LikePattern>>,
    /// Per-row cache of alias values, keyed by target expression id
    alias_cache: Vec<Option<Value>>,
    /// Alias targets currently being resolved, for cycle detection
    resolving: Vec<u32>,
    final_pass: bool,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("scalars", &self.scalars.len())
            .field("aggregates", &self.aggregates.len())
            .field("alias_targets", &self.alias_targets)
            .field("like_patterns", &self.like_patterns.len())
            .field("alias_cache", &self.alias_cache)
            .field("resolving", &self.resolving)
            .field("final_pass", &self.final_pass)
            .finish()
    }
}

impl Evaluator {
    /// Build the side tables for a validated query
    ///
    /// Resolves every function call against the registry (unknown names
    /// and wrong arities fail here, before any row runs) and records
    /// which identifiers name projection aliases.
    pub fn new(query: &ParsedQuery) -> Result<Self> {
        let arena = &query.arena;
        let registry = global_registry();
        let len = arena.len();

        let mut scalars: Vec<Option<Box<dyn ScalarFunction>>> = Vec::with_capacity(len);
        let mut aggregates: Vec<Option<Box<dyn AggregateFunction>>> = Vec::with_capacity(len);
        let mut alias_targets: Vec<Option<ExprId>> = Vec::with_capacity(len);
        let mut like_patterns: Vec<Option<LikePattern>> = Vec::with_capacity(len);

        for index in 0..len {
            let id = ExprId(index as u32);
            let mut scalar = None;
            let mut aggregate = None;
            let mut alias_target = None;
            let mut like_pattern = None;

            match arena.node(id) {
                ExprNode::Function { name, args } => {
                    if let Some(instance) = registry.get_aggregate(name) {
                        instance
                            .info()
                            .signature
                            .validate_arg_count(name, args.len())?;
                        aggregate = Some(instance);
                    } else if let Some(instance) = registry.get_scalar(name) {
                        instance
                            .info()
                            .signature
                            .validate_arg_count(name, args.len())?;
                        scalar = Some(instance);
                    } else {
                        return Err(Error::UnknownFunction(name.clone()));
                    }
                }
                ExprNode::Identifier(name) => {
                    alias_target = query.aliases.get(&name.to_lowercase()).copied();
                }
                ExprNode::Like {
                    pattern, escape, ..
                } => {
                    like_pattern = compile_literal_pattern(arena, *pattern, *escape)?;
                }
                _ => {}
            }

            scalars.push(scalar);
            aggregates.push(aggregate);
            alias_targets.push(alias_target);
            like_patterns.push(like_pattern);
        }

        Ok(Evaluator {
            scalars,
            aggregates,
            alias_targets,
            like_patterns,
            alias_cache: vec![None; len],
            resolving: Vec::new(),
            final_pass: false,
        })
    }

    /// Invalidate the per-row alias cache; call before evaluating a row
    pub fn begin_row(&mut self) {
        for slot in &mut self.alias_cache {
            *slot = None;
        }
        self.resolving.clear();
    }

    /// Switch aggregate calls between accumulation and result production
    pub fn set_final_pass(&mut self, final_pass: bool) {
        self.final_pass = final_pass;
    }

    /// Reset every aggregate accumulator for a fresh run
    pub fn reset_aggregates(&mut self) {
        for slot in self.aggregates.iter_mut().flatten() {
            slot.reset();
        }
        self.final_pass = false;
    }

    /// Evaluate one expression against the current row
    pub fn eval(&mut self, arena: &ExprArena, id: ExprId, ctx: &RowContext) -> Result<Value> {
        match arena.node(id) {
            ExprNode::Literal(value) => Ok(value.clone()),

            ExprNode::Column(column) => match column {
                ColumnRef::Position(pos) => ctx.column_by_position(*pos).cloned(),
                ColumnRef::Name(name) => ctx.column_by_name(name).cloned(),
                // bare `*` only reaches evaluation inside count(*)
                ColumnRef::Star => Ok(Value::Boolean(true)),
            },

            ExprNode::Identifier(name) => match self.alias_targets[id.index()] {
                Some(target) => self.eval_alias(arena, name, target, ctx),
                None => ctx.column_by_name(name).cloned(),
            },

            ExprNode::Arith { op, lhs, rhs } => {
                let l = self.eval(arena, *lhs, ctx)?;
                let r = self.eval(arena, *rhs, ctx)?;
                if l.is_null() || r.is_null() {
                    return Ok(Value::null_unknown());
                }
                match op {
                    ArithOp::Add => l.add(&r),
                    ArithOp::Sub => l.sub(&r),
                    ArithOp::Mul => l.mul(&r),
                    ArithOp::Div => l.div(&r),
                    ArithOp::Mod => l.modulo(&r),
                    ArithOp::Pow => l.pow(&r),
                }
            }

            ExprNode::Neg(expr) => {
                let v = self.eval(arena, *expr, ctx)?;
                if v.is_null() {
                    return Ok(Value::null_unknown());
                }
                v.negate()
            }

            ExprNode::Compare { op, lhs, rhs } => {
                let l = self.eval(arena, *lhs, ctx)?;
                let r = self.eval(arena, *rhs, ctx)?;
                match l.compare(&r)? {
                    None => Ok(Value::null(DataType::Boolean)),
                    Some(ordering) => Ok(Value::Boolean(compare_holds(*op, ordering))),
                }
            }

            ExprNode::Logical { op, lhs, rhs } => {
                let l = truth(&self.eval(arena, *lhs, ctx)?)?;
                // short-circuit on the dominant operand
                match (op, l) {
                    (LogicalOp::And, Some(false)) => return Ok(Value::Boolean(false)),
                    (LogicalOp::Or, Some(true)) => return Ok(Value::Boolean(true)),
                    _ => {}
                }
                let r = truth(&self.eval(arena, *rhs, ctx)?)?;
                Ok(combine_logical(*op, l, r))
            }

            ExprNode::Not(expr) => {
                let v = truth(&self.eval(arena, *expr, ctx)?)?;
                Ok(match v {
                    Some(b) => Value::Boolean(!b),
                    None => Value::null(DataType::Boolean),
                })
            }

            ExprNode::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let v = self.eval(arena, *expr, ctx)?;
                let lo = self.eval(arena, *low, ctx)?;
                let hi = self.eval(arena, *high, ctx)?;
                let above = v.compare(&lo)?.map(|o| o != Ordering::Less);
                let below = v.compare(&hi)?.map(|o| o != Ordering::Greater);
                let result = combine_logical(LogicalOp::And, above, below);
                if *negated {
                    invert(result)
                } else {
                    Ok(result)
                }
            }

            ExprNode::InList {
                expr,
                list,
                negated,
            } => {
                let v = self.eval(arena, *expr, ctx)?;
                let mut saw_null = false;
                let mut found = false;
                for item in list {
                    let candidate = self.eval(arena, *item, ctx)?;
                    match v.compare(&candidate)? {
                        None => saw_null = true,
                        Some(Ordering::Equal) => {
                            found = true;
                            break;
                        }
                        Some(_) => {}
                    }
                }
                let result = if found {
                    Value::Boolean(true)
                } else if saw_null {
                    Value::null(DataType::Boolean)
                } else {
                    Value::Boolean(false)
                };
                if *negated {
                    invert(result)
                } else {
                    Ok(result)
                }
            }

            ExprNode::Like {
                expr,
                pattern,
                escape,
                negated,
            } => {
                let v = self.eval(arena, *expr, ctx)?;
                if v.is_null() {
                    return Ok(Value::null(DataType::Boolean));
                }
                let text = v.to_string();
                let matched = match self.like_patterns[id.index()].clone() {
                    Some(compiled) => compiled.matches(&text),
                    None => {
                        let p = self.eval(arena, *pattern, ctx)?;
                        if p.is_null() {
                            return Ok(Value::null(DataType::Boolean));
                        }
                        let escape_char = match escape {
                            Some(e) => {
                                let ev = self.eval(arena, *e, ctx)?;
                                Some(escape_char_of(&ev)?)
                            }
                            None => None,
                        };
                        LikePattern::compile(&p.to_string(), escape_char)?.matches(&text)
                    }
                };
                Ok(Value::Boolean(matched != *negated))
            }

            ExprNode::IsNull { expr, negated } => {
                let v = self.eval(arena, *expr, ctx)?;
                Ok(Value::Boolean(v.is_null() != *negated))
            }

            ExprNode::Case {
                operand,
                branches,
                else_expr,
            } => self.eval_case(arena, *operand, branches, *else_expr, ctx),

            ExprNode::Function { name, args } => {
                if self.aggregates[id.index()].is_some() {
                    self.eval_aggregate(arena, id, args, ctx)
                } else {
                    let mut values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len());
                    for arg in args {
                        values.push(self.eval(arena, *arg, ctx)?);
                    }
                    match &self.scalars[id.index()] {
                        Some(f) => f.evaluate(&values),
                        None => Err(Error::UnknownFunction(name.clone())),
                    }
                }
            }
        }
    }

    fn eval_alias(
        &mut self,
        arena: &ExprArena,
        name: &str,
        target: ExprId,
        ctx: &RowContext,
    ) -> Result<Value> {
        if let Some(cached) = &self.alias_cache[target.index()] {
            return Ok(cached.clone());
        }
        if self.resolving.contains(&target.0) {
            return Err(Error::CyclicAlias(name.to_string()));
        }
        self.resolving.push(target.0);
        let result = self.eval(arena, target, ctx);
        self.resolving.pop();
        let value = result?;
        self.alias_cache[target.index()] = Some(value.clone());
        Ok(value)
    }

    fn eval_case(
        &mut self,
        arena: &ExprArena,
        operand: Option<ExprId>,
        branches: &[(ExprId, ExprId)],
        else_expr: Option<ExprId>,
        ctx: &RowContext,
    ) -> Result<Value> {
        match operand {
            Some(op_id) => {
                let subject = self.eval(arena, op_id, ctx)?;
                for (when, then) in branches {
                    let candidate = self.eval(arena, *when, ctx)?;
                    if subject.compare(&candidate)? == Some(Ordering::Equal) {
                        return self.eval(arena, *then, ctx);
                    }
                }
            }
            None => {
                for (when, then) in branches {
                    if truth(&self.eval(arena, *when, ctx)?)? == Some(true) {
                        return self.eval(arena, *then, ctx);
                    }
                }
            }
        }
        match else_expr {
            Some(e) => self.eval(arena, e, ctx),
            None => Ok(Value::null_unknown()),
        }
    }

    /// Aggregate call: accumulate while rows stream, produce on the
    /// final pass. `count(*)` and `count()` advance on every row.
    fn eval_aggregate(
        &mut self,
        arena: &ExprArena,
        id: ExprId,
        args: &[ExprId],
        ctx: &RowContext,
    ) -> Result<Value> {
        if self.final_pass {
            return match &self.aggregates[id.index()] {
                Some(agg) => Ok(agg.result()),
                None => Err(Error::internal("aggregate table out of sync")),
            };
        }
        let value = match args.first() {
            None => Value::Boolean(true),
            Some(arg) if matches!(arena.node(*arg), ExprNode::Column(ColumnRef::Star)) => {
                Value::Boolean(true)
            }
            Some(arg) => self.eval(arena, *arg, ctx)?,
        };
        if let Some(agg) = self.aggregates[id.index()].as_mut() {
            agg.accumulate(&value);
        }
        Ok(Value::null_unknown())
    }
}

fn compile_literal_pattern(
    arena: &ExprArena,
    pattern: ExprId,
    escape: Option<ExprId>,
) -> Result<Option<LikePattern>> {
    let pattern_text = match arena.node(pattern) {
        ExprNode::Literal(Value::Text(s)) => s.to_string(),
        _ => return Ok(None),
    };
    let escape_char = match escape {
        None => None,
        Some(e) => match arena.node(e) {
            ExprNode::Literal(v) => Some(escape_char_of(v)?),
            _ => return Ok(None),
        },
    };
    LikePattern::compile(&pattern_text, escape_char).map(Some)
}

fn escape_char_of(value: &Value) -> Result<char> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::invalid_argument("LIKE escape must be a string"))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::invalid_argument(
            "LIKE escape must be a single character",
        )),
    }
}

/// Three-valued truth of a value: NULL is None, non-boolean is an error
fn truth(value: &Value) -> Result<Option<bool>> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_boolean()
        .map(Some)
        .ok_or_else(|| Error::evaluation(format!("expected a boolean, got {}", value.data_type())))
}

fn combine_logical(op: LogicalOp, l: Option<bool>, r: Option<bool>) -> Value {
    let result = match op {
        LogicalOp::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        LogicalOp::Or => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    match result {
        Some(b) => Value::Boolean(b),
        None => Value::null(DataType::Boolean),
    }
}

fn invert(value: Value) -> Result<Value> {
    Ok(match truth(&value)? {
        Some(b) => Value::Boolean(!b),
        None => Value::null(DataType::Boolean),
    })
}

fn compare_holds(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}
