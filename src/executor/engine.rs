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

//! Row-driving execution
//!
//! One `QueryEngine` serves one query against one stream. Per row:
//! evaluate the predicate (absence passes), on pass evaluate projections
//! and serialize, then check LIMIT. Aggregates advance only on passing
//! rows and finalize exactly once, at end of stream or at the LIMIT
//! boundary.

use crate::core::{ColumnNames, Error, Result, RowContext};
use crate::executor::evaluate::Evaluator;
use crate::executor::output::{OutputFormat, OutputOptions, RecordWriter};
use crate::parser::{ColumnRef, ExprNode, ParsedQuery};

/// Hard cap on recoverable per-row errors before the run aborts
pub const MAX_RECOVERABLE_ERRORS: usize = 100;

/// Outcome of one streaming call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// More input may follow
    Continue,
    /// LIMIT was reached; no further input will be consumed
    LimitReached,
    /// The final chunk was fully processed
    EndOfStream,
}

/// Pull-based row provider, the contract a format adapter implements
///
/// `fetch_next_row` advances to the next row and reports how many
/// columns it bound, or `None` at end of stream; `row` exposes the
/// current row for evaluation. Column access goes through
/// [`RowContext`], by zero-based position or case-insensitive name.
pub trait RowSource {
    /// Advance to the next row; the bound column count, or None at end
    fn fetch_next_row(&mut self) -> Result<Option<usize>>;

    /// Borrow the current row
    fn row(&self) -> RowContext<'_>;
}

/// Per-row execution state for one query over one stream
#[derive(Debug)]
pub struct QueryEngine {
    query: ParsedQuery,
    evaluator: Evaluator,
    writer: RecordWriter,
    output_names: Vec<String>,
    /// The projection list is a lone `*`
    star: bool,
    rows_emitted: u64,
    error_count: usize,
    finalized: bool,
}

impl QueryEngine {
    /// Build the engine for a validated query
    pub fn new(query: ParsedQuery, output: OutputOptions) -> Result<Self> {
        let evaluator = Evaluator::new(&query)?;
        let output_names = output_names_of(&query);
        let star = query.projections.len() == 1
            && matches!(
                query.arena.node(query.projections[0].expr),
                ExprNode::Column(ColumnRef::Star)
            );
        Ok(QueryEngine {
            query,
            evaluator,
            writer: RecordWriter::new(output),
            output_names,
            star,
            rows_emitted: 0,
            error_count: 0,
            finalized: false,
        })
    }

    /// The query this engine runs
    pub fn query(&self) -> &ParsedQuery {
        &self.query
    }

    /// True once aggregates have been finalized or LIMIT was reached
    pub fn is_finished(&self) -> bool {
        self.finalized
    }

    /// Reject a header column set that an alias would shadow
    pub fn check_header(&self, names: &ColumnNames) -> Result<()> {
        for alias in self.query.aliases.keys() {
            if names.contains(alias) {
                return Err(Error::AliasShadowsColumn(alias.clone()));
            }
        }
        Ok(())
    }

    /// Run one decoded row through predicate, projection, and LIMIT
    ///
    /// A recoverable evaluation error abandons the row and counts toward
    /// the run-level error cap; tokenization of later rows is unaffected.
    pub fn process_row(&mut self, ctx: &RowContext, out: &mut String) -> Result<ScanStatus> {
        if self.finalized {
            return Err(Error::RowAfterFinalize);
        }
        if self.query.limit == Some(0) {
            self.finalize(out)?;
            return Ok(ScanStatus::LimitReached);
        }
        self.evaluator.begin_row();

        match self.row_passes(ctx) {
            Ok(false) => return Ok(ScanStatus::Continue),
            Ok(true) => {}
            Err(err) => {
                self.note_recoverable(err)?;
                return Ok(ScanStatus::Continue);
            }
        }

        if self.query.aggregate {
            // accumulation pass; projection output is discarded
            for i in 0..self.query.projections.len() {
                let expr = self.query.projections[i].expr;
                if let Err(err) = self.evaluator.eval(&self.query.arena, expr, ctx) {
                    self.note_recoverable(err)?;
                    return Ok(ScanStatus::Continue);
                }
            }
        } else if self.star {
            // `select *` serializes every column of the row as-is
            if self.writer.format() == OutputFormat::TaggedJson {
                let names = star_names(ctx);
                self.writer.write_record(&names, ctx.fields(), out);
            } else {
                self.writer.write_record(&self.output_names, ctx.fields(), out);
            }
        } else {
            let mut values = Vec::with_capacity(self.query.projections.len());
            for i in 0..self.query.projections.len() {
                let expr = self.query.projections[i].expr;
                match self.evaluator.eval(&self.query.arena, expr, ctx) {
                    Ok(v) => values.push(v),
                    Err(err) => {
                        self.note_recoverable(err)?;
                        return Ok(ScanStatus::Continue);
                    }
                }
            }
            self.writer.write_record(&self.output_names, &values, out);
        }

        self.rows_emitted += 1;
        if let Some(limit) = self.query.limit {
            if self.rows_emitted >= limit {
                // the boundary row's contribution is already accumulated
                self.finalize(out)?;
                return Ok(ScanStatus::LimitReached);
            }
        }
        Ok(ScanStatus::Continue)
    }

    /// End of stream: finalize aggregates and emit the single record
    pub fn finish(&mut self, out: &mut String) -> Result<ScanStatus> {
        if !self.finalized {
            self.finalize(out)?;
        }
        Ok(ScanStatus::EndOfStream)
    }

    fn finalize(&mut self, out: &mut String) -> Result<()> {
        self.finalized = true;
        if !self.query.aggregate {
            return Ok(());
        }
        self.evaluator.set_final_pass(true);
        self.evaluator.begin_row();
        let ctx = RowContext::new(&[], None);
        let mut values = Vec::with_capacity(self.query.projections.len());
        for i in 0..self.query.projections.len() {
            let expr = self.query.projections[i].expr;
            values.push(self.evaluator.eval(&self.query.arena, expr, &ctx)?);
        }
        self.writer.write_record(&self.output_names, &values, out);
        Ok(())
    }

    fn row_passes(&mut self, ctx: &RowContext) -> Result<bool> {
        let predicate = match self.query.predicate {
            Some(p) => p,
            None => return Ok(true),
        };
        let value = self.evaluator.eval(&self.query.arena, predicate, ctx)?;
        if value.is_null() {
            return Ok(false);
        }
        match value.as_boolean() {
            Some(b) => Ok(b),
            None => Err(Error::evaluation(format!(
                "WHERE clause evaluated to {}, not a boolean",
                value.data_type()
            ))),
        }
    }

    fn note_recoverable(&mut self, err: Error) -> Result<()> {
        if !err.is_recoverable() {
            return Err(err);
        }
        self.error_count += 1;
        if self.error_count > MAX_RECOVERABLE_ERRORS {
            return Err(Error::ErrorLimitReached(MAX_RECOVERABLE_ERRORS));
        }
        Ok(())
    }
}

/// Run a pull-based row source to completion
pub fn run_source<S: RowSource>(
    source: &mut S,
    engine: &mut QueryEngine,
    out: &mut String,
) -> Result<ScanStatus> {
    loop {
        match source.fetch_next_row()? {
            None => return engine.finish(out),
            Some(_) => {
                let ctx = source.row();
                if engine.process_row(&ctx, out)? == ScanStatus::LimitReached {
                    return Ok(ScanStatus::LimitReached);
                }
            }
        }
    }
}

/// Column tags for a `*` row: the header names when bound, else `_N`
fn star_names(ctx: &RowContext) -> Vec<String> {
    match ctx.names() {
        Some(names) if !names.is_empty() => names.names().to_vec(),
        _ => (1..=ctx.column_count()).map(|i| format!("_{}", i)).collect(),
    }
}

/// Output column tags: the alias, the referenced name, or `_N`
fn output_names_of(query: &ParsedQuery) -> Vec<String> {
    query
        .projections
        .iter()
        .enumerate()
        .map(|(i, projection)| {
            if let Some(alias) = &projection.alias {
                return alias.clone();
            }
            match query.arena.node(projection.expr) {
                ExprNode::Column(ColumnRef::Name(name)) => name.clone(),
                ExprNode::Column(ColumnRef::Position(pos)) => format!("_{}", pos + 1),
                ExprNode::Identifier(name) => name.clone(),
                _ => format!("_{}", i + 1),
            }
        })
        .collect()
}
