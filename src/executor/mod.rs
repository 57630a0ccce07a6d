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

//! Row-driving evaluation
//!
//! Ties decoded rows to expression evaluation under predicate,
//! aggregate, and LIMIT policy, and serializes passing rows.

mod engine;
mod evaluate;
mod output;

pub use engine::{run_source, QueryEngine, RowSource, ScanStatus, MAX_RECOVERABLE_ERRORS};
pub use evaluate::Evaluator;
pub use output::{OutputFormat, OutputOptions, RecordWriter};
