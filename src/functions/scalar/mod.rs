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

//! Scalar functions
//!
//! Per-row functions: string manipulation, type casts, date/time and
//! NULL-handling utilities. Every scalar function propagates NULL inputs
//! to a NULL output unless its whole purpose is NULL handling.

mod conversion;
mod datetime;
mod string;
mod utility;

pub use conversion::{FloatCastFunction, IntCastFunction, StringCastFunction};
pub use datetime::{
    DateAddFunction, DateDiffFunction, ExtractFunction, ToTimestampFunction, UtcNowFunction,
};
pub use string::{
    CharLengthFunction, LowerFunction, LtrimFunction, RtrimFunction, SubstringFunction,
    TrimFunction, UpperFunction,
};
pub use utility::{CoalesceFunction, NullIfFunction};
