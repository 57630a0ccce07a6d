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

//! Function registry
//!
//! Name to factory lookup for scalar and aggregate functions. The registry
//! is built once with every built-in registered and is immutable after
//! construction; per-query function instances come from the factories.

use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};

use super::aggregate::{AvgFunction, CountFunction, MaxFunction, MinFunction, SumFunction};
use super::scalar::{
    CharLengthFunction, CoalesceFunction, DateAddFunction, DateDiffFunction, ExtractFunction,
    FloatCastFunction, IntCastFunction, LowerFunction, LtrimFunction, NullIfFunction,
    RtrimFunction, StringCastFunction, SubstringFunction, ToTimestampFunction, TrimFunction,
    UpperFunction, UtcNowFunction,
};
use super::{AggregateFunction, FunctionInfo, ScalarFunction};

/// Global function registry instance
static GLOBAL_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Get the global function registry
#[inline]
pub fn global_registry() -> &'static FunctionRegistry {
    GLOBAL_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Type alias for aggregate function factory
type AggregateFnFactory = Arc<dyn Fn() -> Box<dyn AggregateFunction> + Send + Sync>;
/// Type alias for scalar function factory
type ScalarFnFactory = Arc<dyn Fn() -> Box<dyn ScalarFunction> + Send + Sync>;

/// Registry of the functions callable from query text
pub struct FunctionRegistry {
    aggregate_functions: FxHashMap<String, AggregateFnFactory>,
    scalar_functions: FxHashMap<String, ScalarFnFactory>,
    function_info: FxHashMap<String, FunctionInfo>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions registered
    pub fn new() -> Self {
        let mut registry = Self {
            aggregate_functions: FxHashMap::default(),
            scalar_functions: FxHashMap::default(),
            function_info: FxHashMap::default(),
        };

        // Aggregates
        registry.register_aggregate::<SumFunction>();
        registry.register_aggregate::<CountFunction>();
        registry.register_aggregate::<MinFunction>();
        registry.register_aggregate::<MaxFunction>();
        registry.register_aggregate::<AvgFunction>();

        // String functions
        registry.register_scalar::<SubstringFunction>();
        registry.register_scalar::<CharLengthFunction>();
        registry.register_scalar::<UpperFunction>();
        registry.register_scalar::<LowerFunction>();
        registry.register_scalar::<TrimFunction>();
        registry.register_scalar::<LtrimFunction>();
        registry.register_scalar::<RtrimFunction>();

        // Casts
        registry.register_scalar::<IntCastFunction>();
        registry.register_scalar::<FloatCastFunction>();
        registry.register_scalar::<StringCastFunction>();

        // Date/time functions
        registry.register_scalar::<ToTimestampFunction>();
        registry.register_scalar::<ExtractFunction>();
        registry.register_scalar::<DateAddFunction>();
        registry.register_scalar::<DateDiffFunction>();
        registry.register_scalar::<UtcNowFunction>();

        // Utility
        registry.register_scalar::<CoalesceFunction>();
        registry.register_scalar::<NullIfFunction>();

        // character_length is an alias for char_length
        if let Some(factory) = registry.scalar_functions.get("char_length").cloned() {
            registry
                .scalar_functions
                .insert("character_length".to_string(), factory);
        }
        if let Some(info) = registry.function_info.get("char_length").cloned() {
            registry
                .function_info
                .insert("character_length".to_string(), info);
        }

        registry
    }

    /// Register an aggregate function
    fn register_aggregate<F: AggregateFunction + Default + 'static>(&mut self) {
        let instance = F::default();
        let name = instance.name().to_lowercase();
        let info = instance.info();
        self.aggregate_functions
            .insert(name.clone(), Arc::new(|| Box::new(F::default())));
        self.function_info.insert(name, info);
    }

    /// Register a scalar function
    fn register_scalar<F: ScalarFunction + Default + 'static>(&mut self) {
        let instance = F::default();
        let name = instance.name().to_lowercase();
        let info = instance.info();
        self.scalar_functions
            .insert(name.clone(), Arc::new(|| Box::new(F::default())));
        self.function_info.insert(name, info);
    }

    /// Get a new instance of an aggregate function by name
    pub fn get_aggregate(&self, name: &str) -> Option<Box<dyn AggregateFunction>> {
        if let Some(f) = self.aggregate_functions.get(name) {
            return Some(f());
        }
        let lower = name.to_lowercase();
        self.aggregate_functions.get(&lower).map(|f| f())
    }

    /// Get a new instance of a scalar function by name
    pub fn get_scalar(&self, name: &str) -> Option<Box<dyn ScalarFunction>> {
        if let Some(f) = self.scalar_functions.get(name) {
            return Some(f());
        }
        let lower = name.to_lowercase();
        self.scalar_functions.get(&lower).map(|f| f())
    }

    /// Check if a function name is an aggregate function
    pub fn is_aggregate(&self, name: &str) -> bool {
        self.aggregate_functions.contains_key(name)
            || self
                .aggregate_functions
                .contains_key(name.to_lowercase().as_str())
    }

    /// Check if a function name is a scalar function
    pub fn is_scalar(&self, name: &str) -> bool {
        self.scalar_functions.contains_key(name)
            || self
                .scalar_functions
                .contains_key(name.to_lowercase().as_str())
    }

    /// Check if a function exists
    pub fn exists(&self, name: &str) -> bool {
        self.is_aggregate(name) || self.is_scalar(name)
    }

    /// Get function info by name
    pub fn get_info(&self, name: &str) -> Option<FunctionInfo> {
        let lower = name.to_lowercase();
        self.function_info.get(&lower).cloned()
    }
}
