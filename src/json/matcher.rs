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

//! Per-variable JSON path matching
//!
//! One matcher per JSON variable the statement references. The matcher
//! walks the live document in lock-step with the decoder: every container
//! or value the decoder enters inside the current row is offered as a
//! step, and the matcher advances, goes dead, or stays transparent.
//! Leaving a step undoes its effect, so after a final-segment match the
//! matcher regresses one state and a later sibling occurrence re-matches
//! and overwrites.

use crate::core::{Error, Result};

/// One required step of a variable path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A required object key, matched case-insensitively
    Key(String),
    /// A required zero-based array index
    Index(usize),
}

/// Parse a dotted variable path like `a.b[3].c` into segments
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        if part.is_empty() {
            return Err(Error::invalid_argument(format!(
                "empty path segment in '{}'",
                path
            )));
        }
        let (key, rest) = match part.find('[') {
            Some(at) => (&part[..at], &part[at..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(PathSegment::Key(key.to_string()));
        }
        let mut remainder = rest;
        while let Some(stripped) = remainder.strip_prefix('[') {
            let close = stripped.find(']').ok_or_else(|| {
                Error::invalid_argument(format!("unterminated index in '{}'", path))
            })?;
            let index: usize = stripped[..close].parse().map_err(|_| {
                Error::invalid_argument(format!("bad array index in '{}'", path))
            })?;
            segments.push(PathSegment::Index(index));
            remainder = &stripped[close + 1..];
        }
        if !remainder.is_empty() {
            return Err(Error::invalid_argument(format!(
                "malformed path segment in '{}'",
                path
            )));
        }
    }
    if segments.is_empty() {
        return Err(Error::invalid_argument("empty variable path"));
    }
    Ok(segments)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    /// The step matched the active segment and advanced the state
    Advanced,
    /// The step mismatched; everything below it is a dead end
    Dead,
    /// An anonymous wrapper between key segments; no state change
    Transparent,
}

/// Incremental matcher for one variable path
#[derive(Debug, Clone)]
pub struct PathMatcher {
    segments: Vec<PathSegment>,
    /// Index of the next segment to satisfy
    current_state: usize,
    /// Depth of steps taken below a mismatch
    dead_depth: usize,
    /// The effect of every step not yet left
    steps: Vec<StepKind>,
}

impl PathMatcher {
    /// Create a matcher for the given segments
    pub fn new(segments: Vec<PathSegment>) -> Self {
        PathMatcher {
            current_state: 0,
            dead_depth: 0,
            steps: Vec::with_capacity(segments.len() + 4),
            segments,
        }
    }

    /// Offer an object-member step bound to `key`
    pub fn enter_key(&mut self, key: &str) {
        let kind = if self.dead_depth > 0 || self.current_state == self.segments.len() {
            self.dead_depth += 1;
            StepKind::Dead
        } else {
            match &self.segments[self.current_state] {
                PathSegment::Key(required) if required.eq_ignore_ascii_case(key) => {
                    self.current_state += 1;
                    StepKind::Advanced
                }
                _ => {
                    self.dead_depth = 1;
                    StepKind::Dead
                }
            }
        };
        self.steps.push(kind);
    }

    /// Offer an array-element step with the element's running index
    ///
    /// An array element where a key segment is expected is an anonymous
    /// wrapper and stays transparent: key distance ignores it.
    pub fn enter_index(&mut self, index: usize) {
        let kind = if self.dead_depth > 0 || self.current_state == self.segments.len() {
            self.dead_depth += 1;
            StepKind::Dead
        } else {
            match &self.segments[self.current_state] {
                PathSegment::Index(required) => {
                    if *required == index {
                        self.current_state += 1;
                        StepKind::Advanced
                    } else {
                        self.dead_depth = 1;
                        StepKind::Dead
                    }
                }
                PathSegment::Key(_) => StepKind::Transparent,
            }
        };
        self.steps.push(kind);
    }

    /// Undo the most recent step
    pub fn leave(&mut self) {
        match self.steps.pop() {
            Some(StepKind::Advanced) => self.current_state -= 1,
            Some(StepKind::Dead) => self.dead_depth -= 1,
            Some(StepKind::Transparent) | None => {}
        }
    }

    /// True when every segment is satisfied by the steps taken so far
    pub fn is_match(&self) -> bool {
        self.dead_depth == 0 && self.current_state == self.segments.len()
    }

    /// Forget all progress at a row boundary
    pub fn reset(&mut self) {
        self.current_state = 0;
        self.dead_depth = 0;
        self.steps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(parts: &[&str]) -> Vec<PathSegment> {
        parts.iter().map(|p| PathSegment::Key(p.to_string())).collect()
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("a.b").unwrap(),
            vec![
                PathSegment::Key("a".to_string()),
                PathSegment::Key("b".to_string())
            ]
        );
        assert_eq!(
            parse_path("arr[3].name").unwrap(),
            vec![
                PathSegment::Key("arr".to_string()),
                PathSegment::Index(3),
                PathSegment::Key("name".to_string())
            ]
        );
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("a[x]").is_err());
        assert!(parse_path("a[1").is_err());
    }

    #[test]
    fn test_simple_key_match() {
        let mut m = PathMatcher::new(keys(&["a"]));
        m.enter_key("a");
        assert!(m.is_match());
        m.leave();
        assert!(!m.is_match());
        // sibling re-match after regress
        m.enter_key("a");
        assert!(m.is_match());
    }

    #[test]
    fn test_nested_keys() {
        let mut m = PathMatcher::new(keys(&["a", "b"]));
        m.enter_key("a");
        assert!(!m.is_match());
        m.enter_key("b");
        assert!(m.is_match());
        m.leave();
        m.enter_key("c");
        assert!(!m.is_match());
        m.leave();
        m.leave();
    }

    #[test]
    fn test_dead_end_blocks_descendants() {
        let mut m = PathMatcher::new(keys(&["a", "b"]));
        m.enter_key("x");
        // a `b` below the wrong branch must not match
        m.enter_key("a");
        m.enter_key("b");
        assert!(!m.is_match());
        m.leave();
        m.leave();
        m.leave();
        m.enter_key("a");
        m.enter_key("b");
        assert!(m.is_match());
    }

    #[test]
    fn test_array_index_match() {
        let mut m = PathMatcher::new(vec![
            PathSegment::Key("arr".to_string()),
            PathSegment::Index(1),
            PathSegment::Key("v".to_string()),
        ]);
        m.enter_key("arr");
        m.enter_index(0);
        m.enter_key("v");
        assert!(!m.is_match());
        m.leave();
        m.leave();
        m.enter_index(1);
        m.enter_key("v");
        assert!(m.is_match());
    }

    #[test]
    fn test_anonymous_wrapper_is_transparent() {
        let mut m = PathMatcher::new(keys(&["a", "b"]));
        m.enter_key("a");
        // unnamed array between a and b does not add key distance
        m.enter_index(0);
        m.enter_key("b");
        assert!(m.is_match());
        m.leave();
        m.leave();
        m.leave();
    }

    #[test]
    fn test_descent_below_full_match_is_dead() {
        let mut m = PathMatcher::new(keys(&["a"]));
        m.enter_key("a");
        m.enter_key("deep");
        assert!(!m.is_match());
        m.leave();
        assert!(m.is_match());
    }

    #[test]
    fn test_key_match_is_case_insensitive() {
        let mut m = PathMatcher::new(keys(&["Name"]));
        m.enter_key("name");
        assert!(m.is_match());
    }
}
