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

//! Version information for Streamsel

/// The crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The git commit hash the crate was built from, set by the build
/// script; "unknown" outside a git checkout
pub const GIT_COMMIT: &str = match option_env!("STREAMSEL_GIT_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

/// Version string including the git commit
pub fn version_info() -> String {
    format!("streamsel {} ({})", VERSION, GIT_COMMIT)
}
