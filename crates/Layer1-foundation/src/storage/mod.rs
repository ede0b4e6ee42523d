//! Storage module for Orca
//!
//! - `json`: JSON files under the global config dir or a project's `.orca/`

mod json;

pub use json::{JsonStore, APP_DIR, PROJECT_DIR};
