//! Runtime configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assets::catalog::MODEL_REPO_BASE;

/// Prompt used when the caller submits an empty one.
pub const DEFAULT_PROMPT: &str = "describe the image in detail";

/// Configuration for the runtime.
///
/// Every field has a sensible default; `RuntimeConfig::default()` matches
/// the shipped application. Overrides exist for embedders and tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Root under which `cpm/` and `temp/` live. The platform documents
    /// directory when unset.
    pub documents_dir: Option<PathBuf>,
    /// Base URL of the repository the asset catalog points at.
    pub model_repo_base: String,
    /// Fallback prompt for empty submissions.
    pub default_prompt: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            documents_dir: None,
            model_repo_base: MODEL_REPO_BASE.to_string(),
            default_prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}
