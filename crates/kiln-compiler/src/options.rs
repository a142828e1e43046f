//! Compiler configuration

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Options controlling which passes run after lowering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Run the implicit coercion pass
    pub insert_implicit_casts: bool,
    /// Check parent links and sharing on the finished tree
    pub verify_tree: bool,
    /// Name of the module node, overriding the source module's name
    pub module_name: Option<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            insert_implicit_casts: true,
            verify_tree: true,
            module_name: None,
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_implicit_casts(mut self, enabled: bool) -> Self {
        self.insert_implicit_casts = enabled;
        self
    }

    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_tree = enabled;
        self
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    /// Parse options from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> CompileResult<Self> {
        serde_json::from_str(json).map_err(|e| CompileError::InvalidOptions {
            message: e.to_string(),
        })
    }

    pub fn to_json(&self) -> CompileResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CompileError::InvalidOptions {
            message: e.to_string(),
        })
    }
}
