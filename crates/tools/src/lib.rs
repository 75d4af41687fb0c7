use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ── Tool trait and registry ──────────────────────────────────────────────────

/// Describes a single parameter that a tool accepts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolParam {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl ToolParam {
    /// Convenience constructor for a required param.
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    /// Convenience constructor for an optional param.
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Static metadata about a tool, listed to clients by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ToolParam>,
}

/// The result returned after a tool runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

/// Trait implemented by every directly callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn run(&self, args: &HashMap<String, String>) -> Result<ToolOutput>;
}

/// Central registry for all available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn list_specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.spec().name == name)
            .map(|t| t.as_ref())
    }

    /// Run the named tool.  Unknown names and tool errors both come back as
    /// an unsuccessful [`ToolOutput`] so callers always get a reply.
    pub async fn execute(&self, name: &str, args: &HashMap<String, String>) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            return ToolOutput {
                success: false,
                output: format!("unknown tool: {name}"),
            };
        };
        match tool.run(args).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(tool = name, %err, "tool execution failed");
                ToolOutput {
                    success: false,
                    output: err.to_string(),
                }
            }
        }
    }
}

// ── Movie tools ──────────────────────────────────────────────────────────────

pub mod builtins;
pub mod movies;

pub use builtins::{MovieDetailTool, SearchCatalogTool, SimilarMoviesTool, default_registry};
pub use movies::{MovieTools, Recommendation, SearchArgs, ToolSettings, UserProfile, sort_by_score};

// ── ToolRegistry tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod registry_tests {
    use super::*;
    use std::collections::HashMap;

    /// Minimal dummy tool for testing the registry.
    struct DummyTool {
        name: String,
        fail: bool,
    }

    #[async_trait]
    impl Tool for DummyTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.name.clone(),
                description: format!("Dummy tool: {}", self.name),
                params: vec![ToolParam::required("input", "test param")],
            }
        }
        async fn run(&self, _args: &HashMap<String, String>) -> Result<ToolOutput> {
            if self.fail {
                anyhow::bail!("{} exploded", self.name);
            }
            Ok(ToolOutput {
                success: true,
                output: format!("ran {}", self.name),
            })
        }
    }

    fn dummy(name: &str) -> Box<dyn Tool> {
        Box::new(DummyTool {
            name: name.into(),
            fail: false,
        })
    }

    #[test]
    fn empty_registry() {
        let reg = ToolRegistry::default();
        assert!(reg.list_specs().is_empty());
        assert!(reg.get("anything").is_none());
    }

    #[test]
    fn register_and_get() {
        let mut reg = ToolRegistry::default();
        reg.register(dummy("alpha"));
        reg.register(dummy("beta"));

        assert!(reg.get("alpha").is_some());
        assert!(reg.get("beta").is_some());
        assert!(reg.get("gamma").is_none());
        assert_eq!(reg.list_specs().len(), 2);
    }

    #[tokio::test]
    async fn execute_runs_registered_tool() {
        let mut reg = ToolRegistry::default();
        reg.register(dummy("runner"));

        let result = reg.execute("runner", &HashMap::new()).await;
        assert!(result.success);
        assert_eq!(result.output, "ran runner");
    }

    #[tokio::test]
    async fn execute_reports_unknown_and_failing_tools() {
        let mut reg = ToolRegistry::default();
        reg.register(Box::new(DummyTool {
            name: "boom".into(),
            fail: true,
        }));

        let missing = reg.execute("nope", &HashMap::new()).await;
        assert!(!missing.success);
        assert!(missing.output.contains("unknown tool"));

        let failed = reg.execute("boom", &HashMap::new()).await;
        assert!(!failed.success);
        assert_eq!(failed.output, "boom exploded");
    }
}
