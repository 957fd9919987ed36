use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::models::ToolKind;
use crate::tools::Tool;

/// Maps tool identifiers to capabilities.
///
/// Owned by the composition root and shared as `Arc<ToolRegistry>`;
/// registration happens once at startup and the registry is treated as
/// read-only while pipelines run.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry keyed by the tool's identifier.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        info!("Registered tool: {}", tool.name());
        self.tools.insert(tool.kind(), tool);
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        self.tools.get(&kind).cloned()
    }

    pub fn get_all(&self) -> HashMap<ToolKind, Arc<dyn Tool>> {
        self.tools.clone()
    }

    pub fn clear(&mut self) {
        self.tools.clear();
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::error::Result;
    use crate::models::ToolResult;

    struct FakeTool {
        kind: ToolKind,
        name: &'static str,
    }

    #[async_trait]
    impl Tool for FakeTool {
        fn kind(&self) -> ToolKind {
            self.kind
        }

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "fake"
        }

        async fn execute(&self, _params: &Value) -> Result<ToolResult> {
            Ok(ToolResult::ok(self.kind, Value::Null))
        }
    }

    #[test]
    fn register_get_and_clear() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(FakeTool {
            kind: ToolKind::Github,
            name: "first",
        }));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(ToolKind::Github).is_some());
        assert!(registry.get(ToolKind::Weather).is_none());

        // Re-registering the same kind overwrites.
        registry.register(Arc::new(FakeTool {
            kind: ToolKind::Github,
            name: "second",
        }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(ToolKind::Github).unwrap().name(), "second");

        registry.clear();
        assert!(registry.is_empty());
    }
}
