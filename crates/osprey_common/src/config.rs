use serde::{Deserialize, Serialize};

fn default_plan_cache_capacity() -> usize {
    5000
}

/// Router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// The cell this router serves; passed to every topology lookup.
    pub cell: String,
    /// Bounded plan cache size.
    #[serde(default = "default_plan_cache_capacity")]
    pub plan_cache_capacity: usize,
}

impl RouterConfig {
    pub fn new(cell: impl Into<String>) -> Self {
        RouterConfig {
            cell: cell.into(),
            plan_cache_capacity: default_plan_cache_capacity(),
        }
    }

    pub fn with_plan_cache_capacity(mut self, capacity: usize) -> Self {
        self.plan_cache_capacity = capacity;
        self
    }
}
