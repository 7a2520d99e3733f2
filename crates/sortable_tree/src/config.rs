use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortableTreeConfig {
    /// Pixels per depth level. Horizontal drag distance is divided by this to get a depth change.
    pub indentation_width: f32,
    /// How long the flat list stays frozen after a commit while the host re-renders.
    pub settle_delay_ms: u64,
    pub collapsible: bool,
    pub removable: bool,
    /// Allow dropping a node as the child of a leaf.
    pub nest_under_leaves: bool,
    /// Prefix for generated group names, `"{prefix} N"`.
    pub default_group_prefix: String,
}

impl Default for SortableTreeConfig {
    fn default() -> Self {
        Self {
            indentation_width: 50.0,
            settle_delay_ms: 50,
            collapsible: true,
            removable: true,
            nest_under_leaves: false,
            default_group_prefix: "Group".to_string(),
        }
    }
}

impl SortableTreeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.indentation_width.is_finite() && self.indentation_width > 0.0) {
            return Err(ConfigError::InvalidIndentation(self.indentation_width));
        }
        Ok(())
    }

    pub fn indentation_width(mut self, indentation_width: f32) -> Self {
        self.indentation_width = indentation_width;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn nest_under_leaves(mut self, nest_under_leaves: bool) -> Self {
        self.nest_under_leaves = nest_under_leaves;
        self
    }

    pub fn settle_delay_duration(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
