//! Hierarchy configuration.

use serde::Deserialize;

/// Tunables for a [`Hierarchy`](crate::Hierarchy).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Zone names may not start with this character. World and universe
    /// host names carry it so the three namespaces never collide.
    pub reserved_prefix: char,
    /// Deepest recursion allowed while resolving priority collisions.
    pub max_cascade_depth: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: '_',
            max_cascade_depth: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HierarchyConfig = serde_json::from_str(r#"{"max_cascade_depth": 8}"#).unwrap();
        assert_eq!(config.max_cascade_depth, 8);
        assert_eq!(config.reserved_prefix, '_');
    }
}
