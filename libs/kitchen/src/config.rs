//! Kitchen topology configuration.
//!
//! The topology is read once at startup from a YAML document and is
//! immutable afterwards. Schema:
//!
//! ```yaml
//! kitchen:
//!   minimize_decay: true
//!   topology:
//!     - name: hot
//!       type: static
//!       capacity: 15
//!       decay_rate: 1.0
//!       supported: [hot]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Shelf variant identifier. `static` is the only variant today and the
/// default when `type` is omitted.
pub const SHELF_TYPE_STATIC: &str = "static";

/// Top-level document wrapper; subsystems own their top-level key.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    kitchen: KitchenConfig,
}

/// Kitchen configuration: the shelf topology and the optimizer flag.
#[derive(Debug, Clone, Deserialize)]
pub struct KitchenConfig {
    /// Whether the background decay minimizer runs.
    #[serde(default)]
    pub minimize_decay: bool,

    /// Shelf descriptors, in declaration order.
    pub topology: Vec<ShelfConfig>,
}

/// One shelf descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct ShelfConfig {
    /// Unique label within the topology.
    pub name: String,

    /// Shelf variant; only `static` exists.
    #[serde(rename = "type", default = "default_shelf_type")]
    pub kind: String,

    /// Maximum concurrent order count.
    pub capacity: usize,

    /// Decay contribution per second on this shelf.
    pub decay_rate: f64,

    /// Temperature categories this shelf accepts.
    pub supported: Vec<String>,
}

fn default_shelf_type() -> String {
    SHELF_TYPE_STATIC.to_string()
}

impl KitchenConfig {
    /// Load and validate a topology from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a topology from a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        file.kitchen.validate()?;
        Ok(file.kitchen)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for shelf in &self.topology {
            if !names.insert(shelf.name.as_str()) {
                return Err(ConfigError::DuplicateShelf(shelf.name.clone()));
            }
            if !shelf.kind.eq_ignore_ascii_case(SHELF_TYPE_STATIC) {
                return Err(ConfigError::UnknownShelfType {
                    shelf: shelf.name.clone(),
                    kind: shelf.kind.clone(),
                });
            }
            if shelf.capacity == 0 {
                return Err(ConfigError::InvalidShelf {
                    shelf: shelf.name.clone(),
                    reason: "capacity must be positive".to_string(),
                });
            }
            if !shelf.decay_rate.is_finite() || shelf.decay_rate < 0.0 {
                return Err(ConfigError::InvalidShelf {
                    shelf: shelf.name.clone(),
                    reason: "decay_rate must be finite and non-negative".to_string(),
                });
            }
            if shelf.supported.is_empty() {
                return Err(ConfigError::InvalidShelf {
                    shelf: shelf.name.clone(),
                    reason: "supported temperatures must be non-empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
kitchen:
  topology:
    - name: hot
      capacity: 1
      decay_rate: 1
      supported:
        - hot
    - name: cold
      capacity: 1
      decay_rate: 0.5
      supported:
        - cold
"#;

    #[test]
    fn test_parse_simple_topology() {
        let cfg = KitchenConfig::from_yaml(SIMPLE).unwrap();
        assert!(!cfg.minimize_decay);
        assert_eq!(cfg.topology.len(), 2);
        assert_eq!(cfg.topology[0].name, "hot");
        assert_eq!(cfg.topology[0].kind, SHELF_TYPE_STATIC);
        assert_eq!(cfg.topology[1].decay_rate, 0.5);
    }

    #[test]
    fn test_minimize_decay_flag() {
        let yaml = r#"
kitchen:
  minimize_decay: true
  topology:
    - name: hot
      capacity: 5
      decay_rate: 1
      supported: [hot]
"#;
        let cfg = KitchenConfig::from_yaml(yaml).unwrap();
        assert!(cfg.minimize_decay);
    }

    #[test]
    fn test_duplicate_shelf_name_rejected() {
        let yaml = r#"
kitchen:
  topology:
    - name: hot
      capacity: 1
      decay_rate: 1
      supported: [hot]
    - name: hot
      capacity: 2
      decay_rate: 0.5
      supported: [hot]
"#;
        let err = KitchenConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateShelf(name) if name == "hot"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let yaml = r#"
kitchen:
  topology:
    - name: hot
      capacity: 0
      decay_rate: 1
      supported: [hot]
"#;
        assert!(matches!(
            KitchenConfig::from_yaml(yaml),
            Err(ConfigError::InvalidShelf { .. })
        ));
    }

    #[test]
    fn test_negative_decay_rejected() {
        let yaml = r#"
kitchen:
  topology:
    - name: hot
      capacity: 1
      decay_rate: -0.5
      supported: [hot]
"#;
        assert!(matches!(
            KitchenConfig::from_yaml(yaml),
            Err(ConfigError::InvalidShelf { .. })
        ));
    }

    #[test]
    fn test_unknown_shelf_type_rejected() {
        let yaml = r#"
kitchen:
  topology:
    - name: hot
      type: revolving
      capacity: 1
      decay_rate: 1
      supported: [hot]
"#;
        assert!(matches!(
            KitchenConfig::from_yaml(yaml),
            Err(ConfigError::UnknownShelfType { .. })
        ));
    }

    #[test]
    fn test_empty_supported_rejected() {
        let yaml = r#"
kitchen:
  topology:
    - name: hot
      capacity: 1
      decay_rate: 1
      supported: []
"#;
        assert!(matches!(
            KitchenConfig::from_yaml(yaml),
            Err(ConfigError::InvalidShelf { .. })
        ));
    }
}
