//! Engine-level configuration.
//!
//! This crate has no configuration file of its own — the snapshot is the
//! persisted state. `EngineConfig` is the small, programmatically-constructed
//! surface threaded from [`crate::db::Database`] into every table it owns.

use serde::{Deserialize, Serialize};

/// How numeric key conditions compare values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NumericComparison {
    /// Compare through a 64-bit float, matching the emulated system's
    /// observed precision behavior exactly, ill-formed-numerics-as-zero
    /// included. The default.
    #[default]
    F64,
    /// Compare exact decimal text. Off by default so the engine stays a
    /// faithful emulation rather than silently "fixing" a known quirk.
    Decimal,
}

/// Engine-wide configuration threaded from [`crate::db::Database`] into
/// every [`crate::table::Table`] it owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on items returned by a single Query, intersected with any
    /// caller-supplied `Limit`.
    #[serde(default)]
    pub page_size: Option<usize>,

    /// How a `Query`'s numeric key conditions compare values.
    #[serde(default)]
    pub numeric_comparison: NumericComparison,

    /// When `true`, snapshot load fails on a value the attribute model
    /// cannot represent instead of silently dropping it. The current
    /// attribute alphabet covers every JSON shape, so this has no effect
    /// yet; it exists for a future, narrower alphabet. Defaults to `false`.
    #[serde(default)]
    pub fail_on_unrepresentable_value: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_favors_compatibility_over_exactness() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.page_size, None);
        assert_eq!(cfg.numeric_comparison, NumericComparison::F64);
        assert!(!cfg.fail_on_unrepresentable_value);
    }
}
