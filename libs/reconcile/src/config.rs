//! Reconciler configuration.

use std::env::VarError;

use serde::Deserialize;

use crate::error::{ReconcileError, ReconcileResult};

/// Default number of bits a name index grows by when it runs out of slots.
pub const DEFAULT_BITMAP_GROWTH: u32 = 8;

/// Tunables for classification and index allocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Whether the task group tolerates client disconnects. When false,
    /// allocations on a disconnected node are treated as lost instead of
    /// being held as unknown.
    pub supports_disconnected_clients: bool,

    /// Bits added to a name index bitmap when every slot is taken.
    pub bitmap_growth: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            supports_disconnected_clients: true,
            bitmap_growth: DEFAULT_BITMAP_GROWTH,
        }
    }
}

impl ReconcileConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> ReconcileResult<Self> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Load configuration through `lookup`, which has the contract of
    /// [`std::env::var`]. Unset keys fall back to defaults; values that are
    /// not unicode or do not parse are rejected.
    pub fn from_lookup<F>(lookup: F) -> ReconcileResult<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let defaults = Self::default();

        let supports_disconnected_clients =
            match read(&lookup, "CONVOY_SUPPORTS_DISCONNECTED_CLIENTS")? {
                Some(v) => parse_bool(&v).ok_or_else(|| {
                    ReconcileError::InvalidConfig(format!(
                        "CONVOY_SUPPORTS_DISCONNECTED_CLIENTS={v:?} is not a boolean"
                    ))
                })?,
                None => defaults.supports_disconnected_clients,
            };

        let bitmap_growth = match read(&lookup, "CONVOY_BITMAP_GROWTH")? {
            Some(v) => v.parse().map_err(|e| {
                ReconcileError::InvalidConfig(format!("CONVOY_BITMAP_GROWTH={v:?}: {e}"))
            })?,
            None => defaults.bitmap_growth,
        };

        let config = Self {
            supports_disconnected_clients,
            bitmap_growth,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the reconciler cannot work with.
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.bitmap_growth == 0 {
            return Err(ReconcileError::InvalidConfig(
                "bitmap_growth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn read<F>(lookup: &F, key: &str) -> ReconcileResult<Option<String>>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(key) {
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ReconcileError::InvalidConfig(format!(
            "{key}={raw:?} is not valid unicode"
        ))),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
