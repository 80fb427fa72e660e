//! Slippage policy
//!
//! The user's tolerance is process-wide state that outlives any single
//! operation. It is modeled as an explicitly injected policy object over a
//! load/save capability trait rather than a hidden singleton, so embedding
//! applications decide where the preference actually lives.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use tidepool_core::Amount;

use crate::calculator::apply_slippage;
use crate::constants::{impact, slippage};
use crate::state::{AmmError, LiquidityDepth};

/// Load/save capability for the persisted preference.
///
/// Implementations own their error types; everything surfaces as anyhow.
pub trait SlippageStore: Send + Sync {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

impl<T: SlippageStore + ?Sized> SlippageStore for &T {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).save(key, value)
    }
}

/// In-memory store, for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySlippageStore {
    values: Mutex<HashMap<String, String>>,
}

impl SlippageStore for MemorySlippageStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file-backed store: a flat string map at a fixed path
pub struct FileSlippageStore {
    path: PathBuf,
}

impl FileSlippageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> anyhow::Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl SlippageStore for FileSlippageStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
        std::fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        Ok(())
    }
}

/// Advisory warning level for a previewed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Low,
    Medium,
    High,
    Blocked,
}

impl WarningLevel {
    fn bumped(self) -> Self {
        match self {
            Self::None => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Blocked => Self::Blocked,
        }
    }
}

/// User slippage preference plus trade-risk classification
pub struct SlippagePolicy<S: SlippageStore> {
    store: S,
    value_pct: f64,
}

impl<S: SlippageStore> SlippagePolicy<S> {
    /// Load the preference from the store. Anything unparsable or outside
    /// [0, 50] falls back to the default; the store is left untouched.
    pub fn load(store: S) -> Self {
        let value_pct = match store.load(slippage::STORAGE_KEY) {
            Ok(Some(raw)) => match raw.parse::<f64>() {
                Ok(v) if Self::in_range(v) => v,
                _ => {
                    tracing::warn!(stored = %raw, "ignoring invalid stored slippage, using default");
                    slippage::DEFAULT_PCT
                }
            },
            Ok(None) => slippage::DEFAULT_PCT,
            Err(e) => {
                tracing::warn!(error = %e, "slippage store unreadable, using default");
                slippage::DEFAULT_PCT
            }
        };
        Self { store, value_pct }
    }

    fn in_range(pct: f64) -> bool {
        pct.is_finite() && (0.0..=slippage::MAX_PCT).contains(&pct)
    }

    /// Current tolerance in percent
    pub fn value_pct(&self) -> f64 {
        self.value_pct
    }

    /// Accept a new tolerance from explicit user action and persist it
    pub fn set(&mut self, pct: f64) -> Result<(), AmmError> {
        if !Self::in_range(pct) {
            return Err(AmmError::SlippageOutOfRange {
                value: pct,
                max: slippage::MAX_PCT,
            });
        }
        self.store
            .save(slippage::STORAGE_KEY, &pct.to_string())
            .map_err(|e| AmmError::PreferenceStore(e.to_string()))?;
        self.value_pct = pct;
        Ok(())
    }

    /// Minimum received under the current tolerance
    pub fn min_received(&self, amount_out: Amount) -> Amount {
        apply_slippage(amount_out, self.value_pct)
    }

    /// Classify price impact and liquidity depth into a warning level.
    ///
    /// Thin liquidity bumps the level one notch: the quote's impact figure
    /// understates risk when the snapshot can move a lot between preview
    /// and execution. Advisory only, never blocks execution.
    pub fn warning_level(&self, price_impact_pct: f64, depth: LiquidityDepth) -> WarningLevel {
        let base = if price_impact_pct >= impact::BLOCKED_PCT {
            WarningLevel::Blocked
        } else if price_impact_pct >= impact::HIGH_PCT {
            WarningLevel::High
        } else if price_impact_pct >= impact::MEDIUM_PCT {
            WarningLevel::Medium
        } else if price_impact_pct >= impact::LOW_PCT {
            WarningLevel::Low
        } else {
            WarningLevel::None
        };

        match depth {
            LiquidityDepth::Low => base.bumped(),
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(value: Option<&str>) -> MemorySlippageStore {
        let store = MemorySlippageStore::default();
        if let Some(v) = value {
            store.save(slippage::STORAGE_KEY, v).unwrap();
        }
        store
    }

    #[test]
    fn test_default_when_nothing_stored() {
        let policy = SlippagePolicy::load(store_with(None));
        assert_eq!(policy.value_pct(), 0.5);
    }

    #[test]
    fn test_loads_stored_value() {
        let policy = SlippagePolicy::load(store_with(Some("1.5")));
        assert_eq!(policy.value_pct(), 1.5);
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        for bad in ["lots", "-3", "51", "NaN", ""] {
            let policy = SlippagePolicy::load(store_with(Some(bad)));
            assert_eq!(policy.value_pct(), 0.5, "stored {bad:?}");
        }
    }

    #[test]
    fn test_set_validates_and_persists() {
        let mut policy = SlippagePolicy::load(store_with(None));
        policy.set(2.0).unwrap();
        assert_eq!(policy.value_pct(), 2.0);

        assert!(matches!(
            policy.set(50.1),
            Err(AmmError::SlippageOutOfRange { .. })
        ));
        assert!(matches!(
            policy.set(-0.1),
            Err(AmmError::SlippageOutOfRange { .. })
        ));
        // Rejected values leave the current setting alone
        assert_eq!(policy.value_pct(), 2.0);
    }

    #[test]
    fn test_setting_survives_reload() {
        let store = MemorySlippageStore::default();
        {
            let mut policy = SlippagePolicy::load(&store);
            policy.set(3.25).unwrap();
        }
        let policy = SlippagePolicy::load(&store);
        assert_eq!(policy.value_pct(), 3.25);
    }

    #[test]
    fn test_warning_levels() {
        let policy = SlippagePolicy::load(store_with(None));
        assert_eq!(
            policy.warning_level(0.2, LiquidityDepth::High),
            WarningLevel::None
        );
        assert_eq!(
            policy.warning_level(1.5, LiquidityDepth::High),
            WarningLevel::Low
        );
        assert_eq!(
            policy.warning_level(4.0, LiquidityDepth::Medium),
            WarningLevel::Medium
        );
        assert_eq!(
            policy.warning_level(20.0, LiquidityDepth::High),
            WarningLevel::Blocked
        );
    }

    #[test]
    fn test_thin_liquidity_bumps_warning() {
        let policy = SlippagePolicy::load(store_with(None));
        assert_eq!(
            policy.warning_level(0.2, LiquidityDepth::Low),
            WarningLevel::Low
        );
        assert_eq!(
            policy.warning_level(4.0, LiquidityDepth::Low),
            WarningLevel::High
        );
    }

    #[test]
    fn test_min_received_uses_current_setting() {
        let mut policy = SlippagePolicy::load(store_with(None));
        assert_eq!(policy.min_received(1_000), 995);
        policy.set(1.0).unwrap();
        assert_eq!(policy.min_received(1_000), 990);
    }
}
