//! Selecting the compiled program for a device's tier
//!
//! Programs are monomorphised over the device tier. At start-up the runtime
//! reads the tier of the device (from configuration or from stored state)
//! and calls [`dispatch_tier`], which jumps to the instantiation for that
//! bit.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TierError;
use crate::tier::{TIER_BITS, Tier, TierBit};

/// Environment variable overriding [`TierConfig::tiers_max`]
pub const ENV_TIERS_MAX: &str = "FIELDCALC_TIERS_MAX";

/// Environment variable fixing the device tier by bit index
pub const ENV_TIER: &str = "FIELDCALC_TIER";

/// Code to run once the tier of the device is known
pub trait TierVisitor {
    type Output;

    fn visit<const TIER: Tier>(self) -> Self::Output;
}

macro_rules! dispatch_table {
    ($visitor:ident, $index:expr; $($bit:literal)*) => {
        match $index {
            $($bit => $visitor.visit::<{ 1 << $bit }>(),)*
            _ => $visitor.visit::<{ 1 << 31 }>(),
        }
    };
}

/// Run `visitor` instantiated for the tier `bit`
pub fn dispatch_tier<V: TierVisitor>(bit: TierBit, visitor: V) -> V::Output {
    debug!(tier = bit.mask(), index = bit.index(), "dispatching on device tier");
    dispatch_table!(visitor, bit.index();
        0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15
        16 17 18 19 20 21 22 23 24 25 26 27 28 29 30)
}

/// How the tier of a device is determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Number of tier bits in use by the deployment
    pub tiers_max: u32,
    /// Tier fixed at configuration time, taking precedence over stored state
    pub fixed: Option<TierBit>,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            tiers_max: TIER_BITS,
            fixed: None,
        }
    }
}

impl TierConfig {
    pub fn new(tiers_max: u32) -> Self {
        Self {
            tiers_max,
            fixed: None,
        }
    }

    /// Fix the tier of the device
    pub fn with_fixed(mut self, bit: TierBit) -> Self {
        self.fixed = Some(bit);
        self
    }

    /// Create config from environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, TierError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_TIERS_MAX) {
            config.tiers_max = raw.trim().parse().map_err(|_| {
                TierError::InvalidConfig(format!("{ENV_TIERS_MAX}={raw:?} is not a number"))
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_TIER) {
            let index: u32 = raw.trim().parse().map_err(|_| {
                TierError::InvalidConfig(format!("{ENV_TIER}={raw:?} is not a bit index"))
            })?;
            config.fixed = Some(TierBit::from_index(index)?);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TierError> {
        if self.tiers_max == 0 || self.tiers_max > TIER_BITS {
            return Err(TierError::InvalidConfig(format!(
                "tiers_max must be between 1 and {TIER_BITS}, got {}",
                self.tiers_max
            )));
        }
        if let Some(bit) = self.fixed {
            self.check_range(bit)?;
        }
        Ok(())
    }

    /// Tier of the device, from the fixed setting or the stored raw mask
    pub fn resolve(&self, stored: Option<Tier>) -> Result<TierBit, TierError> {
        let bit = match (self.fixed, stored) {
            (Some(bit), _) => bit,
            (None, Some(raw)) => TierBit::new(raw)?,
            (None, None) => return Err(TierError::Unconfigured),
        };
        self.check_range(bit)?;
        Ok(bit)
    }

    fn check_range(&self, bit: TierBit) -> Result<(), TierError> {
        if bit.index() >= self.tiers_max {
            return Err(TierError::OutOfRange {
                index: bit.index(),
                max: self.tiers_max,
            });
        }
        Ok(())
    }
}

/// Resolve the device tier and run `visitor` for it
pub fn run_for_tier<V: TierVisitor>(
    config: &TierConfig,
    stored: Option<Tier>,
    visitor: V,
) -> Result<V::Output, TierError> {
    let bit = config.resolve(stored)?;
    info!(tier = %bit, "device tier resolved");
    Ok(dispatch_tier(bit, visitor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placed::Placed;

    struct Echo;

    impl TierVisitor for Echo {
        type Output = Tier;

        fn visit<const TIER: Tier>(self) -> Tier {
            TIER
        }
    }

    /// Builds a placed value on the dispatched tier and reports its presence
    struct Present;

    impl TierVisitor for Present {
        type Output = bool;

        fn visit<const TIER: Tier>(self) -> bool {
            Placed::<TIER, i32, crate::tier::Pq<12, 0>>::new(1).is_present()
        }
    }

    #[test]
    fn test_dispatch_every_bit() {
        for index in 0..TIER_BITS {
            let bit = TierBit::from_index(index).unwrap();
            assert_eq!(dispatch_tier(bit, Echo), 1 << index);
        }
    }

    #[test]
    fn test_dispatch_reaches_placement() {
        assert!(dispatch_tier(TierBit::new(4).unwrap(), Present));
        assert!(dispatch_tier(TierBit::new(8).unwrap(), Present));
        assert!(!dispatch_tier(TierBit::new(2).unwrap(), Present));
    }

    #[test]
    fn test_resolve() {
        let config = TierConfig::default();
        assert_eq!(config.resolve(Some(8)).unwrap().mask(), 8);
        assert_eq!(config.resolve(None), Err(TierError::Unconfigured));
        assert_eq!(config.resolve(Some(6)), Err(TierError::NotAtomic(6)));

        let fixed = TierConfig::default().with_fixed(TierBit::new(2).unwrap());
        assert_eq!(fixed.resolve(Some(8)).unwrap().mask(), 2);
        assert_eq!(fixed.resolve(None).unwrap().mask(), 2);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let config = TierConfig::new(4);
        assert_eq!(
            config.resolve(Some(16)),
            Err(TierError::OutOfRange { index: 4, max: 4 })
        );
        assert_eq!(config.resolve(Some(8)).unwrap().index(), 3);
    }

    #[test]
    fn test_validate() {
        assert!(TierConfig::default().validate().is_ok());
        assert!(matches!(
            TierConfig::new(0).validate(),
            Err(TierError::InvalidConfig(_))
        ));
        assert!(matches!(
            TierConfig::new(33).validate(),
            Err(TierError::InvalidConfig(_))
        ));
        let config = TierConfig::new(2).with_fixed(TierBit::new(4).unwrap());
        assert!(matches!(config.validate(), Err(TierError::OutOfRange { .. })));
    }

    #[test]
    fn test_run_for_tier() {
        let config = TierConfig::new(8);
        assert_eq!(run_for_tier(&config, Some(32), Echo).unwrap(), 32);
        assert!(run_for_tier(&config, None, Echo).is_err());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: TierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TierConfig::default());

        let config: TierConfig = serde_json::from_str(r#"{"tiers_max": 4, "fixed": 2}"#).unwrap();
        assert_eq!(config.tiers_max, 4);
        assert_eq!(config.fixed.map(|b| b.index()), Some(1));

        assert!(serde_json::from_str::<TierConfig>(r#"{"fixed": 3}"#).is_err());
    }
}
