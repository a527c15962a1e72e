use crate::error::{MarketError, Result};
use gigmart_ledger::types::{AccountId, Currency, TokenAmount};
use serde::{Deserialize, Serialize};

/// Hard ceiling on the platform fee (10%)
pub const MAX_FEE_BPS: u32 = 1_000;
/// Fee charged by a freshly constructed marketplace (2.5%)
pub const DEFAULT_FEE_BPS: u32 = 250;
/// Basis point denominator
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Platform-level marketplace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Account allowed to run admin operations
    pub admin: AccountId,
    /// Platform fee in basis points; snapshotted onto each task at creation
    pub fee_bps: u32,
    /// Currencies tasks may be denominated in on this deployment
    pub currencies: Vec<Currency>,
}

impl PlatformConfig {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            fee_bps: DEFAULT_FEE_BPS,
            currencies: Currency::all().to_vec(),
        }
    }

    /// Config for deployments where only some currencies exist
    pub fn with_currencies(admin: AccountId, currencies: Vec<Currency>) -> Self {
        Self {
            admin,
            fee_bps: DEFAULT_FEE_BPS,
            currencies,
        }
    }

    pub fn currency_enabled(&self, currency: Currency) -> bool {
        self.currencies.contains(&currency)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fee_bps > MAX_FEE_BPS {
            return Err(MarketError::Validation(format!(
                "Fee {} bps exceeds maximum {} bps",
                self.fee_bps, MAX_FEE_BPS
            )));
        }
        if self.currencies.is_empty() {
            return Err(MarketError::Validation(
                "At least one currency must be enabled".to_string(),
            ));
        }
        if self.admin.is_zero() || self.admin == AccountId::platform() {
            return Err(MarketError::Validation(
                "Admin must be a regular account".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fee charged on `reward` at `fee_bps`, truncated to base units
pub fn fee_for(reward: TokenAmount, fee_bps: u32) -> TokenAmount {
    let units = (reward.to_base_units() as u128 * fee_bps as u128) / BPS_DENOMINATOR as u128;
    TokenAmount::from_base_units(units as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlatformConfig::new(AccountId::from_bytes([0xAA; 20]));
        assert_eq!(config.fee_bps, DEFAULT_FEE_BPS);
        assert!(config.currency_enabled(Currency::Stable));
        assert!(config.currency_enabled(Currency::Native));
        config.validate().unwrap();
    }

    #[test]
    fn test_fee_bounds_enforced() {
        let mut config = PlatformConfig::new(AccountId::from_bytes([0xAA; 20]));
        config.fee_bps = MAX_FEE_BPS;
        config.validate().unwrap();

        config.fee_bps = MAX_FEE_BPS + 1;
        assert!(matches!(
            config.validate().unwrap_err(),
            MarketError::Validation(_)
        ));
    }

    #[test]
    fn test_admin_must_be_regular_account() {
        let config = PlatformConfig::new(AccountId::from_bytes([0; 20]));
        assert!(config.validate().is_err());

        let config = PlatformConfig::new(AccountId::platform());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_currency_deployment() {
        let config = PlatformConfig::with_currencies(
            AccountId::from_bytes([0xAA; 20]),
            vec![Currency::Native],
        );
        config.validate().unwrap();
        assert!(config.currency_enabled(Currency::Native));
        assert!(!config.currency_enabled(Currency::Stable));

        let empty =
            PlatformConfig::with_currencies(AccountId::from_bytes([0xAA; 20]), Vec::new());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_fee_computation() {
        // 2.5% of 5 tokens is 0.125 tokens
        let fee = fee_for(TokenAmount::from_tokens(5.0), 250);
        assert_eq!(fee, TokenAmount::from_tokens(0.125));

        // Fee of zero bps is zero
        assert_eq!(fee_for(TokenAmount::from_tokens(5.0), 0), TokenAmount::ZERO);

        // Truncation: 250 bps of 3 base units is 0
        assert_eq!(
            fee_for(TokenAmount::from_base_units(3), 250),
            TokenAmount::ZERO
        );

        // Max fee never overflows even on huge rewards
        let huge = TokenAmount::from_base_units(u64::MAX);
        let fee = fee_for(huge, MAX_FEE_BPS);
        assert_eq!(fee, TokenAmount::from_base_units(u64::MAX / 10));
    }
}
