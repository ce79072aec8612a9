use shade_config::ShadeConfig;

use crate::accumulator::AccumulatorParams;
use crate::account::AccountId;
use crate::error::PoolError;
use crate::fees::FeeConfig;

/// Validated, immutable pool parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub params: AccumulatorParams,
    /// Value created by every mint
    pub mint_amount: u128,
    /// Exact payment every mint must carry
    pub mint_price: u128,
    pub max_supply: u128,
    pub fees: FeeConfig,
}

impl PoolConfig {
    pub fn from_config(config: &ShadeConfig) -> Result<Self, PoolError> {
        let pool = &config.pool;
        let fees = &config.fees;

        let parsed = Self {
            name: pool.name.clone(),
            symbol: pool.symbol.clone(),
            decimals: pool.decimals,
            params: AccumulatorParams::new(pool.subtree_height, pool.finalized_height)?,
            mint_amount: parse_amount("mint_amount", &pool.mint_amount)?,
            mint_price: parse_amount("mint_price", &pool.mint_price)?,
            max_supply: parse_amount("max_supply", &pool.max_supply)?,
            fees: FeeConfig::new(
                parse_account("primary_recipient", &fees.primary_recipient)?,
                parse_account("secondary_recipient", &fees.secondary_recipient)?,
                fees.primary_share_bps,
            )?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.mint_amount == 0 {
            return Err(PoolError::InvalidConfig("mint_amount must be positive".into()));
        }
        if self.max_supply < self.mint_amount {
            return Err(PoolError::InvalidConfig(format!(
                "max_supply {} is below a single mint ({})",
                self.max_supply, self.mint_amount
            )));
        }
        Ok(())
    }
}

fn parse_amount(field: &str, value: &str) -> Result<u128, PoolError> {
    value
        .trim()
        .replace('_', "")
        .parse()
        .map_err(|e| {
            PoolError::InvalidConfig(format!("{}: {:?} is not an amount ({})", field, value, e))
        })
}

fn parse_account(field: &str, value: &str) -> Result<AccountId, PoolError> {
    value
        .parse()
        .map_err(|e| PoolError::InvalidConfig(format!("{}: {:#}", field, e)))
}
