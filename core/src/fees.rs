//! Fee accrual and distribution
//!
//! Mint payments accumulate in the pool. Anyone may trigger a distribution,
//! which pays out the whole balance to two recipients fixed at construction:
//! the primary recipient receives `primary_share_bps / 10_000` of it and the
//! secondary recipient receives the rest (including rounding dust).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::AccountId;
use crate::error::PoolError;

pub const BPS_DENOMINATOR: u16 = 10_000;

/// Native value transfer capability.
///
/// `pay_all` must be all-or-nothing: either every transfer lands or none do.
pub trait Payout {
    fn pay_all(&mut self, transfers: &[(AccountId, u128)]) -> Result<()>;
}

/// Recipients and split ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub primary: AccountId,
    pub secondary: AccountId,
    pub primary_share_bps: u16,
}

impl FeeConfig {
    pub fn new(
        primary: AccountId,
        secondary: AccountId,
        primary_share_bps: u16,
    ) -> Result<Self, PoolError> {
        if primary_share_bps > BPS_DENOMINATOR {
            return Err(PoolError::InvalidConfig(format!(
                "primary fee share {} bps exceeds {}",
                primary_share_bps, BPS_DENOMINATOR
            )));
        }
        Ok(Self {
            primary,
            secondary,
            primary_share_bps,
        })
    }

    /// Split `amount` into (primary, secondary) shares.
    pub fn split(&self, amount: u128) -> (u128, u128) {
        // amount * bps fits unless amount > u128::MAX / 10_000; fall back to
        // dividing first in that case.
        let bps = u128::from(self.primary_share_bps);
        let denom = u128::from(BPS_DENOMINATOR);
        let primary = match amount.checked_mul(bps) {
            Some(scaled) => scaled / denom,
            None => amount / denom * bps,
        };
        (primary, amount - primary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDistribution {
    pub primary: AccountId,
    pub primary_amount: u128,
    pub secondary: AccountId,
    pub secondary_amount: u128,
}

impl FeeDistribution {
    pub fn total(&self) -> u128 {
        self.primary_amount + self.secondary_amount
    }
}

#[derive(Debug, Clone)]
pub struct FeeSplitter {
    config: FeeConfig,
    balance: u128,
}

impl FeeSplitter {
    pub fn new(config: FeeConfig, balance: u128) -> Self {
        Self { config, balance }
    }

    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// Balance after accruing `amount`, without committing it.
    pub fn accrued(&self, amount: u128) -> Result<u128, PoolError> {
        self.balance
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow("fee balance"))
    }

    pub fn set_balance(&mut self, balance: u128) {
        self.balance = balance;
    }

    /// Plan a distribution of the current balance.
    pub fn plan(&self) -> Result<FeeDistribution, PoolError> {
        if self.balance == 0 {
            return Err(PoolError::NoFeesToDistribute);
        }

        let (primary_amount, secondary_amount) = self.config.split(self.balance);
        Ok(FeeDistribution {
            primary: self.config.primary,
            primary_amount,
            secondary: self.config.secondary,
            secondary_amount,
        })
    }

    /// Pay out a planned distribution. The balance is only cleared once the
    /// payout succeeds.
    pub fn execute(
        &mut self,
        plan: &FeeDistribution,
        payout: &mut dyn Payout,
    ) -> Result<(), PoolError> {
        payout
            .pay_all(&[
                (plan.primary, plan.primary_amount),
                (plan.secondary, plan.secondary_amount),
            ])
            .map_err(|e| PoolError::PayoutFailed(format!("{:#}", e)))?;

        self.balance -= plan.total();
        Ok(())
    }
}

/// In-memory native balances, credited by fee payouts.
#[derive(Debug, Default)]
pub struct MemoryPayout {
    balances: HashMap<AccountId, u128>,
}

impl MemoryPayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl Payout for MemoryPayout {
    fn pay_all(&mut self, transfers: &[(AccountId, u128)]) -> Result<()> {
        let mut next = self.balances.clone();
        for (to, amount) in transfers {
            let entry = next.entry(*to).or_insert(0);
            *entry = entry
                .checked_add(*amount)
                .ok_or_else(|| anyhow::anyhow!("balance overflow for {}", to))?;
        }
        self.balances = next;
        Ok(())
    }
}
