//! Immutable constant tables shared by every generated epoch.
//!
//! A [`FixtureConfig`] is built once per process (defaults, optionally overridden by a JSON file)
//! and handed by reference to the sampler and the document builders.

use std::{ops::RangeInclusive, path::Path};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    domain::{LAMPORTS_PER_SOL, Pubkey},
    engine::DOWNTIME_BPS,
    error::{Error, io_error, json_error},
};

/// Accepted per-epoch vote credits. The lower bound keeps a downtime validator's credits strictly
/// below 99% of the expectation, the upper bound keeps `credits * 10_000` inside a u64.
pub const EXPECTED_CREDITS: RangeInclusive<u64> = 100..=u64::MAX / 10_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureConfig {
    /// Stake authorities recognised as whitelisted by the settlement config
    pub whitelist_stake_authorities: Vec<Pubkey>,
    /// Staker authority owning every institutional stake account
    pub institutional_staker_authority: Pubkey,
    /// Authorities the institutional pipeline filters stake accounts by
    pub institutional_authority_filter: Vec<Pubkey>,
    /// Vote credits a validator with perfect uptime earns in one epoch
    pub expected_credits: u64,
    pub slot_base: u64,
    pub slot_stride: u64,
    /// Added to the delegated amount to obtain a stake account balance
    pub stake_buffer_lamports: u64,
    /// Added to the total stake to obtain an institutional payout balance
    pub institutional_balance_buffer_lamports: u64,
    /// Baseline revenue (per 1000 SOL per epoch) every validator is expected to deliver
    pub expected_non_bid_pmpe: Decimal,
    /// Inflation part of the revenue share published in the bid scores
    pub inflation_pmpe: Decimal,
    pub economics: EpochEconomics,
    pub institutional: InstitutionalSettings,
    /// Pinned plan of the canonical reference epoch, if any
    pub reference: Option<ReferencePlan>,
}

/// Network-wide figures reported in the validator metadata document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EpochEconomics {
    pub capitalization_lamports: u64,
    pub epoch_duration_in_years: f64,
    pub validator_rate: f64,
    pub validator_rewards_lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstitutionalSettings {
    pub distributor_fee_bps: u16,
    pub validator_max_fee_bps: u16,
    pub psr_percentile: u8,
    pub psr_grace_downtime_bps: u16,
    pub psr_percentile_apy: Decimal,
    pub psr_percentile_effective_stake_lamports: u64,
}

/// Shape of the canonical reference epoch: one validator per role with pinned severities.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferencePlan {
    pub epoch: u64,
    pub downtime_bps: u32,
    pub inflation_commission_pct: u8,
    pub mev_commission_bps: u16,
    pub institutional_stake_accounts: usize,
}

impl FixtureConfig {
    /// Loads a config from a JSON file. Missing fields keep their default values.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| json_error(path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.whitelist_stake_authorities.is_empty() {
            return Err(Error::InvalidConfig(
                "whitelist_stake_authorities must not be empty".to_string(),
            ));
        }
        if !EXPECTED_CREDITS.contains(&self.expected_credits) {
            return Err(Error::InvalidConfig(format!(
                "expected_credits of {} is outside {EXPECTED_CREDITS:?}",
                self.expected_credits
            )));
        }
        if self.expected_non_bid_pmpe.is_sign_negative() || self.inflation_pmpe.is_sign_negative()
        {
            return Err(Error::InvalidConfig(
                "expected_non_bid_pmpe and inflation_pmpe must not be negative".to_string(),
            ));
        }
        if self.stake_buffer_lamports == 0 {
            return Err(Error::InvalidConfig(
                "stake_buffer_lamports must be positive".to_string(),
            ));
        }
        if let Some(plan) = &self.reference {
            if !DOWNTIME_BPS.contains(&plan.downtime_bps) {
                return Err(Error::InvalidConfig(format!(
                    "reference downtime of {} bps is outside {DOWNTIME_BPS:?}",
                    plan.downtime_bps
                )));
            }
            if plan.inflation_commission_pct > 100 {
                return Err(Error::InvalidConfig(format!(
                    "reference inflation commission of {}% exceeds 100%",
                    plan.inflation_commission_pct
                )));
            }
            if plan.mev_commission_bps > 10_000 {
                return Err(Error::InvalidConfig(format!(
                    "reference MEV commission of {} bps exceeds 10000 bps",
                    plan.mev_commission_bps
                )));
            }
            if !(1..=3).contains(&plan.institutional_stake_accounts) {
                return Err(Error::InvalidConfig(format!(
                    "reference institutional validator needs 1..=3 stake accounts, got {}",
                    plan.institutional_stake_accounts
                )));
            }
        }
        Ok(())
    }

    /// Deterministic slot of the epoch, `None` when it does not fit into a u64.
    pub fn slot_for(&self, epoch: u64) -> Option<u64> {
        epoch
            .checked_mul(self.slot_stride)
            .and_then(|offset| offset.checked_add(self.slot_base))
    }

    pub(crate) fn whitelisted_authority(&self, index: u32) -> &Pubkey {
        let slot = index as usize % self.whitelist_stake_authorities.len().max(1);
        &self.whitelist_stake_authorities[slot]
    }

    pub(crate) fn reference_plan(&self, epoch: u64) -> Option<&ReferencePlan> {
        self.reference.as_ref().filter(|plan| plan.epoch == epoch)
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        let institutional_staker_authority =
            Pubkey::from_static("STNi1NHDUi6Hvibvonawgze8fM83PFLeJhuGMEXyGps");
        Self {
            whitelist_stake_authorities: vec![
                Pubkey::from_static("stWirqFCf2Uts1JBL1Jsd3r6VBWhgnpdPxCTe1MFjrq"),
                Pubkey::from_static("4bZ6o3eUUNXhKuqjdCnCoPAoLgWiuLYixKaxoa8PpiKk"),
                Pubkey::from_static("ex9CfkBZZd6Nv9XdnoDmmB45ymbu4arXVk7g5pWnt3N"),
            ],
            institutional_authority_filter: vec![
                Pubkey::from_static("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"),
                Pubkey::from_static("11111111111111111111111111111111"),
                institutional_staker_authority.clone(),
            ],
            institutional_staker_authority,
            expected_credits: 6_800_000,
            slot_base: 400_000_000,
            slot_stride: 432_000,
            stake_buffer_lamports: 2 * LAMPORTS_PER_SOL,
            institutional_balance_buffer_lamports: 4 * LAMPORTS_PER_SOL,
            expected_non_bid_pmpe: Decimal::new(3234, 4),
            inflation_pmpe: Decimal::new(3, 1),
            economics: EpochEconomics::default(),
            institutional: InstitutionalSettings::default(),
            reference: Some(ReferencePlan::default()),
        }
    }
}

impl Default for EpochEconomics {
    fn default() -> Self {
        Self {
            capitalization_lamports: 600_000_000 * LAMPORTS_PER_SOL,
            epoch_duration_in_years: 0.005476,
            validator_rate: 0.04039,
            validator_rewards_lamports: 137_000_000 * LAMPORTS_PER_SOL,
        }
    }
}

impl Default for InstitutionalSettings {
    fn default() -> Self {
        Self {
            distributor_fee_bps: 50,
            validator_max_fee_bps: 50,
            psr_percentile: 99,
            psr_grace_downtime_bps: 10,
            psr_percentile_apy: Decimal::from_i128_with_scale(33190664386139242231, 20),
            psr_percentile_effective_stake_lamports: 481_330 * LAMPORTS_PER_SOL,
        }
    }
}

impl Default for ReferencePlan {
    fn default() -> Self {
        Self {
            epoch: 99_999,
            downtime_bps: 2_600,
            inflation_commission_pct: 5,
            mev_commission_bps: 800,
            institutional_stake_accounts: 2,
        }
    }
}
