//! Validator metadata: per-validator stake, credits and commissions plus the epoch economics

use serde::Serialize;

use crate::{
    config::FixtureConfig,
    domain::{EpochScenario, Lamports, Pubkey},
};

/// Per-validator metadata extracted from the bank, plus the network-wide epoch figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorMetaCollection {
    pub epoch: u64,
    pub slot: u64,
    pub capitalization: Lamports,
    pub epoch_duration_in_years: f64,
    pub validator_rate: f64,
    pub validator_rewards: Lamports,
    pub validator_metas: Vec<ValidatorMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorMeta {
    pub vote_account: Pubkey,
    /// Inflation commission, in percent
    pub commission: u8,
    /// MEV commission, in basis points
    pub mev_commission: u16,
    pub jito_priority_fee_commission: Option<u16>,
    pub jito_priority_fee_lamports: Lamports,
    pub stake: Lamports,
    pub credits: u64,
}

pub(crate) fn build_validator_metas(
    scenario: &EpochScenario,
    config: &FixtureConfig,
) -> ValidatorMetaCollection {
    let validator_metas = scenario
        .validators
        .iter()
        .map(|validator| {
            let commission = validator.commission_or_zero();
            ValidatorMeta {
                vote_account: validator.vote_account.clone(),
                commission: commission.inflation_commission_pct,
                mev_commission: commission.mev_commission_bps,
                jito_priority_fee_commission: None,
                jito_priority_fee_lamports: 0,
                stake: validator.total_stake(),
                credits: validator.credits(config.expected_credits),
            }
        })
        .collect();

    let economics = &config.economics;
    ValidatorMetaCollection {
        epoch: scenario.epoch,
        slot: scenario.slot,
        capitalization: economics.capitalization_lamports,
        epoch_duration_in_years: economics.epoch_duration_in_years,
        validator_rate: economics.validator_rate,
        validator_rewards: economics.validator_rewards_lamports,
        validator_metas,
    }
}
