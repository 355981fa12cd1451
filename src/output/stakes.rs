//! Stake snapshot: every delegated stake account of the epoch, with its authorities

use serde::Serialize;

use crate::{
    config::FixtureConfig,
    domain::{EpochScenario, Lamports, Pubkey, StakeAccount, ValidatorScenario},
};

/// Stake accounts as seen in a snapshot of the bank at the end of the epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeSnapshot {
    pub epoch: u64,
    pub slot: u64,
    pub stake_metas: Vec<StakeMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeMeta {
    pub pubkey: Pubkey,
    pub balance_lamports: Lamports,
    pub active_delegation_lamports: Lamports,
    pub activating_delegation_lamports: Lamports,
    pub deactivating_delegation_lamports: Lamports,
    pub validator: Pubkey,
    pub stake_authority: Pubkey,
    pub withdraw_authority: Pubkey,
}

impl StakeMeta {
    /// Fully active stake account; the balance exceeds the delegation by `buffer` (rent and float).
    pub(crate) fn active(
        account: &StakeAccount,
        validator: &ValidatorScenario,
        stake_authority: &Pubkey,
        buffer: Lamports,
    ) -> Self {
        Self {
            pubkey: account.pubkey.clone(),
            balance_lamports: account.amount + buffer,
            active_delegation_lamports: account.amount,
            activating_delegation_lamports: 0,
            deactivating_delegation_lamports: 0,
            validator: validator.vote_account.clone(),
            stake_authority: stake_authority.clone(),
            withdraw_authority: validator.withdraw_authority.clone(),
        }
    }
}

pub(crate) fn build_stake_snapshot(
    scenario: &EpochScenario,
    config: &FixtureConfig,
) -> StakeSnapshot {
    let stake_metas = scenario
        .validators
        .iter()
        .flat_map(|validator| {
            validator.stake_accounts.iter().map(move |account| {
                StakeMeta::active(
                    account,
                    validator,
                    &validator.stake_authority,
                    config.stake_buffer_lamports,
                )
            })
        })
        .collect();

    StakeSnapshot {
        epoch: scenario.epoch,
        slot: scenario.slot,
        stake_metas,
    }
}
