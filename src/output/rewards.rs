//! The six reward ledgers of an epoch.
//!
//! The pipeline computes `block rewards - priority fees` per validator as an unsigned subtraction,
//! so the ledgers are built in two phases: first the block reward of every validator, then the
//! per-stake priority fees, each capped from the block reward already assigned.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;

use crate::{
    domain::{EpochScenario, Lamports, Pubkey},
    engine::EpochRng,
    output::amount_string,
};

// lamports per SOL of stake
const INFLATION_RATE: RangeInclusive<u64> = 80..=120;
const MEV_RATE: RangeInclusive<u64> = 30..=70;
const BLOCK_RATE: RangeInclusive<u64> = 20..=40;

/// Share of the stake-proportional rewards reported in the per-validator ledgers, in percent
const VALIDATOR_SHARE_PCT: u64 = 5;

/// Upper bound of the summed priority fees of a validator, in percent of its block reward
const PRIORITY_FEE_CAP_PCT: u64 = 70;

/// Epoch-wide reward rates shared by all validators, in lamports per SOL of stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardRates {
    pub inflation: u64,
    pub mev: u64,
    pub block: u64,
}

impl RewardRates {
    fn sample(rng: &mut EpochRng) -> Self {
        Self {
            inflation: rng.random_range(INFLATION_RATE),
            mev: rng.random_range(MEV_RATE),
            block: rng.random_range(BLOCK_RATE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeReward {
    pub epoch: u64,
    pub stake_account: Pubkey,
    #[serde(with = "amount_string")]
    pub amount: Lamports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorReward {
    pub epoch: u64,
    pub vote_account: Pubkey,
    #[serde(with = "amount_string")]
    pub amount: Lamports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReward {
    pub epoch: u64,
    pub identity_account: Pubkey,
    pub node_pubkey: Pubkey,
    pub authorized_voter: Pubkey,
    pub vote_account: Pubkey,
    #[serde(with = "amount_string")]
    pub amount: Lamports,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardLedgers {
    pub rates: RewardRates,
    pub inflation: Vec<StakeReward>,
    pub mev: Vec<StakeReward>,
    pub jito_priority_fee: Vec<StakeReward>,
    pub validators_inflation: Vec<ValidatorReward>,
    pub validators_mev: Vec<ValidatorReward>,
    pub validators_blocks: Vec<BlockReward>,
}

/// Largest priority fee a single stake account may receive so that the sum over all
/// `stake_accounts` of the validator stays within 70% of `block_reward`. Never below 1.
pub fn priority_fee_cap(block_reward: Lamports, stake_accounts: usize) -> Lamports {
    let divisor = stake_accounts.max(1) as u64;
    (block_reward * PRIORITY_FEE_CAP_PCT / 100 / divisor).max(1)
}

pub(crate) fn build_reward_ledgers(scenario: &EpochScenario, rng: &mut EpochRng) -> RewardLedgers {
    let epoch = scenario.epoch;
    let rates = RewardRates::sample(rng);

    // Phase 1: block rewards, needed for the priority fee caps
    let block_rewards: Vec<Lamports> = scenario
        .validators
        .iter()
        .map(|v| v.total_stake_sol() * rates.block)
        .collect();

    // Phase 2: per stake account rewards
    let mut inflation = Vec::new();
    let mut mev = Vec::new();
    let mut jito_priority_fee = Vec::new();
    for (validator, block_reward) in scenario.validators.iter().zip(&block_rewards) {
        let cap = priority_fee_cap(*block_reward, validator.stake_accounts.len());
        let mut fees_total = 0;
        for account in &validator.stake_accounts {
            let fee = rng.random_range(1..=cap);
            fees_total += fee;

            inflation.push(stake_reward(epoch, &account.pubkey, account.sol() * rates.inflation));
            mev.push(stake_reward(epoch, &account.pubkey, account.sol() * rates.mev));
            jito_priority_fee.push(stake_reward(epoch, &account.pubkey, fee));
        }
        debug_assert!(
            fees_total < *block_reward,
            "priority fees of {} reach its block reward",
            validator.vote_account
        );
    }

    let validators_inflation = scenario
        .validators
        .iter()
        .map(|v| ValidatorReward {
            epoch,
            vote_account: v.vote_account.clone(),
            amount: v.total_stake_sol() * rates.inflation * VALIDATOR_SHARE_PCT / 100,
        })
        .collect();
    let validators_mev = scenario
        .validators
        .iter()
        .map(|v| ValidatorReward {
            epoch,
            vote_account: v.vote_account.clone(),
            amount: v.total_stake_sol() * rates.mev * VALIDATOR_SHARE_PCT / 100,
        })
        .collect();
    let validators_blocks = scenario
        .validators
        .iter()
        .zip(block_rewards)
        .map(|(v, amount)| BlockReward {
            epoch,
            identity_account: v.identity.clone(),
            node_pubkey: v.identity.clone(),
            authorized_voter: v.identity.clone(),
            vote_account: v.vote_account.clone(),
            amount,
        })
        .collect();

    RewardLedgers {
        rates,
        inflation,
        mev,
        jito_priority_fee,
        validators_inflation,
        validators_mev,
        validators_blocks,
    }
}

fn stake_reward(epoch: u64, stake_account: &Pubkey, amount: Lamports) -> StakeReward {
    StakeReward {
        epoch,
        stake_account: stake_account.clone(),
        amount,
    }
}
